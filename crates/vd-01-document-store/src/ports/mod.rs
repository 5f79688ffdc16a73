//! Outbound ports and their default adapters.

pub mod outbound;
