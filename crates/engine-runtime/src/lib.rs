//! # Veridoc Engine Runtime
//!
//! Wires the subsystem crates into a running engine:
//!
//! - `config` - runtime configuration with production validation
//! - `container` - dependency injection and worker startup
//!
//! The binary in `main.rs` builds a development container and walks one
//! document through the full lifecycle.

pub mod config;
pub mod container;

pub use config::{EngineConfig, SecurityConfig, SigningConfig, StorageBackend};
pub use container::EngineContainer;
