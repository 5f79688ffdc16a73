//! # Veridoc Test Suite
//!
//! Unified test crate for cross-subsystem flows.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs       # Fully wired in-memory engine fixture
//! └── integration/      # Cross-subsystem scenarios
//!     ├── lifecycle.rs        # upload → review → sign → download
//!     └── tamper_evidence.rs  # out-of-band corruption at every boundary
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p vd-tests
//! cargo test -p vd-tests integration::lifecycle
//! ```

#![allow(dead_code)]

pub mod fixtures;
pub mod integration;
