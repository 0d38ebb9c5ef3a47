//! Configuration types
//!
//! Host-agnostic configuration structures. The bridge deserializes them
//! from TOML when the `serde` feature is enabled.

pub mod types;

pub use types::*;
