//! Link state machine
//!
//! The session only talks to the panel while the host is connected and
//! ready. The state machine is explicit, finite, and deterministic.

pub mod machine;

pub use machine::{LinkEvent, LinkState};
