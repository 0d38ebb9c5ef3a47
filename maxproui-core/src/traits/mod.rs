//! Collaborator traits
//!
//! These traits define the interface between the session logic and the
//! printer host. The bridge implements them against the host's API; tests
//! implement them with in-memory fakes.

pub mod machine;
pub mod runner;
pub mod storage;

pub use machine::{MachineSnapshot, MachineStatus, Position, PrintState};
pub use runner::{ScriptError, ScriptRunner};
pub use storage::{FileEntry, FileListing};
