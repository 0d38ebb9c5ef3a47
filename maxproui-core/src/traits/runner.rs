//! Script execution

use alloc::string::String;

/// Why a script did not run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    /// The host refused or failed the script
    Rejected(String),
    /// The host is unreachable
    Unavailable,
}

impl core::fmt::Display for ScriptError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ScriptError::Rejected(msg) => write!(f, "script rejected: {}", msg),
            ScriptError::Unavailable => write!(f, "host unavailable"),
        }
    }
}

/// Executes machine control scripts
pub trait ScriptRunner {
    /// Run (or hand off) one script, which may hold several lines
    fn run(&mut self, script: &str) -> Result<(), ScriptError>;
}
