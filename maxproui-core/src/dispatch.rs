//! Script dispatch queue
//!
//! Handlers never run scripts inline. They enqueue them here and the
//! owning task drains the queue one script per step, so replies to the
//! panel are never held up by the host. The first enqueue into an idle
//! queue reports that a drain must be scheduled; later enqueues join the
//! drain already pending.

use alloc::collections::VecDeque;
use alloc::string::String;

use crate::traits::{ScriptError, ScriptRunner};

/// Result of one drain step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drained {
    /// The script that was handed to the runner
    pub script: String,
    pub result: Result<(), ScriptError>,
}

/// FIFO of scripts awaiting execution
#[derive(Debug, Default)]
pub struct DispatchQueue {
    pending: VecDeque<String>,
    scheduled: bool,
}

impl DispatchQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a script
    ///
    /// Blank scripts are ignored. Returns `true` when this call moved the
    /// queue from idle to scheduled.
    pub fn enqueue(&mut self, script: &str) -> bool {
        if script.trim().is_empty() {
            return false;
        }
        self.pending.push_back(String::from(script));
        if self.scheduled {
            false
        } else {
            self.scheduled = true;
            true
        }
    }

    /// Whether a drain is pending
    pub fn is_scheduled(&self) -> bool {
        self.scheduled
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Scripts not yet run, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.pending.iter().map(String::as_str)
    }

    /// Run the oldest script
    ///
    /// The script leaves the queue whether or not it succeeded, so one
    /// failure never blocks the rest. Returns `None` when nothing is
    /// scheduled.
    pub fn drain_step<R: ScriptRunner + ?Sized>(&mut self, runner: &mut R) -> Option<Drained> {
        if !self.scheduled {
            return None;
        }
        let Some(script) = self.pending.front() else {
            self.scheduled = false;
            return None;
        };

        let result = runner.run(script);
        let script = self.pending.pop_front()?;
        if self.pending.is_empty() {
            self.scheduled = false;
        }
        Some(Drained { script, result })
    }

    /// Run everything currently queued, returning each outcome in order
    pub fn drain_all<R: ScriptRunner + ?Sized>(
        &mut self,
        runner: &mut R,
    ) -> alloc::vec::Vec<Drained> {
        let mut out = alloc::vec::Vec::new();
        while let Some(step) = self.drain_step(runner) {
            out.push(step);
        }
        out
    }
}
