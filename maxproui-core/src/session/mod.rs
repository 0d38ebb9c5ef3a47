//! Session controller
//!
//! Owns the link state, the per-connection context and the dispatch
//! queue. Everything the panel or the host does arrives here as a method
//! call; replies are appended to an output buffer for the transmit side
//! to pace onto the wire.

mod context;
mod handlers;

use alloc::vec::Vec;

use maxproui_protocol::{parse_command, Command, CommandError, Reply, ScreenCode};

use crate::catalog::MenuCatalog;
use crate::config::MachineConfig;
use crate::dispatch::{DispatchQueue, Drained};
use crate::state::{LinkEvent, LinkState};
use crate::traits::{FileListing, MachineStatus, ScriptRunner};

pub use context::{OneShot, SelectionContext, SessionContext};

use handlers::Handlers;

/// Session-level failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionError {
    /// The link is not ready; input was dropped
    NotConnected,
    /// The request could not be interpreted
    Command(CommandError),
}

impl From<CommandError> for SessionError {
    fn from(err: CommandError) -> Self {
        SessionError::Command(err)
    }
}

impl core::fmt::Display for SessionError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SessionError::NotConnected => write!(f, "link not connected"),
            SessionError::Command(err) => write!(f, "{}", err),
        }
    }
}

/// Panel session
#[derive(Debug)]
pub struct Session {
    catalog: MenuCatalog,
    machine: MachineConfig,
    link: LinkState,
    context: Option<SessionContext>,
    queue: DispatchQueue,
}

impl Session {
    pub fn new(catalog: MenuCatalog, machine: MachineConfig) -> Self {
        Self {
            catalog,
            machine,
            link: LinkState::default(),
            context: None,
            queue: DispatchQueue::new(),
        }
    }

    pub fn link_state(&self) -> LinkState {
        self.link
    }

    pub fn catalog(&self) -> &MenuCatalog {
        &self.catalog
    }

    /// Selection state of the live connection
    pub fn selection(&self) -> Option<&SelectionContext> {
        self.context.as_ref().map(|ctx| &ctx.selection)
    }

    pub fn queue(&self) -> &DispatchQueue {
        &self.queue
    }

    /// Apply a link event
    ///
    /// Becoming connected creates a fresh context and arms the greeting.
    /// Losing the link drops the context and cancels the greeting; queued
    /// scripts are kept.
    pub fn on_link_event(&mut self, event: LinkEvent) -> LinkState {
        let previous = self.link;
        self.link = previous.transition(event);

        match (previous.is_connected(), self.link.is_connected()) {
            (false, true) => self.context = Some(SessionContext::new()),
            (true, false) => {
                if let Some(mut ctx) = self.context.take() {
                    ctx.greeting.cancel();
                }
            }
            _ => {}
        }
        self.link
    }

    /// Whether the greeting is still waiting to fire
    pub fn greeting_armed(&self) -> bool {
        self.context
            .as_ref()
            .map(|ctx| ctx.greeting.is_armed())
            .unwrap_or(false)
    }

    /// Send the startup greeting (J17, J12) if it is still armed
    pub fn fire_greeting(&mut self, out: &mut Vec<Reply>) -> bool {
        let Some(ctx) = self.context.as_mut() else {
            return false;
        };
        if !ctx.greeting.fire() {
            return false;
        }
        out.push(Reply::screen(ScreenCode::MainboardReset));
        out.push(Reply::screen(ScreenCode::Ready));
        true
    }

    /// Handle one inbound request
    ///
    /// Undefined command numbers and empty requests are ignored silently.
    pub fn handle_frame<M, F>(
        &mut self,
        raw: &str,
        machine: &M,
        files: &F,
        out: &mut Vec<Reply>,
    ) -> Result<(), SessionError>
    where
        M: MachineStatus + ?Sized,
        F: FileListing + ?Sized,
    {
        let ctx = match (self.link.is_connected(), self.context.as_mut()) {
            (true, Some(ctx)) => ctx,
            _ => return Err(SessionError::NotConnected),
        };

        let parsed = parse_command(raw)?;
        let Some(command) = Command::from_parsed(&parsed, raw)? else {
            return Ok(());
        };

        Handlers {
            catalog: &self.catalog,
            config: &self.machine,
            queue: &mut self.queue,
            ctx,
            machine,
            files,
            out,
        }
        .dispatch(command);
        Ok(())
    }

    /// Periodic status poll; sends screen changes for print state
    /// transitions
    pub fn tick<M: MachineStatus + ?Sized>(&mut self, machine: &M, out: &mut Vec<Reply>) {
        if !self.link.is_connected() {
            return;
        }
        let Some(ctx) = self.context.as_mut() else {
            return;
        };
        if let Some(codes) = ctx.notifier.tick(&machine.snapshot()) {
            out.extend(codes.iter().map(|&code| Reply::screen(code)));
        }
    }

    /// Forward host-supplied text to the panel verbatim
    pub fn send_raw(&mut self, text: &str, out: &mut Vec<Reply>) -> Result<(), SessionError> {
        if !self.link.is_connected() {
            return Err(SessionError::NotConnected);
        }
        out.push(Reply::raw(text));
        Ok(())
    }

    /// Run the oldest queued script, if a drain is scheduled
    pub fn drain_step<R: ScriptRunner + ?Sized>(&mut self, runner: &mut R) -> Option<Drained> {
        self.queue.drain_step(runner)
    }

    /// Whether queued scripts are waiting for [`Session::drain_step`]
    pub fn drain_pending(&self) -> bool {
        self.queue.is_scheduled()
    }
}
