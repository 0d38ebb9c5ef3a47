//! Klipper API client
//!
//! Klipper exposes a JSON API on a unix socket (`klippy -a <socket>`).
//! Messages are JSON objects terminated by 0x03. A worker thread owns the
//! socket: it polls printer status into a shared cache, forwards scripts
//! handed over by the session, and relays the `maxproui_send` remote
//! method so macros can write to the panel.

mod connection;
mod status;
mod worker;

pub use status::StatusCache;
pub use worker::{spawn_worker, ScriptForwarder};
