//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels/signals.

pub mod panel_tx;
pub mod session;
pub mod tick;

pub use panel_tx::panel_tx_task;
pub use session::{session_task, SessionResources};
pub use tick::tick_task;
