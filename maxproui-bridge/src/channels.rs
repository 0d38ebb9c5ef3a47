//! Inter-task communication channels
//!
//! Defines the static channels used between the Embassy tasks and the
//! blocking I/O threads. Threads post with `block_on`, which is safe with
//! the std critical-section implementation.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use maxproui_core::LinkEvent;
use maxproui_protocol::{Frame, Reply};

/// Channel capacity for session input
const SESSION_INPUT_SIZE: usize = 16;

/// Channel capacity for outbound lines; a full page transfer is ten lines
const PANEL_TX_SIZE: usize = 32;

/// Everything the session task reacts to, besides the tick
#[derive(Debug, Clone)]
pub enum SessionInput {
    /// Complete request from the panel
    Frame(Frame),
    /// Klipper connection change
    Link(LinkEvent),
    /// Text a Klipper macro asked to show on the panel
    HostText(String),
}

/// Input to the session task from the panel reader and the Klipper worker
pub static SESSION_INPUT: Channel<CriticalSectionRawMutex, SessionInput, SESSION_INPUT_SIZE> =
    Channel::new();

/// Replies waiting to be paced onto the panel UART
pub static PANEL_TX: Channel<CriticalSectionRawMutex, Reply, PANEL_TX_SIZE> = Channel::new();
