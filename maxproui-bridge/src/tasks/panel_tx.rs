//! Panel UART transmit task
//!
//! Sends replies one line at a time. The panel drops lines that arrive
//! back to back, so each line waits for the configured gap after the
//! previous one, or longer if the line itself asks for it.

use std::fs::File;

use embassy_time::{Duration, Instant, Timer};
use tracing::{debug, info, warn};

use maxproui_protocol::Reply;

use crate::channels::PANEL_TX;
use crate::panel::write_line;

/// Earliest time `reply` may go out, given when the last line went out
pub fn next_send_time(last: Option<Instant>, reply: &Reply, cmd_delay: Duration) -> Instant {
    let gap = reply
        .min_gap_ms()
        .map(|ms| Duration::from_millis(ms as u64))
        .unwrap_or(cmd_delay);
    match last {
        Some(last) => (last + gap).max(Instant::now()),
        None => Instant::now(),
    }
}

/// Panel TX task - paces replies onto the UART
#[embassy_executor::task]
pub async fn panel_tx_task(mut port: File, cmd_delay_ms: u64) {
    info!(cmd_delay_ms, "panel TX task started");

    let cmd_delay = Duration::from_millis(cmd_delay_ms);
    let mut last_sent: Option<Instant> = None;

    loop {
        let reply = PANEL_TX.receive().await;
        Timer::at(next_send_time(last_sent, &reply, cmd_delay)).await;

        let line = reply.encode();
        match write_line(&mut port, &line) {
            Ok(()) => debug!(line = line.trim_end(), "panel reply"),
            Err(e) => warn!("failed to write to panel: {}", e),
        }
        last_sent = Some(Instant::now());
    }
}
