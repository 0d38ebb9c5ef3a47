//! Tick task for time-based updates
//!
//! Provides periodic ticks to the session for print state polling.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Instant, Ticker};
use tracing::info;

/// Signal to notify the session of a tick
pub static TICK_SIGNAL: Signal<CriticalSectionRawMutex, u64> = Signal::new();

/// Tick task - sends periodic tick signals with the elapsed time
#[embassy_executor::task]
pub async fn tick_task(interval_ms: u64) {
    info!(interval_ms, "tick task started");

    let mut ticker = Ticker::every(Duration::from_millis(interval_ms));
    let start = Instant::now();

    loop {
        ticker.next().await;
        TICK_SIGNAL.signal(start.elapsed().as_millis());
    }
}
