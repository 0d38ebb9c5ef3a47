//! Session task
//!
//! Owns the panel session. Reacts to panel requests, Klipper link changes,
//! host text, status ticks and the startup greeting timer. Replies go to
//! the TX task; queued scripts are handed to the Klipper worker after
//! every event so a reply never waits on a script. The task yields after
//! each script so a long queue cannot hold up the executor.

use core::future::pending;

use embassy_futures::select::{select3, Either3};
use embassy_futures::yield_now;
use embassy_time::{Duration, Instant, Timer};
use tracing::{debug, info, trace, warn};

use maxproui_core::traits::ScriptRunner;
use maxproui_core::{Session, SessionError};
use maxproui_protocol::Reply;

use crate::channels::{SessionInput, PANEL_TX, SESSION_INPUT};
use crate::klippy::{ScriptForwarder, StatusCache};
use crate::sdcard::GcodeDirectory;
use crate::tasks::tick::TICK_SIGNAL;

/// Everything the session task owns
pub struct SessionResources {
    pub session: Session,
    pub status: StatusCache,
    pub files: GcodeDirectory,
    pub runner: ScriptForwarder,
    /// Delay between the link coming up and the greeting
    pub startup_delay_ms: u64,
}

/// Session task - main coordination loop
#[embassy_executor::task]
pub async fn session_task(res: SessionResources) {
    info!("session task started");

    let SessionResources {
        mut session,
        status,
        mut files,
        mut runner,
        startup_delay_ms,
    } = res;
    let startup_delay = Duration::from_millis(startup_delay_ms);

    let mut greeting_at: Option<Instant> = None;
    let mut out: Vec<Reply> = Vec::new();

    loop {
        let deadline = greeting_at;
        match select3(SESSION_INPUT.receive(), TICK_SIGNAL.wait(), async move {
            match deadline {
                Some(at) => Timer::at(at).await,
                None => pending::<()>().await,
            }
        })
        .await
        {
            Either3::First(SessionInput::Frame(frame)) => {
                files.refresh_if_stale();
                let machine = status.current();
                match session.handle_frame(frame.as_str(), &machine, &files, &mut out) {
                    Ok(()) => {}
                    Err(SessionError::NotConnected) => {
                        trace!(frame = frame.as_str(), "link down, request dropped")
                    }
                    Err(e) => debug!(frame = frame.as_str(), "bad panel request: {}", e),
                }
            }

            Either3::First(SessionInput::Link(event)) => {
                let before = session.link_state();
                let state = session.on_link_event(event);
                if state != before {
                    info!(?event, ?state, "link state changed");
                }
                match (before.is_connected(), state.is_connected()) {
                    (false, true) => greeting_at = Some(Instant::now() + startup_delay),
                    (_, false) => greeting_at = None,
                    _ => {}
                }
            }

            Either3::First(SessionInput::HostText(text)) => {
                if let Err(e) = session.send_raw(&text, &mut out) {
                    debug!(text = %text, "host text dropped: {}", e);
                }
            }

            Either3::Second(now_ms) => {
                trace!(now_ms, "tick");
                session.tick(&status.current(), &mut out);
            }

            Either3::Third(()) => {
                greeting_at = None;
                if session.fire_greeting(&mut out) {
                    info!("panel greeted");
                }
            }
        }

        for reply in out.drain(..) {
            PANEL_TX.send(reply).await;
        }

        while drain_once(&mut session, &mut runner) {
            yield_now().await;
        }
    }
}

/// Hand the oldest queued script to the worker
///
/// Returns `false` once nothing is scheduled.
fn drain_once<R: ScriptRunner + ?Sized>(session: &mut Session, runner: &mut R) -> bool {
    let Some(step) = session.drain_step(runner) else {
        return false;
    };
    match step.result {
        Ok(()) => debug!(script = %step.script, "script dispatched"),
        Err(e) => warn!(script = %step.script, "script not dispatched: {}", e),
    }
    true
}
