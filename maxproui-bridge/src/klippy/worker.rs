//! Klipper worker thread
//!
//! One connection at a time. While the link is up the worker polls
//! `objects/query` into the status cache, forwards scripts, and relays
//! remote method calls. Any socket failure reports the link lost and the
//! worker reconnects after a short pause. The link is only offered to the
//! session while the panel port is up as well.

use std::collections::HashMap;
use std::mem;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use embassy_futures::block_on;
use serde_json::{json, Map, Value};
use tracing::{debug, info, trace, warn};

use maxproui_core::traits::{ScriptError, ScriptRunner};
use maxproui_core::LinkEvent;

use super::connection::{Connection, KlippyError};
use super::status::{StatusCache, STATUS_OBJECTS};
use crate::channels::{SessionInput, SESSION_INPUT};

/// Remote method macros call to write to the panel:
/// `{action_call_remote_method("maxproui_send", cmd="J14")}`
pub const REMOTE_METHOD: &str = "maxproui_send";

/// Action Klipper tags remote method calls with
const REMOTE_ACTION: &str = "run_maxproui_send";

/// Pause between connection attempts
const RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// What an outstanding request id was for
#[derive(Debug)]
enum Pending {
    Register,
    Info,
    Query,
    Script(String),
}

/// Hands scripts to the worker thread without waiting for Klipper
#[derive(Debug, Clone)]
pub struct ScriptForwarder {
    tx: Sender<String>,
}

impl ScriptForwarder {
    pub fn new(tx: Sender<String>) -> Self {
        Self { tx }
    }
}

impl ScriptRunner for ScriptForwarder {
    fn run(&mut self, script: &str) -> Result<(), ScriptError> {
        self.tx
            .send(script.to_string())
            .map_err(|_| ScriptError::Unavailable)
    }
}

/// Klipper API worker
pub struct Worker<P: FnMut(SessionInput)> {
    socket: PathBuf,
    poll: Duration,
    status: StatusCache,
    scripts: Receiver<String>,
    /// Cleared by the panel reader when the port goes away
    panel_up: Arc<AtomicBool>,
    post: P,
    /// A connection was established since the last failure
    online: bool,
}

impl<P: FnMut(SessionInput)> Worker<P> {
    pub fn new(
        socket: PathBuf,
        poll: Duration,
        status: StatusCache,
        scripts: Receiver<String>,
        panel_up: Arc<AtomicBool>,
        post: P,
    ) -> Self {
        Self {
            socket,
            poll,
            status,
            scripts,
            panel_up,
            post,
            online: false,
        }
    }

    fn check_panel(&self) -> Result<(), KlippyError> {
        if self.panel_up.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(KlippyError::PanelDown)
        }
    }

    /// Connect, serve, reconnect; forever
    pub fn run(mut self) -> ! {
        loop {
            match self.serve() {
                Ok(()) => info!("script channel closed"),
                Err(e) if mem::take(&mut self.online) => {
                    warn!(socket = %self.socket.display(), "klippy connection lost: {}", e)
                }
                Err(e) => debug!(socket = %self.socket.display(), "klippy unreachable: {}", e),
            }
            (self.post)(SessionInput::Link(LinkEvent::Lost));
            thread::sleep(RECONNECT_DELAY);
        }
    }

    /// Serve one connection until it fails
    ///
    /// Returns `Ok` only once every [`ScriptForwarder`] is gone.
    pub fn serve(&mut self) -> Result<(), KlippyError> {
        self.check_panel()?;
        let mut conn = Connection::connect(&self.socket)?;
        info!(socket = %self.socket.display(), "connected to klippy");
        self.online = true;
        (self.post)(SessionInput::Link(LinkEvent::Open));

        let mut pending = HashMap::new();
        let id = conn.request(
            "register_remote_method",
            json!({
                "response_template": {"action": REMOTE_ACTION},
                "remote_method": REMOTE_METHOD,
            }),
        )?;
        pending.insert(id, Pending::Register);

        let mut ready = false;
        let mut next_poll = Instant::now();

        loop {
            self.check_panel()?;

            // Scripts wait in the channel until klippy is ready
            while ready {
                match self.scripts.try_recv() {
                    Ok(script) => {
                        let id = conn.request("gcode/script", json!({ "script": script }))?;
                        pending.insert(id, Pending::Script(script));
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => return Ok(()),
                }
            }

            if Instant::now() >= next_poll {
                let id = if ready {
                    let id = conn.request("objects/query", query_params())?;
                    pending.insert(id, Pending::Query);
                    id
                } else {
                    let id = conn.request("info", json!({}))?;
                    pending.insert(id, Pending::Info);
                    id
                };
                trace!(id, "status poll");
                next_poll = Instant::now() + self.poll;
            }

            while let Some(msg) = conn.poll()? {
                self.handle(msg, &mut pending, &mut ready);
            }
        }
    }

    fn handle(&mut self, msg: Value, pending: &mut HashMap<u64, Pending>, ready: &mut bool) {
        let Some(id) = msg.get("id").and_then(Value::as_u64) else {
            self.handle_remote(&msg);
            return;
        };
        let Some(request) = pending.remove(&id) else {
            debug!(id, "reply to unknown request");
            return;
        };

        if let Some(err) = msg.get("error") {
            let message = err
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            match request {
                Pending::Script(script) => warn!(script = %script, "script failed: {}", message),
                other => warn!(request = ?other, "klippy error: {}", message),
            }
            return;
        }

        let result = msg.get("result").unwrap_or(&Value::Null);
        match request {
            Pending::Register => debug!(method = REMOTE_METHOD, "remote method registered"),
            Pending::Info => {
                let state = result.get("state").and_then(Value::as_str).unwrap_or("");
                if let Some(version) = result.get("software_version").and_then(Value::as_str) {
                    self.status.update(|s| s.set_version(version));
                }
                if state == "ready" && !*ready {
                    *ready = true;
                    info!("klippy ready");
                    (self.post)(SessionInput::Link(LinkEvent::Ready));
                } else {
                    debug!(state, "waiting for klippy");
                }
            }
            Pending::Query => {
                if let Some(status) = result.get("status") {
                    self.status.update(|s| s.apply(status));
                }
            }
            Pending::Script(script) => trace!(script = %script, "script done"),
        }
    }

    fn handle_remote(&mut self, msg: &Value) {
        if msg.get("action").and_then(Value::as_str) != Some(REMOTE_ACTION) {
            trace!("ignoring unsolicited message");
            return;
        }
        match msg.pointer("/params/cmd").and_then(Value::as_str) {
            Some(cmd) => (self.post)(SessionInput::HostText(cmd.to_string())),
            None => warn!("{} called without cmd", REMOTE_METHOD),
        }
    }
}

fn query_params() -> Value {
    let objects: Map<String, Value> = STATUS_OBJECTS
        .iter()
        .map(|(name, fields)| (name.to_string(), json!(fields)))
        .collect();
    json!({ "objects": objects })
}

/// Spawn the worker thread
pub fn spawn_worker(
    socket: PathBuf,
    poll: Duration,
    status: StatusCache,
    scripts: Receiver<String>,
    panel_up: Arc<AtomicBool>,
) -> std::io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("klippy".into())
        .spawn(move || {
            let post = |input| block_on(SESSION_INPUT.send(input));
            Worker::new(socket, poll, status, scripts, panel_up, post).run()
        })
}
