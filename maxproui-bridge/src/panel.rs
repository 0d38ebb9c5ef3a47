//! Panel serial port
//!
//! The port is opened once at startup and put in raw mode. Reading is
//! blocking, so it runs on its own thread and feeds the line framer;
//! complete frames are posted to the session task. When the reader stops,
//! the shared `up` flag is cleared and the link is reported lost.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use embassy_futures::block_on;
use nix::sys::termios::{self, SetArg};
use thiserror::Error;
use tracing::{debug, error, info, trace};

use maxproui_core::LinkEvent;
use maxproui_protocol::LineFramer;

use crate::channels::{SessionInput, SESSION_INPUT};

/// Read chunk size
const RX_BUF_SIZE: usize = 64;

/// Serial link errors
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("cannot open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("cannot configure {path}: {source}")]
    Configure {
        path: String,
        #[source]
        source: nix::Error,
    },
    #[error("unsupported baud rate {0}")]
    Baud(u32),
}

/// Supported line speeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaudRate(termios::BaudRate);

impl BaudRate {
    pub fn from_u32(baud: u32) -> Option<Self> {
        use termios::BaudRate as B;
        let rate = match baud {
            9_600 => B::B9600,
            19_200 => B::B19200,
            38_400 => B::B38400,
            57_600 => B::B57600,
            115_200 => B::B115200,
            230_400 => B::B230400,
            460_800 => B::B460800,
            921_600 => B::B921600,
            _ => return None,
        };
        Some(Self(rate))
    }
}

/// Open the panel UART in raw mode
///
/// Returns a reader and a writer handle to the same device.
pub fn open(device: &Path, baud: u32) -> Result<(File, File), LinkError> {
    let path = device.display().to_string();
    let rate = BaudRate::from_u32(baud).ok_or(LinkError::Baud(baud))?;

    let port = OpenOptions::new()
        .read(true)
        .write(true)
        .open(device)
        .map_err(|source| LinkError::Open {
            path: path.clone(),
            source,
        })?;

    let configure = |port: &File| -> nix::Result<()> {
        let mut tio = termios::tcgetattr(port)?;
        termios::cfmakeraw(&mut tio);
        termios::cfsetspeed(&mut tio, rate.0)?;
        termios::tcsetattr(port, SetArg::TCSANOW, &tio)
    };
    configure(&port).map_err(|source| LinkError::Configure {
        path: path.clone(),
        source,
    })?;

    let writer = port.try_clone().map_err(|source| LinkError::Open { path, source })?;
    info!(device = %device.display(), baud, "panel port open");
    Ok((port, writer))
}

/// Write one encoded line
pub fn write_line<W: Write>(port: &mut W, line: &str) -> io::Result<()> {
    port.write_all(line.as_bytes())?;
    port.flush()
}

/// Feed bytes to the framer, posting each complete frame
fn pump<R: Read>(mut port: R, mut post: impl FnMut(SessionInput)) -> io::Result<()> {
    let mut framer = LineFramer::new();
    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        let n = match port.read(&mut buf) {
            Ok(0) => return Ok(()),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        trace!("RX: {} bytes", n);

        for &byte in &buf[..n] {
            match framer.feed(byte) {
                Ok(Some(frame)) => {
                    debug!(frame = frame.as_str(), "panel request");
                    post(SessionInput::Frame(frame));
                }
                Ok(None) => {}
                Err(e) => debug!("dropping panel request: {}", e),
            }
        }
    }
}

/// Read until the port fails, then mark it down and report the link lost
fn read_panel<R: Read>(port: R, up: &AtomicBool, mut post: impl FnMut(SessionInput)) {
    match pump(port, &mut post) {
        Ok(()) => error!("panel port closed"),
        Err(e) => error!("panel read failed: {}", e),
    }
    // Cleared before posting so the worker cannot reopen behind us
    up.store(false, Ordering::Release);
    post(SessionInput::Link(LinkEvent::Lost));
}

/// Spawn the blocking reader thread
pub fn spawn_reader(port: File, up: Arc<AtomicBool>) -> io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("panel-rx".into())
        .spawn(move || {
            info!("panel reader started");
            read_panel(port, &up, |input| block_on(SESSION_INPUT.send(input)));
        })
}
