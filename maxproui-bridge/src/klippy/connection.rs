//! Socket framing and request ids

use std::io::{self, Read, Write};
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::time::Duration;

use serde_json::{json, Value};
use thiserror::Error;
use tracing::trace;

/// Message terminator
const ETX: u8 = 0x03;

/// How long one read may block before the worker loop comes around again
const READ_TIMEOUT: Duration = Duration::from_millis(50);

/// Klipper API errors
#[derive(Debug, Error)]
pub enum KlippyError {
    #[error("socket error: {0}")]
    Io(#[from] io::Error),
    #[error("klippy closed the connection")]
    Closed,
    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),
    #[error("panel port is down")]
    PanelDown,
}

/// Splits the byte stream into messages
#[derive(Debug, Default)]
pub struct MessageReader {
    buf: Vec<u8>,
}

impl MessageReader {
    pub fn push(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Next complete message, if one has arrived
    pub fn next_message(&mut self) -> Option<Result<Value, serde_json::Error>> {
        let end = self.buf.iter().position(|&b| b == ETX)?;
        let raw: Vec<u8> = self.buf.drain(..=end).collect();
        Some(serde_json::from_slice(&raw[..end]))
    }
}

/// One connection to the API socket
pub struct Connection {
    stream: UnixStream,
    reader: MessageReader,
    next_id: u64,
}

impl Connection {
    pub fn connect(path: &Path) -> Result<Self, KlippyError> {
        let stream = UnixStream::connect(path)?;
        stream.set_read_timeout(Some(READ_TIMEOUT))?;
        Ok(Self {
            stream,
            reader: MessageReader::default(),
            next_id: 1,
        })
    }

    /// Send a request, returning its id
    pub fn request(&mut self, method: &str, params: Value) -> Result<u64, KlippyError> {
        let id = self.next_id;
        self.next_id += 1;

        let mut msg = serde_json::to_vec(&json!({
            "id": id,
            "method": method,
            "params": params,
        }))?;
        msg.push(ETX);
        trace!(id, method, "klippy request");
        self.stream.write_all(&msg)?;
        Ok(id)
    }

    /// Next message, waiting at most one read timeout
    pub fn poll(&mut self) -> Result<Option<Value>, KlippyError> {
        if let Some(msg) = self.reader.next_message() {
            return Ok(Some(msg?));
        }

        let mut buf = [0u8; 4096];
        match self.stream.read(&mut buf) {
            Ok(0) => Err(KlippyError::Closed),
            Ok(n) => {
                self.reader.push(&buf[..n]);
                Ok(self.reader.next_message().transpose()?)
            }
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                Ok(None)
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
