//! Line framing for panel → host traffic.
//!
//! The panel terminates each request with CR and/or LF. Its firmware also
//! treats `:` as an end-of-request marker, so we do the same. Bytes are fed
//! one at a time as they arrive from the UART.

use heapless::String;

/// Maximum request length accepted from the panel (its TX buffer size)
pub const MAX_FRAME_LEN: usize = 96;

/// Errors that can occur during framing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Request exceeded [`MAX_FRAME_LEN`]; bytes up to the next terminator
    /// are dropped
    TooLong,
}

impl core::fmt::Display for FrameError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            FrameError::TooLong => write!(f, "request longer than {} bytes", MAX_FRAME_LEN),
        }
    }
}

/// One complete inbound request, terminator stripped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    text: String<MAX_FRAME_LEN>,
}

impl Frame {
    /// Build a frame from text (mostly useful for tests and replay)
    pub fn new(text: &str) -> Result<Self, FrameError> {
        let mut s = String::new();
        s.push_str(text).map_err(|_| FrameError::TooLong)?;
        Ok(Self { text: s })
    }

    /// The request text
    pub fn as_str(&self) -> &str {
        self.text.as_str()
    }
}

/// Accumulates bytes into [`Frame`]s
#[derive(Debug, Clone, Default)]
pub struct LineFramer {
    buffer: heapless::Vec<u8, MAX_FRAME_LEN>,
    /// Set after an overflow until the next terminator
    discarding: bool,
}

fn is_terminator(byte: u8) -> bool {
    matches!(byte, b'\n' | b'\r' | b':')
}

impl LineFramer {
    /// Create a new framer
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop any partial request
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.discarding = false;
    }

    /// Feed a single byte
    ///
    /// Returns `Ok(Some(frame))` when a terminator completes a non-empty
    /// request, `Ok(None)` when more bytes are needed, or `Err` the moment
    /// a request overflows.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Frame>, FrameError> {
        if is_terminator(byte) {
            if self.discarding {
                self.reset();
                return Ok(None);
            }
            if self.buffer.is_empty() {
                return Ok(None);
            }
            let frame = self.take();
            return Ok(frame);
        }

        if self.discarding {
            return Ok(None);
        }

        if self.buffer.push(byte).is_err() {
            self.buffer.clear();
            self.discarding = true;
            return Err(FrameError::TooLong);
        }
        Ok(None)
    }

    fn take(&mut self) -> Option<Frame> {
        // The panel only speaks ASCII; anything else is line noise.
        let text = core::str::from_utf8(&self.buffer).ok().map(|s| {
            let mut out = String::new();
            // Cannot fail: the buffer and the string share a capacity
            let _ = out.push_str(s.trim());
            out
        });
        self.buffer.clear();
        text.filter(|t| !t.is_empty()).map(|text| Frame { text })
    }
}
