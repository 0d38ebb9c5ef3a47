//! Typed requests and replies
//!
//! - Panel → host: [`Command`], one variant per defined request number
//! - Host → panel: [`Reply`], encoded to a single CRLF-terminated line

use core::fmt::{self, Write};

use heapless::{String, Vec};

use crate::command::{CommandError, FieldKey, ParsedCommand};
use crate::frame::MAX_FRAME_LEN;
use crate::screen::ScreenCode;

/// Maximum outbound line length, terminator included (panel RX buffer)
pub const MAX_LINE_LEN: usize = 50;

/// Maximum long label length in a list transfer
pub const FULL_LABEL_LEN: usize = 26;

/// Maximum short label length in a list transfer
pub const SHORT_LABEL_LEN: usize = 13;

/// Room for content once CRLF is appended, keeping lines strictly under
/// [`MAX_LINE_LEN`]
const MAX_CONTENT_LEN: usize = MAX_LINE_LEN - 3;

/// Verbatim field value
pub type FieldValue = String<MAX_FRAME_LEN>;

/// Jog / home axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Axis {
    X,
    Y,
    Z,
    E,
}

impl Axis {
    /// G-code letter
    pub fn letter(self) -> char {
        match self {
            Axis::X => 'X',
            Axis::Y => 'Y',
            Axis::Z => 'Z',
            Axis::E => 'E',
        }
    }
}

/// Homing request (A21)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HomeTarget {
    All,
    Axis(Axis),
}

/// One relative move of a jog request (A22)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JogMove {
    pub axis: Axis,
    /// Distance, forwarded verbatim
    pub distance: FieldValue,
}

/// Hotend temperature request (A16)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HotendTarget {
    /// `S`: set directly
    Direct(FieldValue),
    /// `C`: lift the nozzle clear of the bed first if it is low
    Guarded(FieldValue),
}

/// Requests from the panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// A0
    GetHotendTemp,
    /// A1
    GetHotendTarget,
    /// A2
    GetBedTemp,
    /// A3
    GetBedTarget,
    /// A4
    GetFanSpeed,
    /// A5
    GetPosition,
    /// A6
    GetProgress,
    /// A7
    GetPrintTime,
    /// A8: request a list page starting at `start`
    ListPage { start: usize },
    /// A9
    Pause,
    /// A10
    Resume,
    /// A11
    Stop,
    /// A12: emergency stop
    Kill,
    /// A13: operator touched a list row
    Select { label: FieldValue },
    /// A14
    StartPrint,
    /// A15: resume after power outage
    ResumeFromOutage,
    /// A16
    SetHotendTemp { target: Option<HotendTarget> },
    /// A17
    SetBedTemp { target: Option<FieldValue> },
    /// A18: percent of full scale, full speed when absent
    SetFanSpeed { percent: Option<i32> },
    /// A19
    DisableMotors,
    /// A20: read the speed factor, or set it in percent
    SpeedFactor { set: Option<i32> },
    /// A21
    Home(HomeTarget),
    /// A22: relative moves in X, Y, Z, E order
    Jog {
        moves: Vec<JogMove, 4>,
        feedrate: Option<FieldValue>,
    },
    /// A23
    PreheatPla,
    /// A24
    PreheatAbs,
    /// A25
    Cooldown,
    /// A26: refresh button; confirms a special menu selection
    Refresh,
    /// A27..A32: panel features this machine lacks; acknowledged only
    Acknowledge(u8),
    /// A33
    Version,
    /// A40
    ResetMainboard,
    /// A41: continue dialog. `power_off` is set by `O` (true) or `C`
    /// (false); `confirm` by `S`
    Continue {
        power_off: Option<bool>,
        confirm: bool,
    },
    /// A42
    CaseLight { on: bool },
}

fn value(parsed: &ParsedCommand, key: char) -> Option<FieldValue> {
    parsed.get(key).map(|v| {
        let mut out = String::new();
        // Field values share the frame capacity
        let _ = out.push_str(v);
        out
    })
}

/// Label text for A13: everything after the first "A13", trimmed
fn selection_label(raw: &str) -> FieldValue {
    let rest = match raw.find("A13") {
        Some(idx) => {
            let (head, tail) = raw.split_at(idx);
            let tail = &tail[3..];
            // Rebuild without the matched prefix
            let mut out: String<MAX_FRAME_LEN> = String::new();
            let _ = out.push_str(head);
            let _ = out.push_str(tail);
            out
        }
        None => {
            let mut out = String::new();
            let _ = out.push_str(raw);
            out
        }
    };
    let mut label = String::new();
    let _ = label.push_str(rest.trim());
    label
}

impl Command {
    /// Interpret a parsed request
    ///
    /// `raw` is the full request text (A13 needs it verbatim). Returns
    /// `Ok(None)` for no-op requests and undefined command numbers.
    pub fn from_parsed(parsed: &ParsedCommand, raw: &str) -> Result<Option<Self>, CommandError> {
        let number = match parsed.number()? {
            Some(n) => n,
            None => return Ok(None),
        };

        let command = match number {
            0 => Command::GetHotendTemp,
            1 => Command::GetHotendTarget,
            2 => Command::GetBedTemp,
            3 => Command::GetBedTarget,
            4 => Command::GetFanSpeed,
            5 => Command::GetPosition,
            6 => Command::GetProgress,
            7 => Command::GetPrintTime,
            8 => {
                let start = parsed.int('S')?.unwrap_or(0);
                let start = usize::try_from(start)
                    .map_err(|_| CommandError::InvalidArgument(FieldKey::Key('S')))?;
                Command::ListPage { start }
            }
            9 => Command::Pause,
            10 => Command::Resume,
            11 => Command::Stop,
            12 => Command::Kill,
            13 => Command::Select {
                label: selection_label(raw),
            },
            14 => Command::StartPrint,
            15 => Command::ResumeFromOutage,
            16 => {
                let target = if let Some(v) = value(parsed, 'S') {
                    Some(HotendTarget::Direct(v))
                } else {
                    value(parsed, 'C').map(HotendTarget::Guarded)
                };
                Command::SetHotendTemp { target }
            }
            17 => Command::SetBedTemp {
                target: value(parsed, 'S'),
            },
            18 => Command::SetFanSpeed {
                percent: parsed.int('S')?,
            },
            19 => Command::DisableMotors,
            20 => Command::SpeedFactor {
                set: parsed.int('S')?,
            },
            21 => {
                let target = [Axis::X, Axis::Y, Axis::Z]
                    .into_iter()
                    .find(|axis| parsed.has(axis.letter()))
                    .map(HomeTarget::Axis)
                    .unwrap_or(HomeTarget::All);
                Command::Home(target)
            }
            22 => {
                let mut moves = Vec::new();
                for axis in [Axis::X, Axis::Y, Axis::Z, Axis::E] {
                    if let Some(distance) = value(parsed, axis.letter()) {
                        // Four axes, four slots
                        let _ = moves.push(JogMove { axis, distance });
                    }
                }
                Command::Jog {
                    moves,
                    feedrate: value(parsed, 'F'),
                }
            }
            23 => Command::PreheatPla,
            24 => Command::PreheatAbs,
            25 => Command::Cooldown,
            26 => Command::Refresh,
            n @ 27..=32 => Command::Acknowledge(n as u8),
            33 => Command::Version,
            40 => Command::ResetMainboard,
            41 => {
                let power_off = if parsed.has('O') {
                    Some(true)
                } else if parsed.has('C') {
                    Some(false)
                } else {
                    None
                };
                Command::Continue {
                    power_off,
                    confirm: parsed.has('S'),
                }
            }
            42 => Command::CaseLight { on: parsed.has('O') },
            _ => return Ok(None),
        };

        Ok(Some(command))
    }
}

/// Replies to the panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// `A<n>V <text>`: answer to query `n`
    Value { cmd: u8, text: String<MAX_LINE_LEN> },
    /// `J<nn>[ <payload>]`
    Screen {
        code: ScreenCode,
        payload: Option<String<MAX_LINE_LEN>>,
    },
    /// Bare line terminator acknowledging an action
    Ack,
    /// `FN `: start of a list transfer
    ListBegin,
    /// One label line of a list transfer
    ListItem(String<FULL_LABEL_LEN>),
    /// `END`: end of a list transfer
    ListEnd,
    /// Diagnostic text sent verbatim
    Raw(String<MAX_LINE_LEN>),
}

/// Writer that silently stops at a byte budget, on a char boundary
struct Clipped<'a, const N: usize> {
    out: &'a mut String<N>,
    limit: usize,
}

impl<const N: usize> Write for Clipped<'_, N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.chars() {
            if self.out.len() + c.len_utf8() > self.limit.min(N) {
                break;
            }
            // Checked against capacity above
            let _ = self.out.push(c);
        }
        Ok(())
    }
}

fn clipped<const N: usize>(args: fmt::Arguments<'_>, limit: usize) -> String<N> {
    let mut out = String::new();
    let _ = Clipped {
        out: &mut out,
        limit,
    }
    .write_fmt(args);
    out
}

/// Truncate a label to at most `N` bytes, never splitting a character
pub fn truncate_label<const N: usize>(text: &str) -> String<N> {
    clipped(format_args!("{}", text), N)
}

impl Reply {
    /// Query answer built from format arguments
    pub fn value(cmd: u8, args: fmt::Arguments<'_>) -> Self {
        Reply::Value {
            cmd,
            text: clipped(args, MAX_CONTENT_LEN),
        }
    }

    /// Screen code without payload
    pub fn screen(code: ScreenCode) -> Self {
        Reply::Screen {
            code,
            payload: None,
        }
    }

    /// Screen code with a text payload
    pub fn screen_with(code: ScreenCode, payload: &str) -> Self {
        Reply::Screen {
            code,
            payload: Some(clipped(format_args!("{}", payload), MAX_CONTENT_LEN)),
        }
    }

    /// Verbatim text
    pub fn raw(text: &str) -> Self {
        Reply::Raw(clipped(format_args!("{}", text), MAX_CONTENT_LEN))
    }

    /// Minimum quiet time before this line may be sent, if the default
    /// pacing is not enough
    pub fn min_gap_ms(&self) -> Option<u32> {
        match self {
            Reply::Screen { code, .. } => code.min_gap_ms(),
            _ => None,
        }
    }

    /// Encode to a CRLF-terminated line, always shorter than
    /// [`MAX_LINE_LEN`]
    pub fn encode(&self) -> String<MAX_LINE_LEN> {
        let content: String<MAX_LINE_LEN> = match self {
            Reply::Value { cmd, text } => {
                clipped(format_args!("A{}V {}", cmd, text), MAX_CONTENT_LEN)
            }
            Reply::Screen {
                code,
                payload: Some(payload),
            } => clipped(
                format_args!("J{:02} {}", code.number(), payload),
                MAX_CONTENT_LEN,
            ),
            Reply::Screen {
                code,
                payload: None,
            } => clipped(format_args!("J{:02}", code.number()), MAX_CONTENT_LEN),
            Reply::Ack => String::new(),
            Reply::ListBegin => clipped(format_args!("FN "), MAX_CONTENT_LEN),
            Reply::ListItem(label) => clipped(format_args!("{}", label), MAX_CONTENT_LEN),
            Reply::ListEnd => clipped(format_args!("END"), MAX_CONTENT_LEN),
            Reply::Raw(text) => clipped(format_args!("{}", text), MAX_CONTENT_LEN),
        };

        let mut line = content;
        // MAX_CONTENT_LEN leaves room for the terminator
        let _ = line.push_str("\r\n");
        line
    }
}
