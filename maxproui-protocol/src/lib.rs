//! Anycubic 4Max Pro touch panel protocol
//!
//! This crate defines the ASCII line protocol spoken by the 4Max Pro TFT
//! panel over its UART. The panel is the requester: it polls for sensor
//! values and forwards operator actions, and the host answers.
//!
//! # Protocol Overview
//!
//! Panel → host requests are single lines:
//! ```text
//! A<n>[ <key><value>...]\r\n        e.g.  A8 S4   A16 S210   A13 <special_menu>
//! ```
//!
//! Host → panel replies are CRLF-terminated lines of three families:
//! ```text
//! A<n>V <value>\r\n                 query answer
//! J<nn>[ <payload>]\r\n             screen switch / dialog
//! FN \r\n <label>\r\n ... END\r\n   file/menu list transfer
//! ```
//!
//! Every outbound line stays under [`MAX_LINE_LEN`] bytes because the panel
//! firmware has a fixed receive buffer.

#![no_std]
#![deny(unsafe_code)]

pub mod command;
pub mod frame;
pub mod messages;
pub mod screen;

pub use command::{parse_command, CommandError, FieldKey, ParsedCommand, MAX_FIELDS};
pub use frame::{Frame, FrameError, LineFramer, MAX_FRAME_LEN};
pub use messages::{
    truncate_label, Axis, Command, FieldValue, HomeTarget, HotendTarget, JogMove, Reply,
    FULL_LABEL_LEN, MAX_LINE_LEN, SHORT_LABEL_LEN,
};
pub use screen::ScreenCode;
