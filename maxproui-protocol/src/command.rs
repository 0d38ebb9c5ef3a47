//! Request field parser
//!
//! A request is the envelope letter `A` followed by the command number and
//! optional `<key><value>` fields:
//! - whitespace is skipped
//! - any letter, or `<`, starts a new field keyed by that character
//! - every other character is appended to the current field
//!
//! Characters before the first key belong to the command number. Only
//! single-character keys exist; a repeated key starts over with an empty
//! value.

use heapless::{LinearMap, String};

use crate::frame::MAX_FRAME_LEN;

/// Maximum distinct fields in one request
///
/// Real requests carry at most five, but an A13 file name splits into one
/// field per distinct letter, so every ASCII letter must fit.
pub const MAX_FIELDS: usize = 64;

/// Field identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FieldKey {
    /// Implicit field holding the command number digits
    Cmd,
    /// Single-character key (`S`, `X`, `<`, ...)
    Key(char),
}

/// Errors raised while interpreting a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    /// Command field is not a number (link out of sync)
    InvalidNumber,
    /// A numeric argument could not be parsed
    InvalidArgument(FieldKey),
    /// Request carries more than [`MAX_FIELDS`] distinct keys
    TooManyFields,
    /// A field value exceeds [`MAX_FRAME_LEN`]
    FieldTooLong,
}

impl core::fmt::Display for CommandError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            CommandError::InvalidNumber => write!(f, "command number is not numeric"),
            CommandError::InvalidArgument(FieldKey::Cmd) => write!(f, "invalid command field"),
            CommandError::InvalidArgument(FieldKey::Key(k)) => {
                write!(f, "invalid numeric argument for '{}'", k)
            }
            CommandError::TooManyFields => write!(f, "too many fields"),
            CommandError::FieldTooLong => write!(f, "field value too long"),
        }
    }
}

/// A request split into its fields
#[derive(Debug, Clone)]
pub struct ParsedCommand {
    fields: LinearMap<FieldKey, String<MAX_FRAME_LEN>, MAX_FIELDS>,
}

impl ParsedCommand {
    fn empty() -> Self {
        let mut fields = LinearMap::new();
        // Capacity is non-zero
        let _ = fields.insert(FieldKey::Cmd, String::new());
        Self { fields }
    }

    /// Raw command number text; empty for no-op requests
    pub fn cmd(&self) -> &str {
        self.fields
            .get(&FieldKey::Cmd)
            .map(|s| s.as_str())
            .unwrap_or("")
    }

    /// Command number
    ///
    /// `Ok(None)` when the request carried no command (treat as no-op).
    pub fn number(&self) -> Result<Option<u16>, CommandError> {
        let cmd = self.cmd();
        if cmd.is_empty() {
            return Ok(None);
        }
        cmd.parse::<u16>()
            .map(Some)
            .map_err(|_| CommandError::InvalidNumber)
    }

    /// Value of a keyed field
    pub fn get(&self, key: char) -> Option<&str> {
        self.fields.get(&FieldKey::Key(key)).map(|s| s.as_str())
    }

    /// Whether a keyed field is present (possibly with an empty value)
    pub fn has(&self, key: char) -> bool {
        self.fields.contains_key(&FieldKey::Key(key))
    }

    /// Parse a keyed field as an integer
    pub fn int(&self, key: char) -> Result<Option<i32>, CommandError> {
        match self.get(key) {
            None => Ok(None),
            Some(v) => v
                .trim()
                .parse::<i32>()
                .map(Some)
                .map_err(|_| CommandError::InvalidArgument(FieldKey::Key(key))),
        }
    }

    /// Number of fields, including the command field
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Always false: the command field is always present
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Parse a request into fields
///
/// Requests that are empty or lack the `A` envelope yield an empty command
/// field and no other fields.
pub fn parse_command(raw: &str) -> Result<ParsedCommand, CommandError> {
    let mut parsed = ParsedCommand::empty();

    let body = match raw.strip_prefix('A') {
        Some(body) => body,
        None => return Ok(parsed),
    };

    let mut key = FieldKey::Cmd;
    for c in body.chars() {
        if c.is_whitespace() {
            continue;
        }
        if c.is_alphabetic() || c == '<' {
            key = FieldKey::Key(c);
            parsed
                .fields
                .insert(key, String::new())
                .map_err(|_| CommandError::TooManyFields)?;
        } else if let Some(value) = parsed.fields.get_mut(&key) {
            value.push(c).map_err(|_| CommandError::FieldTooLong)?;
        }
    }

    Ok(parsed)
}
