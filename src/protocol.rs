//! Communication Protocols
//!
//! Host line assembly and command tokenizing for the SCPI-style command set
//! (`*IDN?`, `*TRG`, `SET`, `SET?`, `STAT?`, `HELP`). Lines end with CR and/or LF;
//! tokens are case-insensitive and separated by whitespace.

use heapless::{String, Vec};

use crate::config::CMD_BUFFER_SIZE;

/// One assembled host line
pub type Line = String<CMD_BUFFER_SIZE>;

/// Byte-wise line assembler
pub struct LineBuffer {
    /// Command buffer
    buffer: Vec<u8, CMD_BUFFER_SIZE>,
    /// Current line exceeded the buffer and will be dropped
    overflow: bool,
}

impl LineBuffer {
    /// Create an empty line buffer
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: Vec::new(),
            overflow: false,
        }
    }

    /// Feed a byte to the buffer
    /// Returns a line when a terminator completes a non-empty one
    pub fn feed(&mut self, byte: u8) -> Option<Line> {
        match byte {
            b'\r' | b'\n' => {
                let line = self.take_line();
                self.buffer.clear();
                self.overflow = false;
                line
            }
            _ => {
                if self.buffer.push(byte).is_err() {
                    self.overflow = true;
                }
                None
            }
        }
    }

    /// Feed a packet; `on_line` runs for every completed line
    pub fn feed_all(&mut self, data: &[u8], mut on_line: impl FnMut(Line)) {
        for &byte in data {
            if let Some(line) = self.feed(byte) {
                on_line(line);
            }
        }
    }

    fn take_line(&self) -> Option<Line> {
        if self.overflow {
            warn!("dropping overlong command line");
            return None;
        }
        if self.buffer.is_empty() {
            return None;
        }
        let text = core::str::from_utf8(&self.buffer).ok()?;
        let mut line = Line::new();
        line.push_str(text).ok()?;
        Some(line)
    }

    /// Clear the buffer
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.overflow = false;
    }
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Upper-case copy of a trimmed line; `None` if it does not fit the buffer
#[must_use]
pub fn normalize(line: &str) -> Option<Line> {
    let mut upper = Line::new();
    upper.push_str(line.trim()).ok()?;
    upper.make_ascii_uppercase();
    Some(upper)
}

/// Command verb
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verb {
    /// `*IDN?`
    Identify,
    /// `*TRG`
    Trigger,
    /// `SET <ATTR> <VALUE>`
    Set,
    /// `SET? [<ATTR>]`
    Query,
    /// `STAT?`
    Status,
    /// `HELP`
    Help,
    /// Anything else
    Unknown,
}

impl Verb {
    fn from_token(token: &str) -> Self {
        match token {
            "*IDN?" => Self::Identify,
            "*TRG" => Self::Trigger,
            "SET" => Self::Set,
            "SET?" => Self::Query,
            "STAT?" => Self::Status,
            "HELP" => Self::Help,
            _ => Self::Unknown,
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Verb {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Identify => defmt::write!(f, "*IDN?"),
            Self::Trigger => defmt::write!(f, "*TRG"),
            Self::Set => defmt::write!(f, "SET"),
            Self::Query => defmt::write!(f, "SET?"),
            Self::Status => defmt::write!(f, "STAT?"),
            Self::Help => defmt::write!(f, "HELP"),
            Self::Unknown => defmt::write!(f, "?"),
        }
    }
}

/// One tokenized host line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommandRequest<'a> {
    /// Command verb
    pub verb: Verb,
    /// Attribute token
    pub name: Option<&'a str>,
    /// Value token
    pub value: Option<&'a str>,
    /// More tokens followed the value
    pub trailing: bool,
}

impl<'a> CommandRequest<'a> {
    /// Split a normalized line; `None` for a blank line
    #[must_use]
    pub fn parse(line: &'a str) -> Option<Self> {
        let mut tokens = line.split_ascii_whitespace();
        let verb = Verb::from_token(tokens.next()?);
        let name = tokens.next();
        let value = tokens.next();
        let trailing = tokens.next().is_some();
        Some(Self {
            verb,
            name,
            value,
            trailing,
        })
    }
}
