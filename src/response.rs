//! Response Formatter
//!
//! Renders measurements, settings and errors into protocol lines. Lines are
//! built in fixed-capacity buffers; the line terminator is added by the
//! transport.

use core::fmt::Write;

use heapless::String;

use crate::config::{D_DECIMALS, MAX_RESPONSE_LEN};
use crate::decoder::{InstrumentStatus, Measurement};
use crate::error::Error;
use crate::ranges::{write_fixed_point, RangeEntry};
use crate::settings::Settings;
use crate::types::Attribute;

/// Literal for a group the meter flagged or that failed to decode
pub const OUT_OF_RANGE: &str = "OUT OF RANGE";

/// Literal for a reading that cannot be scaled
pub const UNDEFINED: &str = "UNDEFINED";

/// One response line
pub type ResponseLine = String<MAX_RESPONSE_LEN>;

/// What a command sends back to the host
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Response {
    /// Nothing
    Silent,
    /// A formatted line
    Line(ResponseLine),
    /// Fixed text, possibly several lines
    Text(&'static str),
}

impl Response {
    /// `OK`
    #[must_use]
    pub fn ok() -> Self {
        Self::Text("OK")
    }

    /// `ERROR <kind> [<attribute>]`
    #[must_use]
    pub fn error(err: &Error) -> Self {
        let mut line = ResponseLine::new();
        let _ = write!(line, "ERROR {err}");
        // a bare `SET` has no attribute token to report
        while line.ends_with(' ') {
            line.pop();
        }
        Self::Line(line)
    }

    /// Text to send, if any
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Silent => None,
            Self::Line(line) => Some(line.as_str()),
            Self::Text(text) => Some(text),
        }
    }

    /// Whether this is an error reply
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.as_str().is_some_and(|s| s.starts_with("ERROR"))
    }
}

/// `LCR <value> <unit>[, D <d.ddd>]`
#[must_use]
pub fn measurement(m: &Measurement) -> ResponseLine {
    let mut line = ResponseLine::new();
    let _ = line.push_str("LCR ");
    if m.primary_out_of_range() {
        let _ = line.push_str(OUT_OF_RANGE);
    } else {
        match m.range() {
            RangeEntry::Fixed(range) => {
                let _ = write_fixed_point(&mut line, m.primary().digits(), range.decimals);
                let _ = write!(line, " {}", range.unit.symbol());
            }
            RangeEntry::Auto | RangeEntry::Undefined => {
                let _ = line.push_str(UNDEFINED);
            }
        }
    }
    if !m.secondary_blanked() {
        let _ = line.push_str(", D ");
        if m.secondary_out_of_range() {
            let _ = line.push_str(OUT_OF_RANGE);
        } else {
            let _ = write_fixed_point(&mut line, m.secondary().digits(), D_DECIMALS);
        }
    }
    line
}

/// What the meter reports it is doing (`STAT?`)
///
/// `FUNCTION/MODE: <f> <mode>, MEAS. FREQUENCY: <hz>, MEAS. RANGE: <range>`,
/// the range given as its full-scale label.
#[must_use]
pub fn status(status: &InstrumentStatus) -> ResponseLine {
    let mut line = ResponseLine::new();
    let _ = write!(
        line,
        "FUNCTION/MODE: {} {}, MEAS. FREQUENCY: {}, MEAS. RANGE: {}",
        status.function,
        status.mode,
        status.frequency,
        status.range()
    );
    line
}

/// Value of one attribute (`SET? <ATTR>`)
#[must_use]
pub fn setting(settings: &Settings, attr: Attribute) -> ResponseLine {
    let mut line = ResponseLine::new();
    let _ = settings.write_value(&mut line, attr);
    line
}

/// Every attribute in fixed order (`SET?`)
#[must_use]
pub fn all_settings(settings: &Settings) -> ResponseLine {
    let mut line = ResponseLine::new();
    for (i, attr) in Attribute::ALL.into_iter().enumerate() {
        if i > 0 {
            let _ = line.push(',');
        }
        let _ = write!(line, "{attr} ");
        let _ = settings.write_value(&mut line, attr);
    }
    line
}
