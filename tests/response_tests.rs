//! Response Formatter Tests
//!
//! Run with: cargo test --target x86_64-unknown-linux-gnu --no-default-features --features std --test response_tests

use hp4261a_usb::decoder::{DigitGroup, InstrumentStatus, Measurement};
use hp4261a_usb::error::Error;
use hp4261a_usb::response::{self, Response, OUT_OF_RANGE, UNDEFINED};
use hp4261a_usb::settings::{SettingChange, Settings};
use hp4261a_usb::types::{Attribute, CircuitMode, Function, Remote, TestFrequency};

fn status(function: Function, range_index: u8) -> InstrumentStatus {
    InstrumentStatus {
        function,
        mode: CircuitMode::Parallel,
        frequency: TestFrequency::Hz1000,
        range_index,
        over_range: false,
        d_blanked: false,
    }
}

fn reading(status: InstrumentStatus, primary: [u8; 4], d: [u8; 4]) -> String {
    let m = Measurement::new(
        status,
        DigitGroup::from_nibbles(primary),
        DigitGroup::from_nibbles(d),
    );
    response::measurement(&m).to_string()
}

// =============================================================================
// Meter status
// =============================================================================

#[test]
fn test_status_line_uses_range_label() {
    let line = response::status(&status(Function::Resistance, 2));
    assert!(line.starts_with("FUNCTION/MODE: R PAR, MEAS. FREQUENCY: 1000, MEAS. RANGE: "));
    let label = status(Function::Resistance, 2).range().to_string();
    assert!(line.ends_with(&format!("MEAS. RANGE: {label}")));
}

#[test]
fn test_status_line_undefined_function() {
    let line = response::status(&status(Function::Undefined, 0));
    assert_eq!(
        line.as_str(),
        "FUNCTION/MODE: UNDEFINED PAR, MEAS. FREQUENCY: 1000, MEAS. RANGE: UNDEFINED"
    );
}

// =============================================================================
// Measurements
// =============================================================================

#[test]
fn test_capacitance_reading() {
    assert_eq!(
        reading(status(Function::Capacitance, 5), [0, 4, 7, 1], [0, 0, 2, 3]),
        "LCR 471 nF, D 0.023"
    );
}

#[test]
fn test_decimal_point_follows_range() {
    assert_eq!(
        reading(status(Function::Inductance, 3), [0, 4, 7, 1], [1, 0, 0, 0]),
        "LCR 4.71 mH, D 1.000"
    );
    assert_eq!(
        reading(status(Function::Resistance, 6), [1, 0, 0, 0], [0, 0, 0, 0]),
        "LCR 100.0 kOhm, D 0.000"
    );
}

#[test]
fn test_over_range_primary() {
    let mut s = status(Function::Capacitance, 5);
    s.over_range = true;
    assert_eq!(
        reading(s, [0, 4, 7, 1], [0, 0, 2, 3]),
        format!("LCR {OUT_OF_RANGE}, D 0.023")
    );
}

#[test]
fn test_non_bcd_groups() {
    assert_eq!(
        reading(status(Function::Capacitance, 5), [0, 4, 0xF, 1], [0, 0xB, 2, 3]),
        "LCR OUT OF RANGE, D OUT OF RANGE"
    );
}

#[test]
fn test_blanked_d_is_omitted() {
    let mut s = status(Function::Capacitance, 5);
    s.d_blanked = true;
    assert_eq!(reading(s, [0, 4, 7, 1], [0, 0, 0, 0]), "LCR 471 nF");
}

#[test]
fn test_unscalable_reading_is_undefined() {
    for s in [
        status(Function::Capacitance, 10),
        status(Function::Capacitance, 0),
        status(Function::Undefined, 3),
        status(Function::Resistance, 12),
    ] {
        assert_eq!(
            reading(s, [0, 4, 7, 1], [0, 0, 2, 3]),
            format!("LCR {UNDEFINED}, D 0.023")
        );
    }
}

#[test]
fn test_missing_groups() {
    let m = Measurement::new(
        status(Function::Capacitance, 5),
        DigitGroup::invalid(),
        DigitGroup::invalid(),
    );
    assert_eq!(
        response::measurement(&m).as_str(),
        "LCR OUT OF RANGE, D OUT OF RANGE"
    );
}

// =============================================================================
// Settings
// =============================================================================

#[test]
fn test_single_setting() {
    let s = Settings::new();
    assert_eq!(response::setting(&s, Attribute::Func).as_str(), "C");
    assert_eq!(response::setting(&s, Attribute::Rem).as_str(), "OFF");
}

#[test]
fn test_all_settings_in_fixed_order() {
    let mut s = Settings::new();
    s.commit(SettingChange::Function(Function::Resistance));
    s.commit(SettingChange::Remote(Remote::On));
    assert_eq!(
        response::all_settings(&s).as_str(),
        "MODE AUTO,FREQ 1000,FUNC R,RNG 9,LEV 1000,REM ON,MEAS CONT"
    );
}

// =============================================================================
// Response
// =============================================================================

#[test]
fn test_error_lines() {
    assert_eq!(
        Response::error(&Error::InvalidValue(Attribute::Rng)).as_str(),
        Some("ERROR InvalidValue RNG")
    );
    assert_eq!(
        Response::error(&Error::invalid_attribute("XYZ")).as_str(),
        Some("ERROR InvalidAttribute XYZ")
    );
    assert_eq!(
        Response::error(&Error::invalid_attribute("")).as_str(),
        Some("ERROR InvalidAttribute")
    );
    assert_eq!(
        Response::error(&Error::InhibitTimeout).as_str(),
        Some("ERROR InhibitTimeout")
    );
    assert!(Response::error(&Error::NotRemote).is_error());
}

#[test]
fn test_ok_and_silent() {
    assert_eq!(Response::ok().as_str(), Some("OK"));
    assert!(!Response::ok().is_error());
    assert_eq!(Response::Silent.as_str(), None);
    assert!(!Response::Silent.is_error());
}

#[test]
fn test_error_classification() {
    assert!(Error::UnknownCommand.is_validation());
    assert!(Error::NotRemote.is_validation());
    assert!(!Error::BusTransportFailure.is_validation());
    assert!(!Error::InhibitTimeout.is_validation());
}
