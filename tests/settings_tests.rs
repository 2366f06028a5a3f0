//! Settings Registry Tests
//!
//! Run with: cargo test --target x86_64-unknown-linux-gnu --no-default-features --features std --test settings_tests

use hp4261a_usb::error::Error;
use hp4261a_usb::settings::{SettingChange, Settings};
use hp4261a_usb::types::{
    Attribute, CircuitMode, Function, MeasurementRegime, Range, Remote, TestFrequency, TestLevel,
};

fn value(settings: &Settings, attr: Attribute) -> String {
    let mut out = String::new();
    settings.write_value(&mut out, attr).unwrap();
    out
}

#[test]
fn test_power_up_defaults() {
    let s = Settings::new();
    assert_eq!(s.function(), Function::Capacitance);
    assert_eq!(s.mode(), CircuitMode::Auto);
    assert_eq!(s.frequency(), TestFrequency::Hz1000);
    assert_eq!(s.range(), Range::auto(Function::Capacitance));
    assert_eq!(s.level(), TestLevel::Mv1000);
    assert_eq!(s.remote(), Remote::Off);
    assert!(!s.remote_enabled());
    assert_eq!(s.regime(), MeasurementRegime::Continuous);
}

#[test]
fn test_validate_accepts_domain_values() {
    let s = Settings::new();
    assert_eq!(
        s.validate(Attribute::Func, "L"),
        Ok(SettingChange::Function(Function::Inductance))
    );
    assert_eq!(
        s.validate(Attribute::Mode, "SER"),
        Ok(SettingChange::Mode(CircuitMode::Series))
    );
    assert_eq!(
        s.validate(Attribute::Freq, "120"),
        Ok(SettingChange::Frequency(TestFrequency::Hz120))
    );
    assert_eq!(
        s.validate(Attribute::Lev, "50"),
        Ok(SettingChange::Level(TestLevel::Mv50))
    );
    assert_eq!(
        s.validate(Attribute::Rem, "ON"),
        Ok(SettingChange::Remote(Remote::On))
    );
    assert_eq!(
        s.validate(Attribute::Meas, "ABORT"),
        Ok(SettingChange::Regime(MeasurementRegime::Abort))
    );
}

#[test]
fn test_validate_rejects_out_of_domain() {
    let s = Settings::new();
    for attr in Attribute::ALL {
        assert_eq!(s.validate(attr, "BOGUS"), Err(Error::InvalidValue(attr)));
    }
    // lower case is normalized before it gets here
    assert!(s.validate(Attribute::Func, "l").is_err());
}

#[test]
fn test_validate_does_not_modify() {
    let s = Settings::new();
    let before = s;
    let _ = s.validate(Attribute::Func, "R");
    assert_eq!(s, before);
}

#[test]
fn test_range_validated_against_function() {
    let mut s = Settings::new();
    assert!(s.validate(Attribute::Rng, "10").is_ok());
    assert!(s.validate(Attribute::Rng, "11").is_err());
    assert!(s.validate(Attribute::Rng, "0").is_err());
    s.commit(SettingChange::Function(Function::Resistance));
    assert_eq!(s.validate(Attribute::Rng, "10"), Err(Error::InvalidValue(Attribute::Rng)));
    assert_eq!(
        s.validate(Attribute::Rng, "9"),
        Ok(SettingChange::Range(Range::auto(Function::Resistance)))
    );
    assert_eq!(s.validate(Attribute::Rng, "AUTO"), Err(Error::InvalidValue(Attribute::Rng)));
}

#[test]
fn test_function_commit_resets_range() {
    let mut s = Settings::new();
    let change = s.validate(Attribute::Rng, "2").unwrap();
    s.commit(change);
    assert_eq!(s.range().index(), 2);

    s.commit(SettingChange::Function(Function::Inductance));
    assert_eq!(s.range(), Range::auto(Function::Inductance));
    assert!(s.range().is_auto(Function::Inductance));
}

#[test]
fn test_commit_touches_one_attribute() {
    let mut s = Settings::new();
    s.commit(SettingChange::Level(TestLevel::Mv50));
    let defaults = Settings::new();
    assert_eq!(s.level(), TestLevel::Mv50);
    assert_eq!(s.mode(), defaults.mode());
    assert_eq!(s.range(), defaults.range());
}

#[test]
fn test_change_names_its_attribute() {
    assert_eq!(SettingChange::Remote(Remote::On).attribute(), Attribute::Rem);
    assert_eq!(
        SettingChange::Regime(MeasurementRegime::Single).attribute(),
        Attribute::Meas
    );
    assert_eq!(
        SettingChange::Range(Range::auto(Function::Capacitance)).attribute(),
        Attribute::Rng
    );
}

#[test]
fn test_wire_values() {
    let mut s = Settings::new();
    assert_eq!(value(&s, Attribute::Rng), "10");
    assert_eq!(value(&s, Attribute::Meas), "CONT");
    s.commit(SettingChange::Regime(MeasurementRegime::Single));
    s.commit(SettingChange::Frequency(TestFrequency::Hz120));
    assert_eq!(value(&s, Attribute::Meas), "SGL");
    assert_eq!(value(&s, Attribute::Freq), "120");
}
