//! Command Dispatcher
//!
//! Executes one host line at a time against the settings registry and the
//! instrument bus. Each command runs to completion, bus writes included,
//! before the next line is read; there is no overlapping execution.
//!
//! Setting a selector follows a fixed sequence: write the control bits,
//! wait (bounded) for INHIBIT to clear, then pulse EXE so the meter latches
//! them. The registry is updated only after that sequence succeeded; on
//! failure the control word is restored and the previous value stays
//! committed.

use embedded_hal::delay::DelayNs;

use crate::bus::{fields, DirectPins, InstrumentBus, PortExpander, Resource};
use crate::config::{DispatcherConfig, Verbosity, HELP, IDN};
use crate::decoder::{InstrumentStatus, MeasurementDecoder};
use crate::error::{Error, Result};
use crate::protocol::{self, CommandRequest, Verb};
use crate::ranges::{self, RangeEntry};
use crate::response::{self, Response, ResponseLine};
use crate::settings::{SettingChange, Settings};
use crate::types::{Attribute, Function, MeasurementRegime, Range};

/// Order of the two writes of a function change
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteOrder {
    /// Range to the new Auto slot, then function
    RangeFirst,
    /// Function, then range
    FunctionFirst,
}

/// Choose the write order of a function change
///
/// Between the two writes the meter sees one mixed `(function, range)`
/// pair. Prefer the order whose intermediate pair is an Auto slot, then one
/// whose intermediate pair is at least a defined range.
#[must_use]
pub fn function_change_order(from: Function, from_range: Range, to: Function) -> WriteOrder {
    let to_auto = Range::auto(to);
    if ranges::lookup(from, to_auto.index()) == RangeEntry::Auto {
        return WriteOrder::RangeFirst;
    }
    match ranges::lookup(to, from_range.index()) {
        RangeEntry::Fixed(_) | RangeEntry::Auto => WriteOrder::FunctionFirst,
        RangeEntry::Undefined => WriteOrder::RangeFirst,
    }
}

/// Both halves of the range code share U3 and go out in one word
fn write_range<X: PortExpander, P: DirectPins>(
    bus: &mut InstrumentBus<X, P>,
    range: Range,
) -> Result<()> {
    let code = range.code();
    let word = bus.read_word(Resource::U3)?;
    let word = fields::DRN_LO_R.insert(word, code & 0b11);
    bus.write_word(Resource::U3, fields::DRN_HI_R.insert(word, code >> 2))
}

/// Host command dispatcher, owner of the bus and the settings registry
pub struct Dispatcher<X, P, D> {
    bus: InstrumentBus<X, P>,
    decoder: MeasurementDecoder,
    settings: Settings,
    delay: D,
    config: DispatcherConfig,
}

impl<X: PortExpander, P: DirectPins, D: DelayNs> Dispatcher<X, P, D> {
    /// Create a dispatcher with power-up settings; call [`Self::init`] before use
    pub fn new(bus: InstrumentBus<X, P>, delay: D, config: DispatcherConfig) -> Self {
        Self {
            bus,
            decoder: MeasurementDecoder::new(config.trigger_timeout_us, config.poll_interval_us),
            settings: Settings::new(),
            delay,
            config,
        }
    }

    /// Idle the control bus and drive the power-up settings onto it
    pub fn init(&mut self) -> Result<()> {
        self.bus.init()?;
        let settings = self.settings;
        self.strobed(|bus| {
            bus.write_field(fields::FNC_R, settings.function().code())?;
            write_range(bus, settings.range())?;
            bus.write_field(fields::CM_R, settings.mode().code())?;
            bus.write_field(fields::TL_R_N, settings.level().code())?;
            bus.write_field(fields::FREQ1K_R, settings.frequency().code())
        })?;
        self.bus.write_field(fields::REM_N, settings.remote().code())?;
        info!("instrument bus initialized");
        Ok(())
    }

    /// Current registry
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Active configuration
    pub const fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Change the success echo
    pub fn set_verbosity(&mut self, verbosity: Verbosity) {
        self.config.verbosity = verbosity;
    }

    /// Execute one host line
    ///
    /// Never fails: errors become `ERROR ...` responses and the registry
    /// keeps its last committed values.
    pub fn execute(&mut self, line: &str) -> Response {
        let Some(upper) = protocol::normalize(line) else {
            return Response::error(&Error::UnknownCommand);
        };
        let Some(request) = CommandRequest::parse(&upper) else {
            return Response::Silent;
        };
        debug!("host: {}", upper.as_str());

        let result = match request.verb {
            Verb::Identify => Ok(Response::Text(IDN)),
            Verb::Help => Ok(Response::Text(HELP)),
            Verb::Trigger => self.trigger().map(Response::Line),
            Verb::Set => self.set(&request),
            Verb::Query => self.query(&request),
            Verb::Status => {
                InstrumentStatus::read(&mut self.bus).map(|s| Response::Line(response::status(&s)))
            }
            Verb::Unknown => Err(Error::UnknownCommand),
        };
        result.unwrap_or_else(|err| {
            warn!("command rejected: {}", err);
            Response::error(&err)
        })
    }

    /// Report a measurement if one is arriving in continuous regime
    ///
    /// Called by the main loop between host lines. Silent in any other
    /// regime, including after `MEAS ABORT`.
    pub fn poll(&mut self) -> Response {
        if self.settings.regime() != MeasurementRegime::Continuous {
            return Response::Silent;
        }
        let outcome = match self.decoder.data_ready(&mut self.bus) {
            Ok(true) => self
                .decoder
                .acquire(&mut self.bus, &mut self.delay)
                .map(|m| Some(response::measurement(&m))),
            Ok(false) => Ok(None),
            Err(err) => Err(err),
        };
        match outcome {
            Ok(Some(line)) => Response::Line(line),
            Ok(None) => Response::Silent,
            Err(err) => Response::error(&err),
        }
    }

    /// Give the bus and delay back
    pub fn release(self) -> (InstrumentBus<X, P>, D) {
        (self.bus, self.delay)
    }

    fn trigger(&mut self) -> Result<ResponseLine> {
        if !self.settings.remote_enabled() {
            return Err(Error::NotRemote);
        }
        if self.settings.regime() != MeasurementRegime::Single {
            return Err(Error::WrongRegime);
        }
        self.wait_not_inhibited()?;
        self.strobe()?;
        // EXE started a fresh measurement, its first FLAG is digit 0
        self.decoder.arm();
        let measurement = self.decoder.acquire(&mut self.bus, &mut self.delay)?;
        Ok(response::measurement(&measurement))
    }

    fn set(&mut self, request: &CommandRequest<'_>) -> Result<Response> {
        let name = request.name.ok_or_else(|| Error::invalid_attribute(""))?;
        let attr = Attribute::from_token(name).ok_or_else(|| Error::invalid_attribute(name))?;
        let value = request.value.ok_or(Error::InvalidValue(attr))?;
        if request.trailing {
            return Err(Error::InvalidValue(attr));
        }

        let change = self.settings.validate(attr, value)?;
        self.apply(change)?;
        self.settings.commit(change);
        info!("{} = {}", attr, value);

        Ok(match self.config.verbosity {
            Verbosity::Echo => Response::ok(),
            Verbosity::Quiet => Response::Silent,
        })
    }

    fn query(&self, request: &CommandRequest<'_>) -> Result<Response> {
        match request.name {
            None => Ok(Response::Line(response::all_settings(&self.settings))),
            Some(name) => {
                let attr =
                    Attribute::from_token(name).ok_or_else(|| Error::invalid_attribute(name))?;
                Ok(Response::Line(response::setting(&self.settings, attr)))
            }
        }
    }

    /// Drive a validated change onto the bus
    fn apply(&mut self, change: SettingChange) -> Result<()> {
        match change {
            SettingChange::Function(function) => {
                let (from, from_range) = (self.settings.function(), self.settings.range());
                let auto = Range::auto(function);
                self.strobed(|bus| match function_change_order(from, from_range, function) {
                    WriteOrder::RangeFirst => {
                        write_range(bus, auto)?;
                        bus.write_field(fields::FNC_R, function.code())
                    }
                    WriteOrder::FunctionFirst => {
                        bus.write_field(fields::FNC_R, function.code())?;
                        write_range(bus, auto)
                    }
                })
            }
            SettingChange::Mode(mode) => {
                self.strobed(|bus| bus.write_field(fields::CM_R, mode.code()))
            }
            SettingChange::Frequency(frequency) => {
                self.strobed(|bus| bus.write_field(fields::FREQ1K_R, frequency.code()))
            }
            SettingChange::Range(range) => self.strobed(|bus| write_range(bus, range)),
            SettingChange::Level(level) => {
                self.strobed(|bus| bus.write_field(fields::TL_R_N, level.code()))
            }
            // REM is a level line, the meter follows it without a strobe
            SettingChange::Remote(remote) => self.bus.write_field(fields::REM_N, remote.code()),
            // Adapter-side only: gates *TRG and unsolicited output
            SettingChange::Regime(_) => Ok(()),
        }
    }

    /// Write selectors, then latch them with EXE; restore the control word on failure
    fn strobed<F>(&mut self, write: F) -> Result<()>
    where
        F: FnOnce(&mut InstrumentBus<X, P>) -> Result<()>,
    {
        let saved = self.bus.read_word(Resource::U3)?;
        let outcome = write(&mut self.bus)
            .and_then(|()| self.wait_not_inhibited())
            .and_then(|()| self.strobe());
        if let Err(err) = outcome {
            let restore = fields::EXE_N.insert(saved, 1);
            if self.bus.write_word(Resource::U3, restore).is_err() {
                error!("could not restore control word after {}", err);
            }
            return Err(err);
        }
        Ok(())
    }

    /// Bounded wait for the meter to release INHIBIT
    fn wait_not_inhibited(&mut self) -> Result<()> {
        let retries = self.config.inhibit_retries;
        for attempt in 0..=retries {
            if self.bus.read_field(fields::INHIBIT_N)? != 0 {
                return Ok(());
            }
            if attempt < retries {
                self.delay.delay_us(self.config.inhibit_retry_delay_us);
            }
        }
        warn!("INHIBIT still asserted after {} retries", retries);
        Err(Error::InhibitTimeout)
    }

    /// One active-low EXE pulse
    fn strobe(&mut self) -> Result<()> {
        self.bus.write_field(fields::EXE_N, 0)?;
        self.delay.delay_us(self.config.exe_pulse_us);
        self.bus.write_field(fields::EXE_N, 1)?;
        trace!("EXE strobed");
        Ok(())
    }
}
