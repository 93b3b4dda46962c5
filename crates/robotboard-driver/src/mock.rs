//! Recording platform used by the unit tests.

use std::collections::HashMap;

use crate::pins::{Level, Pin, Pull};
use crate::platform::Platform;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    SetPeriod(Pin, u32),
    AnalogWrite(Pin, u16),
    AnalogRead(Pin),
    DigitalWrite(Pin, Level),
    DigitalRead(Pin),
    SetPull(Pin, Pull),
    DelayUs(u32),
    PulseIn(Pin, Level, u32),
    PauseMs(u32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MockError;

#[derive(Debug, Default)]
pub struct MockPlatform {
    pub calls: Vec<Call>,
    pub periods: HashMap<Pin, u32>,
    pub duties: HashMap<Pin, u16>,
    pub digital_inputs: HashMap<Pin, Level>,
    pub analog_inputs: HashMap<Pin, u16>,
    pub echo_us: u32,
    pub fail_on: Option<Pin>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn duty(&self, pin: Pin) -> Option<u16> {
        self.duties.get(&pin).copied()
    }

    pub fn period(&self, pin: Pin) -> Option<u32> {
        self.periods.get(&pin).copied()
    }

    fn check(&self, pin: Pin) -> Result<(), MockError> {
        if self.fail_on == Some(pin) {
            Err(MockError)
        } else {
            Ok(())
        }
    }
}

impl Platform for MockPlatform {
    type Error = MockError;

    fn set_analog_period(&mut self, pin: Pin, period_us: u32) -> Result<(), MockError> {
        self.check(pin)?;
        self.calls.push(Call::SetPeriod(pin, period_us));
        self.periods.insert(pin, period_us);
        Ok(())
    }

    fn analog_write(&mut self, pin: Pin, duty: u16) -> Result<(), MockError> {
        self.check(pin)?;
        self.calls.push(Call::AnalogWrite(pin, duty));
        self.duties.insert(pin, duty);
        Ok(())
    }

    fn analog_read(&mut self, pin: Pin) -> Result<u16, MockError> {
        self.check(pin)?;
        self.calls.push(Call::AnalogRead(pin));
        Ok(self.analog_inputs.get(&pin).copied().unwrap_or(0))
    }

    fn digital_write(&mut self, pin: Pin, level: Level) -> Result<(), MockError> {
        self.check(pin)?;
        self.calls.push(Call::DigitalWrite(pin, level));
        Ok(())
    }

    fn digital_read(&mut self, pin: Pin) -> Result<Level, MockError> {
        self.check(pin)?;
        self.calls.push(Call::DigitalRead(pin));
        Ok(self.digital_inputs.get(&pin).copied().unwrap_or(Level::High))
    }

    fn set_pull(&mut self, pin: Pin, pull: Pull) -> Result<(), MockError> {
        self.check(pin)?;
        self.calls.push(Call::SetPull(pin, pull));
        Ok(())
    }

    fn delay_us(&mut self, us: u32) {
        self.calls.push(Call::DelayUs(us));
    }

    fn pulse_in(&mut self, pin: Pin, level: Level, timeout_us: u32) -> Result<u32, MockError> {
        self.check(pin)?;
        self.calls.push(Call::PulseIn(pin, level, timeout_us));
        Ok(self.echo_us)
    }

    fn pause_ms(&mut self, ms: u32) {
        self.calls.push(Call::PauseMs(ms));
    }
}
