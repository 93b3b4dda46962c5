//! The pin, timing and pulse primitives the board driver needs from its host platform.

use crate::pins::{Level, Pin, Pull};

/// Host platform services for the carrier board.
///
/// Implementors wrap the microcontroller's pin and timer drivers. Every call blocks until
/// the underlying action is complete.
pub trait Platform {
    /// Error reported by the pin layer.
    type Error;

    /// Set the PWM period, in microseconds, of an analog-capable output.
    fn set_analog_period(&mut self, pin: Pin, period_us: u32) -> Result<(), Self::Error>;

    /// Write a PWM duty value (0..=1023) to an analog-capable output.
    fn analog_write(&mut self, pin: Pin, duty: u16) -> Result<(), Self::Error>;

    /// Read the raw analog value (0..=1023) of an input.
    fn analog_read(&mut self, pin: Pin) -> Result<u16, Self::Error>;

    /// Drive a digital output.
    fn digital_write(&mut self, pin: Pin, level: Level) -> Result<(), Self::Error>;

    /// Read a digital input.
    fn digital_read(&mut self, pin: Pin) -> Result<Level, Self::Error>;

    /// Configure the pull resistor of an input.
    fn set_pull(&mut self, pin: Pin, pull: Pull) -> Result<(), Self::Error>;

    /// Busy-wait for `us` microseconds.
    fn delay_us(&mut self, us: u32);

    /// Measure how long `pin` stays at `level`, in microseconds.
    ///
    /// Returns 0 if no pulse completes within `timeout_us`.
    fn pulse_in(&mut self, pin: Pin, level: Level, timeout_us: u32) -> Result<u32, Self::Error>;

    /// Block for `ms` milliseconds.
    fn pause_ms(&mut self, ms: u32);
}

impl<P: Platform + ?Sized> Platform for &mut P {
    type Error = P::Error;

    fn set_analog_period(&mut self, pin: Pin, period_us: u32) -> Result<(), Self::Error> {
        (**self).set_analog_period(pin, period_us)
    }

    fn analog_write(&mut self, pin: Pin, duty: u16) -> Result<(), Self::Error> {
        (**self).analog_write(pin, duty)
    }

    fn analog_read(&mut self, pin: Pin) -> Result<u16, Self::Error> {
        (**self).analog_read(pin)
    }

    fn digital_write(&mut self, pin: Pin, level: Level) -> Result<(), Self::Error> {
        (**self).digital_write(pin, level)
    }

    fn digital_read(&mut self, pin: Pin) -> Result<Level, Self::Error> {
        (**self).digital_read(pin)
    }

    fn set_pull(&mut self, pin: Pin, pull: Pull) -> Result<(), Self::Error> {
        (**self).set_pull(pin, pull)
    }

    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }

    fn pulse_in(&mut self, pin: Pin, level: Level, timeout_us: u32) -> Result<u32, Self::Error> {
        (**self).pulse_in(pin, level, timeout_us)
    }

    fn pause_ms(&mut self, ms: u32) {
        (**self).pause_ms(ms)
    }
}
