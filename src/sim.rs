//! Simulated carrier board.
//!
//! `BoardState` is the register file every platform call reads and writes, plus a tiny
//! world model: an obstacle in front of the robot and what each line sensor sees. It is a
//! single process-wide resource behind a `parking_lot::Mutex`.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use spin_sleep::SpinSleeper;
use tracing::trace;

use robotboard_driver::pins::{
    MOTOR1_PRIMARY, MOTOR1_SECONDARY, MOTOR2_PRIMARY, MOTOR2_SECONDARY, SONAR_TRIGGER,
};
use robotboard_driver::sonar::MAX_RANGE_CM;
use robotboard_driver::{Board, LineSensor, Level, Pin, Platform, Pull, Speed};

use crate::config::WorldSettings;

const PIN_SLOTS: usize = 17;
const ANALOG_MAX: u16 = 1023;

/// Register-level state of one pin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinState {
    pub period_us: u32,
    pub duty: u16,
    pub output: Level,
    pub input: Level,
    pub pull: Pull,
    pub analog: u16,
}

impl Default for PinState {
    fn default() -> Self {
        PinState {
            period_us: 20_000,
            duty: 0,
            output: Level::Low,
            input: Level::High,
            pull: Pull::None,
            analog: ANALOG_MAX,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BoardState {
    pins: [PinState; PIN_SLOTS],
    /// Set by a low-to-high edge on the trigger, consumed by the next echo measurement.
    echo_armed: bool,
    obstacle_cm: f64,
    cm_per_s_at_full_duty: f64,
}

pub type SharedBoardState = Arc<Mutex<BoardState>>;

impl BoardState {
    pub fn new(world: &WorldSettings) -> Self {
        let mut state = BoardState {
            pins: [PinState::default(); PIN_SLOTS],
            echo_armed: false,
            obstacle_cm: world.obstacle_cm,
            cm_per_s_at_full_duty: world.cm_per_s_at_full_duty,
        };
        state.set_line(LineSensor::A, world.line_a);
        state.set_line(LineSensor::B, world.line_b);
        state.set_line(LineSensor::C, world.line_c);
        state.pin_mut(LineSensor::D.pin()).analog = world.line_d_raw.min(ANALOG_MAX);
        state
    }

    pub fn shared(world: &WorldSettings) -> SharedBoardState {
        Arc::new(Mutex::new(Self::new(world)))
    }

    pub fn pin(&self, pin: Pin) -> &PinState {
        &self.pins[usize::from(pin.index())]
    }

    fn pin_mut(&mut self, pin: Pin) -> &mut PinState {
        &mut self.pins[usize::from(pin.index())]
    }

    /// Drive an output. A rising edge on the ultrasonic trigger arms one echo.
    fn write_output(&mut self, pin: Pin, level: Level) {
        let previous = self.pin(pin).output;
        if pin == SONAR_TRIGGER && previous == Level::Low && level == Level::High {
            self.echo_armed = true;
        }
        self.pin_mut(pin).output = level;
    }

    /// Echo for the measurement in progress. Without a fresh trigger pulse there is none.
    fn take_echo_us(&mut self) -> Option<u32> {
        if !std::mem::take(&mut self.echo_armed) {
            return None;
        }
        self.echo_us()
    }

    /// Put a digital line sensor over (`true`) or off the line. Sensor D takes an analog
    /// value instead: over the line reads dark (0), off the line reads bright.
    pub fn set_line(&mut self, sensor: LineSensor, on_line: bool) {
        let pin = self.pin_mut(sensor.pin());
        match sensor {
            LineSensor::D => pin.analog = if on_line { 0 } else { ANALOG_MAX },
            _ => pin.input = if on_line { Level::Low } else { Level::High },
        }
    }

    pub fn obstacle_cm(&self) -> f64 {
        self.obstacle_cm
    }

    pub fn set_obstacle_cm(&mut self, cm: f64) {
        self.obstacle_cm = cm.max(0.0);
    }

    /// Net forward drive in `-1.0..=1.0`, averaged over both motors.
    pub fn forward_effort(&self) -> f64 {
        let duty = |pin: Pin| f64::from(self.pin(pin).duty);
        // Channel two is wired the other way round.
        let m1 = duty(MOTOR1_PRIMARY) - duty(MOTOR1_SECONDARY);
        let m2 = duty(MOTOR2_SECONDARY) - duty(MOTOR2_PRIMARY);
        (m1 + m2) / 2.0 / f64::from(Speed::MAX.get())
    }

    /// Move the robot for `dt` seconds at the current motor drive.
    pub fn advance(&mut self, dt: Duration) {
        let travelled = self.forward_effort() * self.cm_per_s_at_full_duty * dt.as_secs_f64();
        self.set_obstacle_cm(self.obstacle_cm - travelled);
    }

    /// Echo width the sensor would produce for the current obstacle, or `None` when the
    /// obstacle is out of range.
    pub fn echo_us(&self) -> Option<u32> {
        if self.obstacle_cm <= 0.0 || self.obstacle_cm > f64::from(MAX_RANGE_CM) {
            return None;
        }
        // Inverse of the driver's duration * 153 / 29 / 2 / 100 conversion.
        Some((self.obstacle_cm * 100.0 * 2.0 * 29.0 / 153.0).round() as u32)
    }
}

/// Errors the simulated pin layer reports.
#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    /// Duty value above the 10-bit PWM range.
    DutyOutOfRange(Pin, u16),
    /// PWM operation on a pin with no PWM channel.
    NotPwmCapable(Pin),
    /// Analog read on a pin with no ADC channel.
    NotAnalogCapable(Pin),
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::DutyOutOfRange(pin, duty) => write!(f, "Duty {} out of range on {}", duty, pin),
            SimError::NotPwmCapable(pin) => write!(f, "{} has no PWM output", pin),
            SimError::NotAnalogCapable(pin) => write!(f, "{} has no analog input", pin),
        }
    }
}

impl std::error::Error for SimError {}

fn is_pwm_capable(pin: Pin) -> bool {
    matches!(pin, Pin::P13 | Pin::P14 | Pin::P15 | Pin::P16)
}

fn is_analog_capable(pin: Pin) -> bool {
    matches!(pin, Pin::P0 | Pin::P1 | Pin::P2 | Pin::P3)
}

/// The driver on the simulated board, shared by the bench tasks. Holding the lock gives a
/// caller the board for the whole of one operation.
pub type SharedBoard = Arc<Mutex<Board<SimPlatform>>>;

/// [`Platform`] over the shared simulated register file.
#[derive(Clone)]
pub struct SimPlatform {
    state: SharedBoardState,
    sleeper: SpinSleeper,
}

impl SimPlatform {
    pub fn new(state: SharedBoardState) -> Self {
        SimPlatform {
            state,
            sleeper: SpinSleeper::new(100_000),
        }
    }
}

impl fmt::Debug for SimPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimPlatform").finish_non_exhaustive()
    }
}

impl Platform for SimPlatform {
    type Error = SimError;

    fn set_analog_period(&mut self, pin: Pin, period_us: u32) -> Result<(), SimError> {
        if !is_pwm_capable(pin) {
            return Err(SimError::NotPwmCapable(pin));
        }
        self.state.lock().pin_mut(pin).period_us = period_us;
        Ok(())
    }

    fn analog_write(&mut self, pin: Pin, duty: u16) -> Result<(), SimError> {
        if !is_pwm_capable(pin) {
            return Err(SimError::NotPwmCapable(pin));
        }
        if duty > ANALOG_MAX {
            return Err(SimError::DutyOutOfRange(pin, duty));
        }
        self.state.lock().pin_mut(pin).duty = duty;
        trace!(%pin, duty, "sim analog write");
        Ok(())
    }

    fn analog_read(&mut self, pin: Pin) -> Result<u16, SimError> {
        if !is_analog_capable(pin) {
            return Err(SimError::NotAnalogCapable(pin));
        }
        Ok(self.state.lock().pin(pin).analog)
    }

    fn digital_write(&mut self, pin: Pin, level: Level) -> Result<(), SimError> {
        self.state.lock().write_output(pin, level);
        Ok(())
    }

    fn digital_read(&mut self, pin: Pin) -> Result<Level, SimError> {
        Ok(self.state.lock().pin(pin).input)
    }

    fn set_pull(&mut self, pin: Pin, pull: Pull) -> Result<(), SimError> {
        self.state.lock().pin_mut(pin).pull = pull;
        Ok(())
    }

    fn delay_us(&mut self, us: u32) {
        self.sleeper.sleep(Duration::from_micros(u64::from(us)));
    }

    fn pulse_in(&mut self, pin: Pin, level: Level, timeout_us: u32) -> Result<u32, SimError> {
        let echo = if level == Level::High { self.state.lock().take_echo_us() } else { None };
        match echo {
            Some(us) if us <= timeout_us => {
                self.sleeper.sleep(Duration::from_micros(u64::from(us)));
                trace!(%pin, us, "sim echo");
                Ok(us)
            }
            _ => {
                self.sleeper.sleep(Duration::from_micros(u64::from(timeout_us)));
                Ok(0)
            }
        }
    }

    fn pause_ms(&mut self, ms: u32) {
        self.sleeper.sleep(Duration::from_millis(u64::from(ms)));
    }
}
