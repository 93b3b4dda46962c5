//! Dual H-bridge motor drive.
//!
//! Each motor channel is driven by a complementary pair of PWM outputs: one carries the
//! duty value and the other is held at zero. Which output carries the duty for a given
//! direction differs between the two channels because of how the board is wired, see
//! [`MotorChannel::duties`].

use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::pins::{MOTOR_PINS, MOTOR1_PRIMARY, MOTOR1_SECONDARY, MOTOR2_PRIMARY, MOTOR2_SECONDARY, Pin};
use crate::platform::Platform;
use crate::{Board, BoardError, BoardResult};

/// Motor channel on the carrier board.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotorChannel {
    /// Motor 1, outputs P13/P14.
    One,
    /// Motor 2, outputs P15/P16.
    Two,
}

impl MotorChannel {
    /// The channel's `(primary, secondary)` output pins.
    pub const fn pins(self) -> (Pin, Pin) {
        match self {
            MotorChannel::One => (MOTOR1_PRIMARY, MOTOR1_SECONDARY),
            MotorChannel::Two => (MOTOR2_PRIMARY, MOTOR2_SECONDARY),
        }
    }

    /// The `(primary, secondary)` duty values for driving this channel.
    ///
    /// Channel two is wired the other way round from channel one, so its forward drive
    /// puts the duty on the secondary output.
    pub const fn duties(self, direction: Direction, speed: Speed) -> (u16, u16) {
        let duty = speed.get();
        match (self, direction) {
            (MotorChannel::One, Direction::Forward) => (duty, 0),
            (MotorChannel::One, Direction::Reverse) => (0, duty),
            (MotorChannel::Two, Direction::Forward) => (0, duty),
            (MotorChannel::Two, Direction::Reverse) => (duty, 0),
        }
    }

    /// Legacy block number of the channel (1 or 2).
    pub const fn number(self) -> u8 {
        match self {
            MotorChannel::One => 1,
            MotorChannel::Two => 2,
        }
    }
}

impl TryFrom<u8> for MotorChannel {
    type Error = &'static str;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(MotorChannel::One),
            2 => Ok(MotorChannel::Two),
            _ => Err("motor channel must be 1 or 2"),
        }
    }
}

/// Rotation direction.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Reverse,
}

impl TryFrom<u8> for Direction {
    type Error = &'static str;

    /// Legacy block codes: `0x01` forward, `0x02` reverse.
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(Direction::Forward),
            0x02 => Ok(Direction::Reverse),
            _ => Err("direction must be 0x01 (forward) or 0x02 (reverse)"),
        }
    }
}

/// Duty-cycle magnitude in `0..=1023`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "i32", into = "u16"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Speed(u16);

impl Speed {
    /// Stopped.
    pub const ZERO: Speed = Speed(0);
    /// Full duty.
    pub const MAX: Speed = Speed(1023);

    /// Construct a speed, rejecting values above [`Speed::MAX`].
    pub const fn new(value: u16) -> Result<Self, &'static str> {
        if value > Speed::MAX.0 {
            return Err("speed must be within 0..=1023");
        }
        Ok(Speed(value))
    }

    /// Raw duty value.
    pub const fn get(self) -> u16 {
        self.0
    }
}

impl TryFrom<i32> for Speed {
    type Error = &'static str;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match u16::try_from(value) {
            Ok(v) => Speed::new(v),
            Err(_) => Err("speed must be within 0..=1023"),
        }
    }
}

impl From<Speed> for u16 {
    fn from(speed: Speed) -> u16 {
        speed.0
    }
}

impl<P: Platform> Board<P> {
    /// Drive a motor channel in `direction` at `speed`.
    ///
    /// The PWM period of all four motor outputs is retuned for `speed` first, then the
    /// channel's primary and secondary outputs are written (primary first).
    pub fn drive_motor(
        &mut self,
        channel: MotorChannel,
        direction: Direction,
        speed: Speed,
    ) -> BoardResult<(), P> {
        self.apply_pwm_period(i32::from(speed.get()))?;

        let (primary, secondary) = channel.pins();
        let (primary_duty, secondary_duty) = channel.duties(direction, speed);
        self.write_duty(primary, primary_duty)?;
        self.write_duty(secondary, secondary_duty)?;

        debug!(
            motor = channel.number(),
            ?direction,
            speed = speed.get(),
            primary_duty,
            secondary_duty,
            "motor driven"
        );
        Ok(())
    }

    /// Drive a motor from raw block values.
    ///
    /// `channel` is 1 or 2, `direction` is a legacy direction code and `speed` must lie
    /// in `0..=1023`. Anything else fails with [`BoardError::InvalidArgument`] before any
    /// pin is touched.
    pub fn drive_motor_raw(&mut self, channel: u8, direction: u8, speed: i32) -> BoardResult<(), P> {
        let channel = MotorChannel::try_from(channel).map_err(BoardError::InvalidArgument)?;
        let direction = Direction::try_from(direction).map_err(BoardError::InvalidArgument)?;
        let speed = Speed::try_from(speed).map_err(BoardError::InvalidArgument)?;
        self.drive_motor(channel, direction, speed)
    }

    /// Set both outputs of a motor channel to zero duty. The PWM period is left alone.
    pub fn stop_motor(&mut self, channel: MotorChannel) -> BoardResult<(), P> {
        let (primary, secondary) = channel.pins();
        self.write_duty(primary, 0)?;
        self.write_duty(secondary, 0)?;
        debug!(motor = channel.number(), "motor stopped");
        Ok(())
    }

    /// Set all four motor outputs to zero duty.
    pub fn stop_all_motors(&mut self) -> BoardResult<(), P> {
        for pin in MOTOR_PINS {
            self.write_duty(pin, 0)?;
        }
        debug!("all motors stopped");
        Ok(())
    }

    fn write_duty(&mut self, pin: Pin, duty: u16) -> BoardResult<(), P> {
        self.platform.analog_write(pin, duty).map_err(BoardError::Platform)
    }
}
