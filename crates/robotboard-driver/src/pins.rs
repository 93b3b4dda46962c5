//! Pin identifiers and the fixed wiring of the carrier board.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Edge-connector pins used by the carrier board.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Pin {
    /// Line sensor A.
    P0 = 0,
    /// Line sensor B.
    P1 = 1,
    /// Line sensor C.
    P2 = 2,
    /// Line sensor D (analog).
    P3 = 3,
    /// Ultrasonic trigger.
    P8 = 8,
    /// Ultrasonic echo.
    P9 = 9,
    /// Motor 1 primary.
    P13 = 13,
    /// Motor 1 secondary.
    P14 = 14,
    /// Motor 2 primary.
    P15 = 15,
    /// Motor 2 secondary.
    P16 = 16,
}

impl Pin {
    /// Numeric edge-connector index of the pin.
    pub const fn index(self) -> u8 {
        self as u8
    }
}

impl core::fmt::Display for Pin {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "P{}", self.index())
    }
}

/// Digital logic level.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

/// Input pull configuration.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pull {
    Up,
    Down,
    None,
}

pub const MOTOR1_PRIMARY: Pin = Pin::P13;
pub const MOTOR1_SECONDARY: Pin = Pin::P14;
pub const MOTOR2_PRIMARY: Pin = Pin::P15;
pub const MOTOR2_SECONDARY: Pin = Pin::P16;

/// All four PWM-capable motor outputs. Period changes always hit every one of them.
pub const MOTOR_PINS: [Pin; 4] = [MOTOR1_PRIMARY, MOTOR1_SECONDARY, MOTOR2_PRIMARY, MOTOR2_SECONDARY];

pub const LINE_A: Pin = Pin::P0;
pub const LINE_B: Pin = Pin::P1;
pub const LINE_C: Pin = Pin::P2;
pub const LINE_D: Pin = Pin::P3;

pub const SONAR_TRIGGER: Pin = Pin::P8;
pub const SONAR_ECHO: Pin = Pin::P9;
