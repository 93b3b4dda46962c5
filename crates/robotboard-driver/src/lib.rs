#![cfg_attr(not(test), no_std)]
#![doc = "A `no_std` board-support driver for a two-motor robotics carrier board."]
#![doc = ""]
#![doc = "This crate drives the board's two H-bridge motor channels (with a speed-dependent"]
#![doc = "PWM period), reads its four line sensors and ranges with its ultrasonic sensor."]
#![doc = "All hardware access goes through the [`Platform`] trait."]

pub mod error;
pub mod line_sensor;
pub mod motor;
pub mod pins;
pub mod platform;
pub mod pwm;
pub mod sonar;

#[cfg(test)]
mod mock;

pub use error::BoardError;
pub use line_sensor::{LINE_D_THRESHOLD, LineSensor};
pub use motor::{Direction, MotorChannel, Speed};
pub use pins::{Level, Pin, Pull};
pub use platform::Platform;
pub use pwm::PwmPeriod;
pub use sonar::{TimeoutPolicy, echo_to_cm};

/// Result type returned by board operations on platform `P`.
pub type BoardResult<T, P> = Result<T, BoardError<<P as Platform>::Error>>;

/// Driver for the carrier board.
///
/// The board holds no state of its own beyond the platform handle and the ultrasonic
/// timeout policy. Pin bindings are fixed constants in [`pins`]. Operations are synchronous
/// and expect exclusive access to the platform for their whole duration; wrap the board in
/// a mutex if several threads need it.
#[derive(Debug)]
pub struct Board<P: Platform> {
    platform: P,
    timeout_policy: TimeoutPolicy,
}

impl<P: Platform> Board<P> {
    /// Construct a board on top of `platform`, failing ultrasonic reads that time out.
    pub fn new(platform: P) -> Self {
        Self::with_timeout_policy(platform, TimeoutPolicy::default())
    }

    /// Construct a board with an explicit ultrasonic timeout policy.
    pub fn with_timeout_policy(platform: P, timeout_policy: TimeoutPolicy) -> Self {
        Board {
            platform,
            timeout_policy,
        }
    }

    /// Returns the ultrasonic timeout policy.
    pub fn timeout_policy(&self) -> TimeoutPolicy {
        self.timeout_policy
    }

    /// Change the ultrasonic timeout policy.
    pub fn set_timeout_policy(&mut self, policy: TimeoutPolicy) {
        self.timeout_policy = policy;
    }

    /// Shared access to the underlying platform.
    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Exclusive access to the underlying platform.
    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    /// Consume the board and hand the platform back.
    pub fn release(self) -> P {
        self.platform
    }
}
