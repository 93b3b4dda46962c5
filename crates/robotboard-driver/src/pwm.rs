//! Speed-dependent PWM period selection.
//!
//! Low duty cycles get a longer period (lower switching frequency) so current can build up
//! further inside each cycle, which gives the small gear motors more torque at low speed.
//! The thresholds are empirical for this board.

use tracing::trace;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::pins::MOTOR_PINS;
use crate::platform::Platform;
use crate::{Board, BoardError, BoardResult};

/// Speed magnitudes below this use [`PwmPeriod::Long`].
pub const LONG_PERIOD_BELOW: u32 = 200;
/// Speed magnitudes below this (and at least [`LONG_PERIOD_BELOW`]) use [`PwmPeriod::Medium`].
pub const MEDIUM_PERIOD_BELOW: u32 = 300;

/// One of the three PWM periods used on the motor outputs.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PwmPeriod {
    /// 60 ms period, for |speed| < 200.
    Long,
    /// 40 ms period, for 200 <= |speed| < 300.
    Medium,
    /// 30 ms period, for |speed| >= 300.
    Short,
}

impl PwmPeriod {
    /// Pick the period for a requested speed. Only the magnitude matters.
    pub const fn for_speed(speed: i32) -> Self {
        let magnitude = speed.unsigned_abs();
        if magnitude < LONG_PERIOD_BELOW {
            PwmPeriod::Long
        } else if magnitude < MEDIUM_PERIOD_BELOW {
            PwmPeriod::Medium
        } else {
            PwmPeriod::Short
        }
    }

    /// Period length in microseconds.
    pub const fn micros(self) -> u32 {
        match self {
            PwmPeriod::Long => 60_000,
            PwmPeriod::Medium => 40_000,
            PwmPeriod::Short => 30_000,
        }
    }
}

impl<P: Platform> Board<P> {
    /// Select the period for `speed` and program it on all four motor outputs.
    ///
    /// Both channels share the period, so driving one motor retunes the other. Returns the
    /// period that was applied.
    pub fn apply_pwm_period(&mut self, speed: i32) -> BoardResult<PwmPeriod, P> {
        let period = PwmPeriod::for_speed(speed);
        for pin in MOTOR_PINS {
            self.platform
                .set_analog_period(pin, period.micros())
                .map_err(BoardError::Platform)?;
        }
        trace!(speed, period_us = period.micros(), "motor PWM period applied");
        Ok(period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{Call, MockError, MockPlatform};
    use crate::pins::Pin;

    #[test]
    fn test_period_boundaries() {
        assert_eq!(PwmPeriod::for_speed(0), PwmPeriod::Long);
        assert_eq!(PwmPeriod::for_speed(199), PwmPeriod::Long);
        assert_eq!(PwmPeriod::for_speed(200), PwmPeriod::Medium);
        assert_eq!(PwmPeriod::for_speed(299), PwmPeriod::Medium);
        assert_eq!(PwmPeriod::for_speed(300), PwmPeriod::Short);
        assert_eq!(PwmPeriod::for_speed(1023), PwmPeriod::Short);
    }

    #[test]
    fn test_period_uses_magnitude() {
        assert_eq!(PwmPeriod::for_speed(-199), PwmPeriod::Long);
        assert_eq!(PwmPeriod::for_speed(-200), PwmPeriod::Medium);
        assert_eq!(PwmPeriod::for_speed(-300), PwmPeriod::Short);
        assert_eq!(PwmPeriod::for_speed(i32::MIN), PwmPeriod::Short);
    }

    #[test]
    fn test_period_micros() {
        assert_eq!(PwmPeriod::Long.micros(), 60_000);
        assert_eq!(PwmPeriod::Medium.micros(), 40_000);
        assert_eq!(PwmPeriod::Short.micros(), 30_000);
    }

    #[test]
    fn test_apply_sets_all_four_motor_pins() {
        let mut board = Board::new(MockPlatform::new());
        let period = board.apply_pwm_period(250).unwrap();
        assert_eq!(period, PwmPeriod::Medium);

        let calls = &board.platform().calls;
        assert_eq!(
            calls.as_slice(),
            &[
                Call::SetPeriod(Pin::P13, 40_000),
                Call::SetPeriod(Pin::P14, 40_000),
                Call::SetPeriod(Pin::P15, 40_000),
                Call::SetPeriod(Pin::P16, 40_000),
            ]
        );
    }

    #[test]
    fn test_apply_propagates_platform_error() {
        let mut platform = MockPlatform::new();
        platform.fail_on = Some(Pin::P15);
        let mut board = Board::new(platform);
        let result = board.apply_pwm_period(100);
        assert!(matches!(result, Err(BoardError::Platform(MockError))));
        assert_eq!(board.platform().period(Pin::P13), Some(60_000));
        assert_eq!(board.platform().period(Pin::P16), None);
    }
}
