//! Ultrasonic ranging by echo pulse timing.

use tracing::{debug, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::pins::{Level, Pull, SONAR_ECHO, SONAR_TRIGGER};
use crate::platform::Platform;
use crate::{Board, BoardError, BoardResult};

/// Furthest distance the sensor is asked to range.
pub const MAX_RANGE_CM: u32 = 500;
/// Approximate echo round-trip time per centimetre.
pub const US_PER_CM: u32 = 58;
/// Echo measurement timeout, covering [`MAX_RANGE_CM`].
pub const ECHO_TIMEOUT_US: u32 = MAX_RANGE_CM * US_PER_CM;
/// Low time before the trigger pulse.
pub const TRIGGER_SETTLE_US: u32 = 2;
/// Trigger pulse width.
pub const TRIGGER_PULSE_US: u32 = 10;
/// Pause after every measurement.
pub const SETTLE_MS: u32 = 50;

/// What to report when no echo comes back within [`ECHO_TIMEOUT_US`].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeoutPolicy {
    /// Fail with [`BoardError::HardwareTimeout`].
    #[default]
    Error,
    /// Report 0 cm, matching the legacy block package.
    ReportZero,
}

/// Convert an echo pulse width in microseconds to centimetres.
///
/// Computes `duration * 153 / 29 / 2 / 100` and rounds to the nearest integer.
pub fn echo_to_cm(duration_us: u32) -> u32 {
    let cm = f64::from(duration_us) * 153.0 / 29.0 / 2.0 / 100.0;
    libm::round(cm) as u32
}

impl<P: Platform> Board<P> {
    /// Trigger a ranging cycle and return the distance in centimetres.
    ///
    /// Blocks for the echo (at most [`ECHO_TIMEOUT_US`]) plus a fixed [`SETTLE_MS`] pause.
    /// A missing echo is handled according to the board's [`TimeoutPolicy`].
    pub fn read_ultrasonic_distance_cm(&mut self) -> BoardResult<u32, P> {
        let duration = self.measure_echo_us()?;
        self.platform.pause_ms(SETTLE_MS);

        if duration == 0 {
            return match self.timeout_policy {
                TimeoutPolicy::Error => {
                    warn!(timeout_us = ECHO_TIMEOUT_US, "no ultrasonic echo");
                    Err(BoardError::HardwareTimeout)
                }
                TimeoutPolicy::ReportZero => {
                    debug!("no ultrasonic echo, reporting 0 cm");
                    Ok(0)
                }
            };
        }

        let cm = echo_to_cm(duration);
        debug!(duration_us = duration, distance_cm = cm, "ultrasonic range");
        Ok(cm)
    }

    /// Fire the trigger pulse and time the echo. Returns 0 on timeout.
    fn measure_echo_us(&mut self) -> BoardResult<u32, P> {
        let platform = &mut self.platform;
        platform.set_pull(SONAR_TRIGGER, Pull::None).map_err(BoardError::Platform)?;
        platform.digital_write(SONAR_TRIGGER, Level::Low).map_err(BoardError::Platform)?;
        platform.delay_us(TRIGGER_SETTLE_US);
        platform.digital_write(SONAR_TRIGGER, Level::High).map_err(BoardError::Platform)?;
        platform.delay_us(TRIGGER_PULSE_US);
        platform.digital_write(SONAR_TRIGGER, Level::Low).map_err(BoardError::Platform)?;

        platform
            .pulse_in(SONAR_ECHO, Level::High, ECHO_TIMEOUT_US)
            .map_err(BoardError::Platform)
    }
}
