//! Line-follower sensor reads.
//!
//! Sensors A to C are digital and active-low: the input is pulled up and the sensor drags
//! it low when it sees the line. Sensor D is a different part on an analog input and is
//! thresholded separately.

use tracing::trace;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::pins::{LINE_A, LINE_B, LINE_C, LINE_D, Level, Pin, Pull};
use crate::platform::Platform;
use crate::{Board, BoardError, BoardResult};

/// Raw analog readings above this count as "no line" on sensor D.
pub const LINE_D_THRESHOLD: u16 = 350;

/// Line sensor position.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineSensor {
    A,
    B,
    C,
    /// Analog sensor.
    D,
}

impl LineSensor {
    /// All sensors in board order.
    pub const ALL: [LineSensor; 4] = [LineSensor::A, LineSensor::B, LineSensor::C, LineSensor::D];

    /// Input pin the sensor is wired to.
    pub const fn pin(self) -> Pin {
        match self {
            LineSensor::A => LINE_A,
            LineSensor::B => LINE_B,
            LineSensor::C => LINE_C,
            LineSensor::D => LINE_D,
        }
    }
}

impl TryFrom<u8> for LineSensor {
    type Error = &'static str;

    /// Legacy block codes `0x01..=0x04`.
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(LineSensor::A),
            0x02 => Ok(LineSensor::B),
            0x03 => Ok(LineSensor::C),
            0x04 => Ok(LineSensor::D),
            _ => Err("line sensor must be 0x01..=0x04 (A to D)"),
        }
    }
}

/// Normalise sensor D's raw analog value: above the threshold reads 0, otherwise 1.
pub const fn analog_line_value(raw: u16) -> u8 {
    if raw > LINE_D_THRESHOLD { 0 } else { 1 }
}

impl<P: Platform> Board<P> {
    /// Active-low digital read: enables the pull-up, returns 1 if the pin reads low.
    pub fn pin_read(&mut self, pin: Pin) -> BoardResult<u8, P> {
        self.platform.set_pull(pin, Pull::Up).map_err(BoardError::Platform)?;
        let level = self.platform.digital_read(pin).map_err(BoardError::Platform)?;
        Ok(match level {
            Level::Low => 1,
            Level::High => 0,
        })
    }

    /// Read one line sensor as 0 or 1.
    pub fn read_line_sensor(&mut self, sensor: LineSensor) -> BoardResult<u8, P> {
        let value = match sensor {
            LineSensor::A | LineSensor::B | LineSensor::C => self.pin_read(sensor.pin())?,
            LineSensor::D => {
                let pin = sensor.pin();
                self.platform.set_pull(pin, Pull::Up).map_err(BoardError::Platform)?;
                let raw = self.platform.analog_read(pin).map_err(BoardError::Platform)?;
                trace!(raw, threshold = LINE_D_THRESHOLD, "analog line sensor sampled");
                analog_line_value(raw)
            }
        };
        trace!(?sensor, value, "line sensor read");
        Ok(value)
    }

    /// Read a line sensor from its legacy block code.
    pub fn read_line_sensor_raw(&mut self, code: u8) -> BoardResult<u8, P> {
        let sensor = LineSensor::try_from(code).map_err(BoardError::InvalidArgument)?;
        self.read_line_sensor(sensor)
    }

    /// Read all four sensors, in order A, B, C, D.
    pub fn read_line_sensors(&mut self) -> BoardResult<[u8; 4], P> {
        let mut values = [0u8; 4];
        for (slot, sensor) in values.iter_mut().zip(LineSensor::ALL) {
            *slot = self.read_line_sensor(sensor)?;
        }
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{Call, MockPlatform};

    #[test]
    fn test_digital_sensor_is_active_low() {
        let mut platform = MockPlatform::new();
        platform.digital_inputs.insert(Pin::P0, Level::Low);
        platform.digital_inputs.insert(Pin::P1, Level::High);
        let mut board = Board::new(platform);
        assert_eq!(board.read_line_sensor(LineSensor::A).unwrap(), 1);
        assert_eq!(board.read_line_sensor(LineSensor::B).unwrap(), 0);
    }

    #[test]
    fn test_pin_read_enables_pull_up_first() {
        let mut board = Board::new(MockPlatform::new());
        board.read_line_sensor(LineSensor::C).unwrap();
        assert_eq!(
            board.platform().calls.as_slice(),
            &[Call::SetPull(Pin::P2, Pull::Up), Call::DigitalRead(Pin::P2)]
        );
    }

    #[test]
    fn test_analog_sensor_threshold() {
        let mut platform = MockPlatform::new();
        platform.analog_inputs.insert(Pin::P3, 351);
        let mut board = Board::new(platform);
        assert_eq!(board.read_line_sensor(LineSensor::D).unwrap(), 0);

        board.platform_mut().analog_inputs.insert(Pin::P3, 350);
        assert_eq!(board.read_line_sensor(LineSensor::D).unwrap(), 1);

        board.platform_mut().analog_inputs.insert(Pin::P3, 0);
        assert_eq!(board.read_line_sensor(LineSensor::D).unwrap(), 1);
    }

    #[test]
    fn test_analog_sensor_ignores_digital_level() {
        let mut platform = MockPlatform::new();
        platform.digital_inputs.insert(Pin::P3, Level::Low);
        platform.analog_inputs.insert(Pin::P3, 900);
        let mut board = Board::new(platform);
        assert_eq!(board.read_line_sensor(LineSensor::D).unwrap(), 0);
        assert_eq!(
            board.platform().calls.as_slice(),
            &[Call::SetPull(Pin::P3, Pull::Up), Call::AnalogRead(Pin::P3)]
        );
    }

    #[test]
    fn test_read_line_sensor_raw() {
        let mut platform = MockPlatform::new();
        platform.digital_inputs.insert(Pin::P2, Level::Low);
        let mut board = Board::new(platform);
        assert_eq!(board.read_line_sensor_raw(0x03).unwrap(), 1);
        assert!(matches!(
            board.read_line_sensor_raw(0x05),
            Err(BoardError::InvalidArgument(_))
        ));
        assert!(matches!(
            board.read_line_sensor_raw(0x00),
            Err(BoardError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_read_all_sensors() {
        let mut platform = MockPlatform::new();
        platform.digital_inputs.insert(Pin::P0, Level::Low);
        platform.digital_inputs.insert(Pin::P2, Level::Low);
        platform.analog_inputs.insert(Pin::P3, 120);
        let mut board = Board::new(platform);
        assert_eq!(board.read_line_sensors().unwrap(), [1, 0, 1, 1]);
    }
}
