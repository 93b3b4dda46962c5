//! Error types for the board driver.
//!
//! This module defines the errors a board operation can return: bad arguments coming from
//! block-style callers, an ultrasonic echo that never arrived, and failures reported by the
//! underlying platform pin layer.

#![warn(missing_docs)]

use core::fmt;

/// Errors that can occur while driving the board.
///
/// `E` is the error type of the [`Platform`](crate::Platform) the board runs on.
#[derive(Debug, Clone, PartialEq)]
pub enum BoardError<E> {
    /// A channel, direction or speed outside its enumerated set.
    InvalidArgument(&'static str),
    /// The ultrasonic echo pulse was never observed within the range window.
    HardwareTimeout,
    /// The platform pin layer reported a failure.
    Platform(E),
}

impl<E: fmt::Debug> fmt::Display for BoardError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoardError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            BoardError::HardwareTimeout => write!(f, "Ultrasonic echo timed out"),
            BoardError::Platform(err) => write!(f, "Platform error: {:?}", err),
        }
    }
}

impl<E: fmt::Debug> core::error::Error for BoardError<E> {}
