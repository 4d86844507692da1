//! Motion layer errors.

use std::fmt;

/// Errors raised while starting or stopping motion sensing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MotionError {
    /// No accelerometer behind the configured source
    SensorUnavailable,
    /// The source refused to start delivering samples
    SensorStartFailed(String),
    /// The source reported an error while stopping
    SensorStopFailed(String),
}

impl fmt::Display for MotionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotionError::SensorUnavailable => {
                f.write_str("Accelerometer is not available on this device")
            }
            MotionError::SensorStartFailed(reason) => {
                write!(f, "Failed to start motion updates: {}", reason)
            }
            MotionError::SensorStopFailed(reason) => {
                write!(f, "Failed to stop motion updates: {}", reason)
            }
        }
    }
}

impl std::error::Error for MotionError {}
