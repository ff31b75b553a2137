// Calibration error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Calibration error code constants
///
/// Single source of truth for the numeric codes reported to the
/// sync/display collaborators.
///
/// Error code range: 2001-2003
pub struct CalibrationErrorCodes {}

impl CalibrationErrorCodes {
    /// Channel index outside the sensor bank
    pub const CHANNEL_OUT_OF_RANGE: i32 = 2001;

    /// Interactive calibration already in progress
    pub const ALREADY_IN_PROGRESS: i32 = 2002;

    /// Calibration configuration rejected
    pub const INVALID_CONFIG: i32 = 2003;
}

/// Log a calibration error with structured context
///
/// This function logs calibration errors with structured fields including:
/// - error_code: Numeric error code for programmatic handling
/// - component: The component where the error occurred
/// - message: Human-readable error message
/// - context: Additional contextual information
pub fn log_calibration_error(err: &CalibrationError, context: &str) {
    error!(
        "Calibration error in {}: code={}, component=TouchCalibrationEngine, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Calibration-related errors
///
/// These errors cover the touch calibration engine: channel addressing,
/// session lifecycle and configuration.
///
/// Error code ranges: 2001-2003
#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationError {
    /// Channel index is outside `0..channels`
    ChannelOutOfRange { index: usize, channels: usize },

    /// An interactive session is already running
    AlreadyInProgress,

    /// Configuration values cannot drive a calibration
    InvalidConfig { reason: String },
}

impl ErrorCode for CalibrationError {
    fn code(&self) -> i32 {
        match self {
            CalibrationError::ChannelOutOfRange { .. } => {
                CalibrationErrorCodes::CHANNEL_OUT_OF_RANGE
            }
            CalibrationError::AlreadyInProgress => CalibrationErrorCodes::ALREADY_IN_PROGRESS,
            CalibrationError::InvalidConfig { .. } => CalibrationErrorCodes::INVALID_CONFIG,
        }
    }

    fn message(&self) -> String {
        match self {
            CalibrationError::ChannelOutOfRange { index, channels } => {
                format!(
                    "Channel index {} out of range (sensor bank has {} channels)",
                    index, channels
                )
            }
            CalibrationError::AlreadyInProgress => "Calibration already in progress".to_string(),
            CalibrationError::InvalidConfig { reason } => {
                format!("Invalid calibration config: {}", reason)
            }
        }
    }
}

impl fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CalibrationError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for CalibrationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calibration_error_codes() {
        assert_eq!(
            CalibrationError::ChannelOutOfRange {
                index: 9,
                channels: 9
            }
            .code(),
            2001
        );
        assert_eq!(CalibrationError::AlreadyInProgress.code(), 2002);
        assert_eq!(
            CalibrationError::InvalidConfig {
                reason: "test".to_string()
            }
            .code(),
            2003
        );
    }

    #[test]
    fn test_calibration_error_display() {
        let err = CalibrationError::ChannelOutOfRange {
            index: 11,
            channels: 9,
        };
        assert!(err.message().contains("index 11"));
        assert!(err.message().contains("9 channels"));

        let display = format!("{}", CalibrationError::AlreadyInProgress);
        assert!(display.contains("code 2002"));
        assert!(display.contains("already in progress"));
    }
}
