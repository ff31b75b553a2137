// Force pipeline error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Force pipeline error code constants
///
/// Error code range: 3001-3002
pub struct ForceErrorCodes {}

impl ForceErrorCodes {
    /// Sample window too small for a spectral transform
    pub const INVALID_WINDOW_SIZE: i32 = 3001;

    /// Measurement episode has no iterations
    pub const INVALID_ITERATIONS: i32 = 3002;
}

/// Log a force pipeline error with structured context
pub fn log_force_error(err: &ForceError, context: &str) {
    error!(
        "Force error in {}: code={}, component=ForcePipeline, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Force pipeline construction errors
///
/// The running pipeline never fails; these are raised only when a
/// pipeline is built from configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ForceError {
    /// Window must hold at least 4 samples
    InvalidWindowSize { size: usize },

    /// Episode must run at least one iteration
    InvalidIterations { iterations: u32 },
}

impl ErrorCode for ForceError {
    fn code(&self) -> i32 {
        match self {
            ForceError::InvalidWindowSize { .. } => ForceErrorCodes::INVALID_WINDOW_SIZE,
            ForceError::InvalidIterations { .. } => ForceErrorCodes::INVALID_ITERATIONS,
        }
    }

    fn message(&self) -> String {
        match self {
            ForceError::InvalidWindowSize { size } => {
                format!("Sample window size must be at least 4 (got {})", size)
            }
            ForceError::InvalidIterations { iterations } => {
                format!(
                    "Measurement episode needs at least one iteration (got {})",
                    iterations
                )
            }
        }
    }
}

impl fmt::Display for ForceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ForceError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for ForceError {}
