// Error types for the punch trainer core
//
// This module defines custom error types for calibration and force
// operations, providing structured error handling with numeric error codes
// suitable for reporting to the status/sync collaborators.
//
// Only input-contract violations and invalid configuration are errors.
// Degraded calibration (timeout) and insufficient force data are regular
// results, not failures.

mod calibration;
mod force;

pub use calibration::{log_calibration_error, CalibrationError, CalibrationErrorCodes};
pub use force::{log_force_error, ForceError, ForceErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// the collaborator boundary.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
