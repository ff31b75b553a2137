// Progress reporting for interactive calibration
//
// CalibrationProgress is the snapshot the sync/display collaborators read
// while a session runs: how many pads are done, which ones, and how the
// last session ended.

use super::channel::CHANNEL_COUNT;
use super::session::CalibrationOutcome;

/// Calibration progress across the sensor bank
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CalibrationProgress {
    /// Channels calibrated in the current (or last) session
    pub completed: usize,
    /// Channels in the bank
    pub total: usize,
    /// Whether a session is running
    pub active: bool,
    /// Outcome of the most recent finished session
    pub outcome: Option<CalibrationOutcome>,
    /// Per-channel calibrated flags in scan order
    pub calibrated: [bool; CHANNEL_COUNT],
}

impl CalibrationProgress {
    /// Check if every channel is calibrated
    pub fn is_complete(&self) -> bool {
        self.completed >= self.total
    }

    /// Channels that will use a fallback threshold if the session ended now
    pub fn pending(&self) -> usize {
        self.total.saturating_sub(self.completed)
    }

    /// Get progress percentage (0-100)
    pub fn percentage(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        ((self.completed * 100) / self.total) as u8
    }
}
