// Interactive calibration session bookkeeping
//
// At most one session exists at a time. It is opened by the engine when
// interactive calibration starts and closed when every channel is
// calibrated or the timeout elapses.

use serde::{Deserialize, Serialize};

/// How a calibration session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalibrationOutcome {
    /// Every channel collected its captures
    Completed,
    /// Timeout elapsed; uncalibrated channels use fallback thresholds
    TimedOut,
}

/// Process-wide state of one calibration attempt
#[derive(Debug, Clone, Default)]
pub struct CalibrationSession {
    active: bool,
    start_time_ms: u64,
    completed: usize,
}

impl CalibrationSession {
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn start_time_ms(&self) -> u64 {
        self.start_time_ms
    }

    /// Channels calibrated in this session
    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.start_time_ms)
    }

    /// True once strictly more than `timeout_ms` has elapsed
    pub fn is_timed_out(&self, now_ms: u64, timeout_ms: u64) -> bool {
        self.elapsed_ms(now_ms) > timeout_ms
    }

    pub(crate) fn begin(&mut self, now_ms: u64) {
        self.active = true;
        self.start_time_ms = now_ms;
        self.completed = 0;
    }

    pub(crate) fn record_completion(&mut self) -> usize {
        self.completed += 1;
        self.completed
    }

    pub(crate) fn end(&mut self) {
        self.active = false;
    }
}
