// Touch channels - stable identifiers and per-channel calibration state
//
// Each physical pad owns one SensorChannel. The channel learns its
// threshold from a resting baseline plus a small set of peak captures
// taken while the user strikes it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of touch channels on the bag
pub const CHANNEL_COUNT: usize = 9;

/// Physical touch pad position
///
/// Declaration order is the fixed scan order used by touch detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelId {
    FrontHigh,
    FrontLow,
    RightLow,
    RightHigh,
    LeftLow,
    LeftHigh,
    BackHigh,
    BackLow,
    Center,
}

impl ChannelId {
    /// All channels in scan order
    pub const ALL: [ChannelId; CHANNEL_COUNT] = [
        ChannelId::FrontHigh,
        ChannelId::FrontLow,
        ChannelId::RightLow,
        ChannelId::RightHigh,
        ChannelId::LeftLow,
        ChannelId::LeftHigh,
        ChannelId::BackHigh,
        ChannelId::BackLow,
        ChannelId::Center,
    ];

    /// Position in scan order
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Look up a channel by scan index
    ///
    /// # Returns
    /// * `Some(ChannelId)` - Channel at `index`
    /// * `None` - Index outside the sensor bank
    pub fn from_index(index: usize) -> Option<ChannelId> {
        Self::ALL.get(index).copied()
    }

    /// Get human-readable name for display
    pub fn display_name(&self) -> &'static str {
        match self {
            ChannelId::FrontHigh => "FRONT HIGH",
            ChannelId::FrontLow => "FRONT LOW",
            ChannelId::RightLow => "RIGHT LOW",
            ChannelId::RightHigh => "RIGHT HIGH",
            ChannelId::LeftLow => "LEFT LOW",
            ChannelId::LeftHigh => "LEFT HIGH",
            ChannelId::BackHigh => "BACK HIGH",
            ChannelId::BackLow => "BACK LOW",
            ChannelId::Center => "CENTER",
        }
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for ChannelId {
    type Err = String;

    /// Accepts "front-high", "FRONT HIGH", "FrontHigh", "front_high", ...
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize(s);
        Self::ALL
            .iter()
            .copied()
            .find(|id| normalize(id.display_name()) == wanted)
            .ok_or_else(|| format!("Unknown channel '{}'", s))
    }
}

fn saturate(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Result of feeding one reading into a channel during calibration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureEvent {
    /// Reading stayed within the trigger level
    Ignored,
    /// Reading was stored; carries the capture count after storing
    Captured(usize),
    /// Capture buffer was full; it is now sorted and the channel calibrated
    Calibrated,
}

/// Calibration state of one touch pad
#[derive(Debug, Clone)]
pub struct SensorChannel {
    id: ChannelId,
    baseline: u32,
    threshold: u32,
    calibrated: bool,
    captures: Vec<u32>,
    capture_limit: usize,
    resting_mean: f32,
}

impl SensorChannel {
    /// Create an uncalibrated channel
    ///
    /// # Arguments
    /// * `id` - Pad position
    /// * `default_threshold` - Threshold in effect until the first calibration
    /// * `capture_limit` - Captures required before the channel calibrates
    pub fn new(id: ChannelId, default_threshold: u32, capture_limit: usize) -> Self {
        Self {
            id,
            baseline: 0,
            threshold: default_threshold,
            calibrated: false,
            captures: Vec::with_capacity(capture_limit),
            capture_limit,
            resting_mean: 0.0,
        }
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.id.display_name()
    }

    pub fn baseline(&self) -> u32 {
        self.baseline
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibrated
    }

    /// Captured peak readings (ascending once calibrated)
    pub fn captures(&self) -> &[u32] {
        &self.captures
    }

    pub fn capture_count(&self) -> usize {
        self.captures.len()
    }

    pub fn resting_mean(&self) -> f32 {
        self.resting_mean
    }

    /// Provisional trigger level: `trigger_percent` of the baseline
    pub fn trigger_level(&self, trigger_percent: u32) -> u32 {
        saturate(self.baseline as u64 * trigger_percent as u64 / 100)
    }

    /// Mean of the capture buffer, available once calibrated
    pub fn capture_mean(&self) -> Option<u32> {
        if !self.calibrated || self.captures.len() != self.capture_limit {
            return None;
        }
        let sum: u64 = self.captures.iter().map(|&v| v as u64).sum();
        Some(saturate(sum / self.capture_limit as u64))
    }

    /// Store a new baseline; the channel must be recalibrated afterwards
    ///
    /// Captures taken against the old baseline are dropped with it.
    pub(crate) fn set_baseline(&mut self, baseline: u32) {
        self.baseline = baseline;
        self.reset_captures();
    }

    /// Forget captures and calibration before a new session
    fn reset_captures(&mut self) {
        self.captures.clear();
        self.calibrated = false;
    }

    pub(crate) fn set_resting_mean(&mut self, mean: f32) {
        self.resting_mean = mean;
    }

    /// Apply the capture rule to one raw reading
    ///
    /// Readings that deviate from the baseline by more than the trigger
    /// level are appended until the buffer is full. The next triggering
    /// reading after that sorts the buffer and marks the channel calibrated.
    pub(crate) fn observe(&mut self, reading: u32, trigger_percent: u32) -> CaptureEvent {
        if self.calibrated {
            return CaptureEvent::Ignored;
        }

        let diff = reading.abs_diff(self.baseline);
        if diff <= self.trigger_level(trigger_percent) {
            return CaptureEvent::Ignored;
        }

        if self.captures.len() < self.capture_limit {
            self.captures.push(reading);
            CaptureEvent::Captured(self.captures.len())
        } else {
            self.captures.sort_unstable();
            self.calibrated = true;
            CaptureEvent::Calibrated
        }
    }

    /// Derive the final threshold
    ///
    /// Calibrated: `(baseline + mean(captures)) / 2`.
    /// Otherwise: `baseline * fallback_percent / 100`.
    pub(crate) fn finalize_threshold(&mut self, fallback_percent: u32) -> u32 {
        self.threshold = match self.capture_mean() {
            Some(mean) => saturate((self.baseline as u64 + mean as u64) / 2),
            None => saturate(self.baseline as u64 * fallback_percent as u64 / 100),
        };
        self.threshold
    }

    /// Blend a resting reading into the resting mean when it is within tolerance
    ///
    /// # Returns
    /// `true` if the mean was updated
    pub(crate) fn track_drift(&mut self, reading: u32, tolerance: f32, smoothing: f32) -> bool {
        let reading = reading as f32;
        if (reading - self.resting_mean).abs() < tolerance {
            self.resting_mean = self.resting_mean * (1.0 - smoothing) + reading * smoothing;
            true
        } else {
            false
        }
    }
}
