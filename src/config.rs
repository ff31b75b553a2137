//! Configuration management for calibration and force estimation
//!
//! This module provides runtime configuration loading from JSON files,
//! so that capture rules, timeouts and the force episode length can be
//! tuned on the bench without recompiling the firmware core. Defaults
//! match the constants shipped on the device.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::calibration::CHANNEL_COUNT;
use crate::error::{CalibrationError, ForceError};

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub calibration: CalibrationConfig,
    #[serde(default)]
    pub force: ForceConfig,
}

/// Touch calibration parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Raw readings averaged per channel when collecting the baseline
    pub baseline_samples: u32,
    /// Pause between baseline readings
    pub baseline_interval_ms: u64,
    /// Peak captures needed before a channel counts as calibrated
    pub captures_per_channel: usize,
    /// Provisional trigger level as a percentage of the baseline
    pub trigger_percent: u32,
    /// Interactive session timeout
    pub timeout_ms: u64,
    /// Fallback threshold as a percentage of the baseline
    pub fallback_percent: u32,
    /// Pause between capture passes in blocking calibration
    pub capture_poll_interval_ms: u64,
    /// Duration of the resting mean measurement per channel
    pub resting_mean_duration_ms: u64,
    /// Pause between resting mean readings
    pub resting_mean_interval_ms: u64,
    /// Maximum deviation still treated as resting drift
    pub drift_tolerance: f32,
    /// Weight of the newest reading in the drift adjustment
    pub drift_smoothing: f32,
    /// Thresholds in effect before the first calibration
    pub default_thresholds: [u32; CHANNEL_COUNT],
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            baseline_samples: 50,
            baseline_interval_ms: 20,
            captures_per_channel: 10,
            trigger_percent: 25,
            timeout_ms: 60_000,
            fallback_percent: 120,
            capture_poll_interval_ms: 100,
            resting_mean_duration_ms: 1_000,
            resting_mean_interval_ms: 50,
            drift_tolerance: 10.0,
            drift_smoothing: 0.1,
            default_thresholds: [
                20_000, 15_000, 20_000, 15_000, 20_000, 7_000, 20_000, 20_000, 20_000,
            ],
        }
    }
}

impl CalibrationConfig {
    /// Check the values needed to run a calibration
    pub fn validate(&self) -> Result<(), CalibrationError> {
        if self.baseline_samples == 0 {
            return Err(CalibrationError::InvalidConfig {
                reason: "baseline_samples must be greater than 0".to_string(),
            });
        }
        if self.captures_per_channel == 0 {
            return Err(CalibrationError::InvalidConfig {
                reason: "captures_per_channel must be greater than 0".to_string(),
            });
        }
        if self.resting_mean_interval_ms == 0 {
            return Err(CalibrationError::InvalidConfig {
                reason: "resting_mean_interval_ms must be greater than 0".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.drift_smoothing) {
            return Err(CalibrationError::InvalidConfig {
                reason: format!(
                    "drift_smoothing must be within [0, 1] (got {})",
                    self.drift_smoothing
                ),
            });
        }
        Ok(())
    }
}

/// Force estimation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceConfig {
    /// Circular window length (spectral transform size)
    pub window_size: usize,
    /// Sampling iterations per measurement episode
    pub episode_iterations: u32,
    /// Pause between episode iterations
    pub sample_interval_ms: u64,
    /// Native rate of the motion sensor, used to label spectrum bins
    pub sampling_frequency_hz: f64,
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            window_size: 64,
            episode_iterations: 1_000,
            sample_interval_ms: 1,
            sampling_frequency_hz: 100.0,
        }
    }
}

impl ForceConfig {
    /// Check the values needed to build a force pipeline
    pub fn validate(&self) -> Result<(), ForceError> {
        if self.window_size < 4 {
            return Err(ForceError::InvalidWindowSize {
                size: self.window_size,
            });
        }
        if self.episode_iterations == 0 {
            return Err(ForceError::InvalidIterations {
                iterations: self.episode_iterations,
            });
        }
        Ok(())
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The parsed configuration, or the defaults if the file is missing or
    /// the JSON is invalid. Missing sections and fields take their defaults.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }
}
