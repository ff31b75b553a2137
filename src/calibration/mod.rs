// Calibration module - touch pad baselines and adaptive thresholds
//
// This module provides:
// 1. ChannelId / SensorChannel: per-pad identity and calibration state
// 2. CalibrationSession: bookkeeping for one interactive attempt
// 3. TouchCalibrationEngine: baseline collection, capture polling, thresholds
//
// The calibration workflow:
// 1. Start an interactive session (baselines are collected first)
// 2. Poll once per control-loop iteration while the user strikes each pad
// 3. Session ends when all 9 pads are calibrated or after 60 s; pads that
//    never calibrated fall back to 120% of their baseline

pub mod channel;
pub mod engine;
pub mod progress;
pub mod session;

pub use channel::{CaptureEvent, ChannelId, SensorChannel, CHANNEL_COUNT};
pub use engine::TouchCalibrationEngine;
pub use progress::CalibrationProgress;
pub use session::{CalibrationOutcome, CalibrationSession};
