// TrainerContext: aggregate root for the touch-force core
// Owns the calibration engine and the force pipeline for one device

use serde::Serialize;

use crate::calibration::{CalibrationProgress, ChannelId, TouchCalibrationEngine};
use crate::config::AppConfig;
use crate::error::{log_calibration_error, log_force_error, CalibrationError, ErrorCode, ForceError};
use crate::force::{EpisodeState, ForcePipeline, WindowState};
use crate::hal::{Clock, MotionSource, TouchSource};

/// Per-channel view published to the sync/display collaborators
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelStatus {
    pub index: usize,
    pub name: &'static str,
    pub baseline: u32,
    pub threshold: u32,
    pub calibrated: bool,
}

/// Snapshot of everything the excluded collaborators consume
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceStatus {
    pub calibration: CalibrationProgress,
    pub channels: Vec<ChannelStatus>,
    pub last_touch: Option<ChannelId>,
    pub last_force: Option<f64>,
    pub window: WindowState,
    pub episode: EpisodeState,
}

/// Error raised while building a context from configuration
#[derive(Debug, Clone, PartialEq)]
pub enum ContextError {
    Calibration(CalibrationError),
    Force(ForceError),
}

impl std::fmt::Display for ContextError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContextError::Calibration(err) => write!(f, "{}", err),
            ContextError::Force(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for ContextError {}

impl ErrorCode for ContextError {
    fn code(&self) -> i32 {
        match self {
            ContextError::Calibration(err) => err.code(),
            ContextError::Force(err) => err.code(),
        }
    }

    fn message(&self) -> String {
        match self {
            ContextError::Calibration(err) => err.message(),
            ContextError::Force(err) => err.message(),
        }
    }
}

impl From<CalibrationError> for ContextError {
    fn from(err: CalibrationError) -> Self {
        ContextError::Calibration(err)
    }
}

impl From<ForceError> for ContextError {
    fn from(err: ForceError) -> Self {
        ContextError::Force(err)
    }
}

/// TrainerContext: single owner of all mutable sensor state
///
/// Driven from one control loop; every call is synchronous. Calibration
/// polling never blocks, force measurement blocks for one episode.
pub struct TrainerContext<T, M, C> {
    calibration: TouchCalibrationEngine<T, C>,
    force: ForcePipeline<M, C>,
    last_touch: Option<ChannelId>,
}

impl<T, M, C> TrainerContext<T, M, C>
where
    T: TouchSource,
    M: MotionSource,
    C: Clock + Clone,
{
    /// Create a context from configuration
    ///
    /// The clock is cloned so both components share one time base.
    pub fn new(touch: T, motion: M, clock: C, config: AppConfig) -> Result<Self, ContextError> {
        let calibration = TouchCalibrationEngine::new(touch, clock.clone(), config.calibration)
            .map_err(|err| {
                log_calibration_error(&err, "TrainerContext::new");
                err
            })?;
        let force = ForcePipeline::new(motion, clock, config.force).map_err(|err| {
            log_force_error(&err, "TrainerContext::new");
            err
        })?;

        Ok(Self {
            calibration,
            force,
            last_touch: None,
        })
    }
}

impl<T, M, C> TrainerContext<T, M, C>
where
    T: TouchSource,
    M: MotionSource,
    C: Clock,
{
    // ========================================================================
    // CALIBRATION
    // ========================================================================

    /// Start interactive calibration (start command from the app)
    pub fn start_calibration(&mut self) -> Result<(), CalibrationError> {
        self.calibration
            .start_interactive_calibration()
            .map_err(|err| {
                log_calibration_error(&err, "start_calibration");
                err
            })
    }

    /// One non-blocking calibration step; `true` when the session just ended
    pub fn poll_calibration(&mut self) -> bool {
        self.calibration.poll_interactive_calibration()
    }

    pub fn calibration_progress(&self) -> CalibrationProgress {
        self.calibration.progress()
    }

    // ========================================================================
    // DETECTION AND FORCE
    // ========================================================================

    /// Scan the pads and remember the detected channel
    pub fn detect_touch(&mut self) -> Option<ChannelId> {
        self.last_touch = self.calibration.detect_touch();
        self.last_touch
    }

    /// Run one independent force episode
    ///
    /// Clears the sample window first so the previous episode cannot leak
    /// into this one.
    pub fn measure_force(&mut self) -> f64 {
        self.force.reset_window();
        self.force.measure_peak_force()
    }

    // ========================================================================
    // STATUS
    // ========================================================================

    pub fn status(&self) -> DeviceStatus {
        let channels = self
            .calibration
            .channels()
            .iter()
            .map(|channel| ChannelStatus {
                index: channel.id().index(),
                name: channel.name(),
                baseline: channel.baseline(),
                threshold: channel.threshold(),
                calibrated: channel.is_calibrated(),
            })
            .collect();

        DeviceStatus {
            calibration: self.calibration.progress(),
            channels,
            last_touch: self.last_touch,
            last_force: self.force.last_force(),
            window: self.force.window_state(),
            episode: self.force.episode_state(),
        }
    }

    pub fn calibration(&self) -> &TouchCalibrationEngine<T, C> {
        &self.calibration
    }

    pub fn calibration_mut(&mut self) -> &mut TouchCalibrationEngine<T, C> {
        &mut self.calibration
    }

    pub fn force(&self) -> &ForcePipeline<M, C> {
        &self.force
    }

    pub fn force_mut(&mut self) -> &mut ForcePipeline<M, C> {
        &mut self.force
    }
}
