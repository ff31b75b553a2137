// ForcePipeline - motion magnitude to punch force estimate
//
// Every motion sample advances the circular window. Once the window has
// been filled, each new sample recomputes the windowed spectrum over the
// last N samples, so the energy estimate updates continuously during a
// short impact. A measurement episode polls the motion sensor for a fixed
// number of iterations and reports the peak energy seen.

use tracing::{debug, info, warn};

use super::peak::PeakTracker;
use super::spectrum::SpectralEnergy;
use super::window::{ForceSampleWindow, WindowState};
use crate::config::ForceConfig;
use crate::error::ForceError;
use crate::hal::{Clock, MotionSource};

/// Measurement episode state
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum EpisodeState {
    Idle,
    Measuring,
}

/// Force estimation pipeline
pub struct ForcePipeline<M, C> {
    motion: M,
    clock: C,
    config: ForceConfig,
    window: ForceSampleWindow,
    spectrum: SpectralEnergy,
    peak: PeakTracker,
    episode: EpisodeState,
    last_energy: Option<f64>,
    last_force: Option<f64>,
}

impl<M: MotionSource, C: Clock> ForcePipeline<M, C> {
    /// Create a pipeline with an empty window
    ///
    /// # Returns
    /// * `Ok(ForcePipeline)` - Pipeline ready for samples
    /// * `Err(ForceError)` - Window size or episode length rejected
    pub fn new(motion: M, clock: C, config: ForceConfig) -> Result<Self, ForceError> {
        config.validate()?;

        Ok(Self {
            motion,
            clock,
            window: ForceSampleWindow::new(config.window_size),
            spectrum: SpectralEnergy::new(config.window_size),
            peak: PeakTracker::new(),
            episode: EpisodeState::Idle,
            last_energy: None,
            last_force: None,
            config,
        })
    }

    /// Push one resultant magnitude sample
    ///
    /// Non-finite samples are dropped without touching the window.
    ///
    /// # Returns
    /// * `Some(energy)` - Spectral energy of the last N samples
    /// * `None` - Window not yet filled, or the sample was dropped
    pub fn push_motion_sample(&mut self, magnitude: f64) -> Option<f64> {
        if !magnitude.is_finite() {
            warn!("[Force] Dropping non-finite motion sample {}", magnitude);
            return None;
        }

        if !self.window.push(magnitude) {
            return None;
        }

        let mean = self.window.mean();
        let energy = self.spectrum.energy(self.window.ordered(), mean);
        self.last_energy = Some(energy);
        Some(energy)
    }

    /// Clear the window between independent episodes
    pub fn reset_window(&mut self) {
        self.window.reset();
        self.last_energy = None;
        debug!("[Force] Sample window reset");
    }

    /// Run one blocking measurement episode
    ///
    /// Reads `episode_iterations` motion samples, `sample_interval_ms`
    /// apart, and tracks the peak energy. The peak tracker is reset at the
    /// end so the next episode starts from zero. The window is not reset;
    /// call `reset_window` first for an independent episode.
    ///
    /// # Returns
    /// Maximum energy observed, `0.0` if the window never filled
    pub fn measure_peak_force(&mut self) -> f64 {
        self.episode = EpisodeState::Measuring;
        info!(
            "[Force] Measuring peak force over {} samples",
            self.config.episode_iterations
        );

        let mut peak_force = 0.0f64;
        for _ in 0..self.config.episode_iterations {
            let magnitude = self.motion.read_motion().resultant();
            if let Some(energy) = self.push_motion_sample(magnitude) {
                peak_force = peak_force.max(self.peak.update(energy));
            }
            self.clock.delay_ms(self.config.sample_interval_ms);
        }

        self.peak.reset();
        self.episode = EpisodeState::Idle;
        self.last_force = Some(peak_force);

        info!("[Force] Peak force = {:.3}", peak_force);
        peak_force
    }

    pub fn window_state(&self) -> WindowState {
        self.window.state()
    }

    pub fn episode_state(&self) -> EpisodeState {
        self.episode
    }

    /// Result of the most recent episode
    pub fn last_force(&self) -> Option<f64> {
        self.last_force
    }

    /// Energy returned by the most recent full-window sample
    pub fn last_energy(&self) -> Option<f64> {
        self.last_energy
    }

    /// Frequency of the strongest non-DC bin in the last transform
    pub fn dominant_frequency_hz(&self) -> Option<f64> {
        self.last_energy?;
        self.spectrum
            .dominant_bin()
            .map(|bin| self.spectrum.bin_frequency(bin, self.config.sampling_frequency_hz))
    }

    pub fn peak_tracker(&self) -> &PeakTracker {
        &self.peak
    }

    pub fn config(&self) -> &ForceConfig {
        &self.config
    }

    /// Mutable access to the motion source (simulators and tests)
    pub fn motion_mut(&mut self) -> &mut M {
        &mut self.motion
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}
