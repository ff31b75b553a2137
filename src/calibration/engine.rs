// TouchCalibrationEngine - baseline acquisition and adaptive thresholds
//
// The engine owns the nine touch channels and the single calibration
// session. Interactive calibration is cooperative: the control loop calls
// `poll_interactive_calibration` once per iteration and the engine does
// one capture pass per call, never blocking.
//
// Session flow:
// 1. start_interactive_calibration: collect baselines (clears captures), open session
// 2. poll: timeout check first, then one capture pass over uncalibrated channels
// 3. finalize (all calibrated or timeout): derive thresholds, close session

use tracing::{debug, info, warn};

use super::channel::{CaptureEvent, ChannelId, SensorChannel, CHANNEL_COUNT};
use super::progress::CalibrationProgress;
use super::session::{CalibrationOutcome, CalibrationSession};
use crate::config::CalibrationConfig;
use crate::error::CalibrationError;
use crate::hal::{Clock, TouchSource};

/// Calibration engine for the touch sensor bank
pub struct TouchCalibrationEngine<T, C> {
    touch: T,
    clock: C,
    config: CalibrationConfig,
    channels: [SensorChannel; CHANNEL_COUNT],
    session: CalibrationSession,
    last_outcome: Option<CalibrationOutcome>,
}

impl<T: TouchSource, C: Clock> TouchCalibrationEngine<T, C> {
    /// Create an engine with every channel at its default threshold
    ///
    /// # Arguments
    /// * `touch` - Raw reading source for the pads
    /// * `clock` - Millisecond clock used for pacing and the session timeout
    /// * `config` - Calibration parameters
    ///
    /// # Returns
    /// * `Ok(TouchCalibrationEngine)` - Engine ready for baseline collection
    /// * `Err(CalibrationError::InvalidConfig)` - Config cannot drive a calibration
    pub fn new(touch: T, clock: C, config: CalibrationConfig) -> Result<Self, CalibrationError> {
        config.validate()?;

        let channels = ChannelId::ALL.map(|id| {
            SensorChannel::new(
                id,
                config.default_thresholds[id.index()],
                config.captures_per_channel,
            )
        });

        Ok(Self {
            touch,
            clock,
            config,
            channels,
            session: CalibrationSession::default(),
            last_outcome: None,
        })
    }

    /// Average `baseline_samples` resting readings per channel
    ///
    /// Overwrites every baseline and clears every calibrated flag and
    /// capture buffer. An active session restarts from zero completed
    /// channels with a fresh timeout.
    pub fn collect_baseline(&mut self) {
        info!("[Calibration] Collecting resting baselines");

        let samples = self.config.baseline_samples.max(1);
        for channel in self.channels.iter_mut() {
            let mut sum: u64 = 0;
            for _ in 0..samples {
                sum += self.touch.read(channel.id()) as u64;
                self.clock.delay_ms(self.config.baseline_interval_ms);
            }

            let baseline = (sum / samples as u64) as u32;
            channel.set_baseline(baseline);
            info!(
                "[Calibration] Channel {}: baseline = {}",
                channel.name(),
                baseline
            );
        }

        if self.session.is_active() {
            warn!("[Calibration] Baselines recollected mid-session; restarting captures");
            self.session.begin(self.clock.now_ms());
        }
    }

    /// Open an interactive calibration session
    ///
    /// Resets captures, collects fresh baselines and starts the timeout
    /// clock once the baselines are in.
    ///
    /// # Returns
    /// * `Ok(())` - Session started
    /// * `Err(CalibrationError::AlreadyInProgress)` - A session is running; it is left untouched
    pub fn start_interactive_calibration(&mut self) -> Result<(), CalibrationError> {
        if self.session.is_active() {
            warn!("[Calibration] Start ignored: session already active");
            return Err(CalibrationError::AlreadyInProgress);
        }

        info!("[Calibration] Starting interactive calibration");
        self.collect_baseline();
        self.session.begin(self.clock.now_ms());

        info!("[Calibration] Strike each pad to calibrate it");
        Ok(())
    }

    /// Advance the interactive session by one capture pass
    ///
    /// # Returns
    /// `true` exactly on the call in which the session ends (all channels
    /// calibrated, or timeout); `false` while in progress or when no
    /// session is active.
    pub fn poll_interactive_calibration(&mut self) -> bool {
        if !self.session.is_active() {
            return false;
        }

        // Timeout preempts captures that would land on this poll
        let now = self.clock.now_ms();
        if self.session.is_timed_out(now, self.config.timeout_ms) {
            warn!(
                "[Calibration] Timed out after {} ms with {}/{} channels calibrated",
                self.session.elapsed_ms(now),
                self.session.completed(),
                CHANNEL_COUNT
            );
            self.finalize(CalibrationOutcome::TimedOut);
            return true;
        }

        self.capture_pass();

        if self.session.completed() >= CHANNEL_COUNT {
            self.finalize(CalibrationOutcome::Completed);
            return true;
        }

        false
    }

    /// Read every uncalibrated channel once and apply the capture rule
    fn capture_pass(&mut self) {
        let trigger_percent = self.config.trigger_percent;

        for channel in self.channels.iter_mut() {
            if channel.is_calibrated() {
                continue;
            }

            let reading = self.touch.read(channel.id());
            match channel.observe(reading, trigger_percent) {
                CaptureEvent::Ignored => {}
                CaptureEvent::Captured(count) => {
                    debug!(
                        "[Calibration] Capture {} for channel {} (reading {})",
                        count,
                        channel.name(),
                        reading
                    );
                }
                CaptureEvent::Calibrated => {
                    let completed = self.session.record_completion();
                    info!(
                        "[Calibration] Channel {} calibrated. Total: {}/{}",
                        channel.name(),
                        completed,
                        CHANNEL_COUNT
                    );
                }
            }
        }
    }

    fn finalize(&mut self, outcome: CalibrationOutcome) {
        self.calculate_thresholds();
        self.session.end();
        self.last_outcome = Some(outcome);
        info!("[Calibration] Interactive calibration finished: {:?}", outcome);
    }

    /// Derive every channel's threshold from its calibration state
    ///
    /// Calibrated channels get `(baseline + mean(captures)) / 2`; the rest
    /// fall back to `baseline * fallback_percent / 100`.
    pub fn calculate_thresholds(&mut self) {
        let fallback_percent = self.config.fallback_percent;

        for channel in self.channels.iter_mut() {
            let threshold = channel.finalize_threshold(fallback_percent);
            if channel.is_calibrated() {
                info!(
                    "[Calibration] Channel {}: threshold = {}",
                    channel.name(),
                    threshold
                );
            } else {
                info!(
                    "[Calibration] Channel {}: fallback threshold = {}",
                    channel.name(),
                    threshold
                );
            }
        }
    }

    /// Run a full calibration in one blocking call
    ///
    /// Baseline, then capture passes every `capture_poll_interval_ms` until
    /// all channels calibrate or the timeout elapses, then thresholds.
    ///
    /// # Returns
    /// * `Ok(CalibrationOutcome)` - How the calibration ended
    /// * `Err(CalibrationError::AlreadyInProgress)` - An interactive session is running
    pub fn calibrate_blocking(&mut self) -> Result<CalibrationOutcome, CalibrationError> {
        self.start_interactive_calibration()?;

        while !self.poll_interactive_calibration() {
            self.clock.delay_ms(self.config.capture_poll_interval_ms);
        }

        Ok(self.last_outcome.unwrap_or(CalibrationOutcome::TimedOut))
    }

    /// Measure each channel's resting mean over `resting_mean_duration_ms`
    pub fn measure_resting_means(&mut self) {
        let duration = self.config.resting_mean_duration_ms;
        let interval = self.config.resting_mean_interval_ms.max(1);
        let max_reads = duration / interval + 1;

        for channel in self.channels.iter_mut() {
            let start = self.clock.now_ms();
            let mut sum = 0.0f64;
            let mut reads = 0u64;

            while self.clock.now_ms().saturating_sub(start) < duration && reads < max_reads {
                sum += self.touch.read(channel.id()) as f64;
                reads += 1;
                self.clock.delay_ms(interval);
            }

            if reads == 0 {
                sum = self.touch.read(channel.id()) as f64;
                reads = 1;
            }

            let mean = (sum / reads as f64) as f32;
            channel.set_resting_mean(mean);
            info!(
                "[Calibration] Channel {}: resting mean = {:.2}",
                channel.name(),
                mean
            );
        }
    }

    /// Let resting means follow slow drift
    ///
    /// # Returns
    /// Number of channels whose mean moved
    pub fn adjust_references(&mut self) -> usize {
        let tolerance = self.config.drift_tolerance;
        let smoothing = self.config.drift_smoothing;

        let mut adjusted = 0;
        for channel in self.channels.iter_mut() {
            let reading = self.touch.read(channel.id());
            if channel.track_drift(reading, tolerance, smoothing) {
                adjusted += 1;
            }
        }
        adjusted
    }

    /// First channel in scan order whose reading exceeds its threshold
    pub fn detect_touch(&mut self) -> Option<ChannelId> {
        for channel in self.channels.iter() {
            if self.touch.read(channel.id()) > channel.threshold() {
                return Some(channel.id());
            }
        }
        None
    }

    /// Current raw reading of one channel
    pub fn read_channel(&mut self, index: usize) -> Result<u32, CalibrationError> {
        let id = Self::channel_id(index)?;
        Ok(self.touch.read(id))
    }

    fn channel_id(index: usize) -> Result<ChannelId, CalibrationError> {
        ChannelId::from_index(index).ok_or(CalibrationError::ChannelOutOfRange {
            index,
            channels: CHANNEL_COUNT,
        })
    }

    fn channel_at(&self, index: usize) -> Result<&SensorChannel, CalibrationError> {
        let id = Self::channel_id(index)?;
        Ok(&self.channels[id.index()])
    }

    pub fn baseline(&self, index: usize) -> Result<u32, CalibrationError> {
        self.channel_at(index).map(SensorChannel::baseline)
    }

    pub fn threshold(&self, index: usize) -> Result<u32, CalibrationError> {
        self.channel_at(index).map(SensorChannel::threshold)
    }

    pub fn is_calibrated(&self, index: usize) -> Result<bool, CalibrationError> {
        self.channel_at(index).map(SensorChannel::is_calibrated)
    }

    pub fn channel_name(&self, index: usize) -> Result<&'static str, CalibrationError> {
        self.channel_at(index).map(SensorChannel::name)
    }

    pub fn channel(&self, id: ChannelId) -> &SensorChannel {
        &self.channels[id.index()]
    }

    pub fn channels(&self) -> &[SensorChannel] {
        &self.channels
    }

    pub fn session(&self) -> &CalibrationSession {
        &self.session
    }

    pub fn is_session_active(&self) -> bool {
        self.session.is_active()
    }

    pub fn last_outcome(&self) -> Option<CalibrationOutcome> {
        self.last_outcome
    }

    /// Snapshot for the sync/display collaborators
    pub fn progress(&self) -> CalibrationProgress {
        CalibrationProgress {
            completed: self.session.completed(),
            total: CHANNEL_COUNT,
            active: self.session.is_active(),
            outcome: self.last_outcome,
            calibrated: self.channels.each_ref().map(SensorChannel::is_calibrated),
        }
    }

    pub fn config(&self) -> &CalibrationConfig {
        &self.config
    }

    /// Mutable access to the reading source (simulators and tests)
    pub fn touch_mut(&mut self) -> &mut T {
        &mut self.touch
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ManualClock, SimulatedTouchPanel};

    fn engine(panel: SimulatedTouchPanel) -> TouchCalibrationEngine<SimulatedTouchPanel, ManualClock> {
        TouchCalibrationEngine::new(panel, ManualClock::new(), CalibrationConfig::default())
            .unwrap()
    }

    fn quiet_panel() -> SimulatedTouchPanel {
        SimulatedTouchPanel::new(11).with_noise(0)
    }

    #[test]
    fn test_new_uses_default_thresholds() {
        let engine = engine(quiet_panel());
        assert_eq!(engine.threshold(0).unwrap(), 20_000);
        assert_eq!(engine.threshold(5).unwrap(), 7_000);
        assert!(!engine.is_session_active());
        assert_eq!(engine.last_outcome(), None);
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = CalibrationConfig::default();
        config.baseline_samples = 0;
        let result = TouchCalibrationEngine::new(quiet_panel(), ManualClock::new(), config);
        assert!(matches!(result, Err(CalibrationError::InvalidConfig { .. })));
    }

    #[test]
    fn test_collect_baseline_averages_readings() {
        let mut resting = [1_000; CHANNEL_COUNT];
        resting[3] = 640;
        let mut engine = engine(quiet_panel().with_resting(resting));

        engine.collect_baseline();

        assert_eq!(engine.baseline(0).unwrap(), 1_000);
        assert_eq!(engine.baseline(3).unwrap(), 640);
        for index in 0..CHANNEL_COUNT {
            assert!(!engine.is_calibrated(index).unwrap());
        }
        // 9 channels * 50 reads * 20 ms
        assert_eq!(engine.clock().now_ms(), 9_000);
    }

    #[test]
    fn test_start_twice_is_rejected_without_side_effects() {
        let mut engine = engine(quiet_panel());
        engine.start_interactive_calibration().unwrap();
        let start = engine.session().start_time_ms();

        engine.touch_mut().press(ChannelId::Center);
        engine.poll_interactive_calibration();
        let captures = engine.channel(ChannelId::Center).capture_count();

        assert_eq!(
            engine.start_interactive_calibration(),
            Err(CalibrationError::AlreadyInProgress)
        );
        assert_eq!(engine.session().start_time_ms(), start);
        assert_eq!(engine.channel(ChannelId::Center).capture_count(), captures);
    }

    #[test]
    fn test_session_starts_after_baseline() {
        let mut engine = engine(quiet_panel());
        engine.start_interactive_calibration().unwrap();
        assert_eq!(engine.session().start_time_ms(), 9_000);
        assert!(engine.is_session_active());
    }

    #[test]
    fn test_poll_without_session_returns_false() {
        let mut engine = engine(quiet_panel());
        assert!(!engine.poll_interactive_calibration());
    }

    #[test]
    fn test_channel_calibrates_on_capture_after_full_buffer() {
        let mut engine = engine(quiet_panel());
        engine.start_interactive_calibration().unwrap();
        engine.touch_mut().press(ChannelId::FrontLow);

        for _ in 0..10 {
            assert!(!engine.poll_interactive_calibration());
        }
        assert_eq!(engine.channel(ChannelId::FrontLow).capture_count(), 10);
        assert!(!engine.is_calibrated(1).unwrap());

        assert!(!engine.poll_interactive_calibration());
        assert!(engine.is_calibrated(1).unwrap());
        assert_eq!(engine.progress().completed, 1);
    }

    #[test]
    fn test_all_channels_complete() {
        let mut engine = engine(quiet_panel());
        engine.start_interactive_calibration().unwrap();
        engine.touch_mut().press_all_except(&[]);

        let mut finished_on = None;
        for poll in 1..=20 {
            if engine.poll_interactive_calibration() {
                finished_on = Some(poll);
                break;
            }
        }

        assert_eq!(finished_on, Some(11));
        assert!(!engine.is_session_active());
        assert_eq!(engine.last_outcome(), Some(CalibrationOutcome::Completed));
        assert_eq!(engine.progress().completed, CHANNEL_COUNT);
        // (1000 + 1450) / 2
        for index in 0..CHANNEL_COUNT {
            assert_eq!(engine.threshold(index).unwrap(), 1_225);
        }
        // Completion is reported once
        assert!(!engine.poll_interactive_calibration());
    }

    #[test]
    fn test_timeout_finalizes_with_fallback() {
        let mut engine = engine(quiet_panel());
        engine.start_interactive_calibration().unwrap();
        let start = engine.session().start_time_ms();

        engine.clock().set(start + 60_000);
        assert!(!engine.poll_interactive_calibration());

        engine.clock().set(start + 60_001);
        assert!(engine.poll_interactive_calibration());
        assert_eq!(engine.last_outcome(), Some(CalibrationOutcome::TimedOut));
        for index in 0..CHANNEL_COUNT {
            assert_eq!(engine.threshold(index).unwrap(), 1_200);
        }
    }

    #[test]
    fn test_timeout_preempts_pending_capture() {
        let mut engine = engine(quiet_panel());
        engine.start_interactive_calibration().unwrap();
        let start = engine.session().start_time_ms();
        engine.touch_mut().press(ChannelId::Center);

        for _ in 0..10 {
            engine.poll_interactive_calibration();
        }
        engine.clock().set(start + 60_001);

        // The poll that would calibrate Center hits the timeout first
        assert!(engine.poll_interactive_calibration());
        assert!(!engine.is_calibrated(ChannelId::Center.index()).unwrap());
        assert_eq!(engine.threshold(ChannelId::Center.index()).unwrap(), 1_200);
    }

    #[test]
    fn test_detect_touch_first_match_wins() {
        let mut engine = engine(quiet_panel());
        engine.start_interactive_calibration().unwrap();
        engine.clock().advance(60_001);
        engine.poll_interactive_calibration();

        assert_eq!(engine.detect_touch(), None);

        engine.touch_mut().press(ChannelId::Center);
        engine.touch_mut().press(ChannelId::RightLow);
        assert_eq!(engine.detect_touch(), Some(ChannelId::RightLow));

        engine.touch_mut().release(ChannelId::RightLow);
        assert_eq!(engine.detect_touch(), Some(ChannelId::Center));
    }

    #[test]
    fn test_accessors_reject_out_of_range() {
        let mut engine = engine(quiet_panel());
        let expected = CalibrationError::ChannelOutOfRange {
            index: CHANNEL_COUNT,
            channels: CHANNEL_COUNT,
        };

        assert_eq!(engine.baseline(CHANNEL_COUNT), Err(expected.clone()));
        assert_eq!(engine.threshold(CHANNEL_COUNT), Err(expected.clone()));
        assert_eq!(engine.is_calibrated(CHANNEL_COUNT), Err(expected.clone()));
        assert_eq!(engine.channel_name(CHANNEL_COUNT), Err(expected.clone()));
        assert_eq!(engine.read_channel(CHANNEL_COUNT), Err(expected));

        assert_eq!(engine.channel_name(8), Ok("CENTER"));
        assert_eq!(engine.is_calibrated(0), Ok(false));
    }

    #[test]
    fn test_calibrate_blocking_times_out_for_untouched_pad() {
        // Pads are struck only once the 9 s of baseline collection is over
        let clock = ManualClock::new();
        let probe = clock.clone();
        let touch = move |id: ChannelId| -> u32 {
            if probe.now_ms() >= 9_000 && id != ChannelId::BackHigh {
                1_450
            } else {
                1_000
            }
        };
        let mut engine =
            TouchCalibrationEngine::new(touch, clock, CalibrationConfig::default()).unwrap();

        let outcome = engine.calibrate_blocking().unwrap();

        assert_eq!(outcome, CalibrationOutcome::TimedOut);
        assert_eq!(engine.progress().completed, CHANNEL_COUNT - 1);
        assert!(!engine.is_calibrated(ChannelId::BackHigh.index()).unwrap());
        assert_eq!(engine.threshold(ChannelId::BackHigh.index()).unwrap(), 1_200);
        assert_eq!(engine.threshold(ChannelId::FrontHigh.index()).unwrap(), 1_225);
    }

    #[test]
    fn test_baseline_mid_session_restarts_capture() {
        let mut engine = engine(quiet_panel());
        engine.start_interactive_calibration().unwrap();
        engine.touch_mut().press(ChannelId::FrontHigh);
        for _ in 0..11 {
            engine.poll_interactive_calibration();
        }
        assert!(engine.is_calibrated(0).unwrap());
        assert_eq!(engine.progress().completed, 1);

        engine.touch_mut().release_all();
        engine.collect_baseline();
        assert!(engine.is_session_active());
        assert_eq!(engine.progress().completed, 0);
        assert_eq!(engine.channel(ChannelId::FrontHigh).capture_count(), 0);
        assert_eq!(engine.session().start_time_ms(), engine.clock().now_ms());

        engine.touch_mut().press_all_except(&[]);
        let mut polls = 1;
        while !engine.poll_interactive_calibration() {
            polls += 1;
            assert!(polls < 20, "calibration never completed");
        }
        assert_eq!(polls, 11);

        let progress = engine.progress();
        assert_eq!(progress.outcome, Some(CalibrationOutcome::Completed));
        assert_eq!(progress.completed, CHANNEL_COUNT);
        assert_eq!(progress.percentage(), 100);
        assert!(progress.calibrated.iter().all(|&c| c));
    }

    #[test]
    fn test_pad_held_during_rebaseline_is_not_counted() {
        let mut engine = engine(quiet_panel());
        engine.start_interactive_calibration().unwrap();
        engine.touch_mut().press(ChannelId::FrontHigh);
        for _ in 0..11 {
            engine.poll_interactive_calibration();
        }

        // FrontHigh stays pressed, so its new baseline is the pressed level
        engine.collect_baseline();
        engine.touch_mut().press_all_except(&[]);

        let mut polls = 1;
        while !engine.poll_interactive_calibration() {
            engine.clock().advance(100);
            polls += 1;
            assert!(polls < 1_000, "session never ended");
        }

        let progress = engine.progress();
        assert_eq!(progress.outcome, Some(CalibrationOutcome::TimedOut));
        assert_eq!(progress.completed, CHANNEL_COUNT - 1);
        assert!(!engine.is_calibrated(0).unwrap());
        assert_eq!(engine.threshold(0).unwrap(), 1_450 * 120 / 100);
    }

    #[test]
    fn test_resting_means_and_drift() {
        let mut engine = engine(quiet_panel());
        engine.measure_resting_means();
        assert!((engine.channel(ChannelId::FrontHigh).resting_mean() - 1_000.0).abs() < 1e-3);

        // Resting readings within tolerance keep the mean in place
        assert_eq!(engine.adjust_references(), CHANNEL_COUNT);

        // A strike is far outside the drift tolerance
        engine.touch_mut().press(ChannelId::FrontHigh);
        assert_eq!(engine.adjust_references(), CHANNEL_COUNT - 1);
        assert!((engine.channel(ChannelId::FrontHigh).resting_mean() - 1_000.0).abs() < 1e-3);
    }
}
