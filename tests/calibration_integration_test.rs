//! Integration tests for the touch calibration workflow
//!
//! These tests drive the engine through its public API only:
//! - Baseline collection and session start
//! - Interactive capture until completion or timeout
//! - Threshold derivation for calibrated and fallback channels
//! - Touch detection scan order

use punch_trainer::calibration::{CalibrationOutcome, ChannelId, CHANNEL_COUNT};
use punch_trainer::config::CalibrationConfig;
use punch_trainer::error::CalibrationError;
use punch_trainer::hal::{Clock, TouchSource};
use punch_trainer::testing::{ManualClock, SimulatedTouchPanel};
use punch_trainer::TouchCalibrationEngine;

fn engine<T: TouchSource>(touch: T, clock: &ManualClock) -> TouchCalibrationEngine<T, ManualClock> {
    TouchCalibrationEngine::new(touch, clock.clone(), CalibrationConfig::default())
        .expect("default config is valid")
}

/// Poll the way the device loop does until the session ends
fn run_session<T: TouchSource>(
    engine: &mut TouchCalibrationEngine<T, ManualClock>,
    clock: &ManualClock,
) -> usize {
    let mut polls = 1;
    while !engine.poll_interactive_calibration() {
        clock.advance(100);
        polls += 1;
        assert!(polls < 1_000, "session never ended");
    }
    polls
}

/// All pads struck repeatedly: every channel calibrates, no fallbacks
#[test]
fn test_all_channels_calibrate() {
    let clock = ManualClock::new();
    let mut engine = engine(SimulatedTouchPanel::new(3).with_noise(0), &clock);

    engine.start_interactive_calibration().unwrap();
    engine.touch_mut().press_all_except(&[]);

    // Ten captures, then the eleventh trigger calibrates
    let polls = run_session(&mut engine, &clock);
    assert_eq!(polls, 11);

    let progress = engine.progress();
    assert_eq!(progress.completed, CHANNEL_COUNT);
    assert_eq!(progress.outcome, Some(CalibrationOutcome::Completed));
    assert!(progress.is_complete());
    assert!(!progress.active);

    for index in 0..CHANNEL_COUNT {
        assert!(engine.is_calibrated(index).unwrap());
        // (1000 + 1450) / 2
        assert_eq!(engine.threshold(index).unwrap(), 1225);
    }
}

/// Strikes that only register half the time still complete, just later
#[test]
fn test_intermittent_strikes_calibrate_more_slowly() {
    let clock = ManualClock::new();
    let panel = SimulatedTouchPanel::new(17).with_press_probability(0.5);
    let mut engine = engine(panel, &clock);

    engine.start_interactive_calibration().unwrap();
    engine.touch_mut().press_all_except(&[]);

    let polls = run_session(&mut engine, &clock);
    assert!(polls > 11, "finished in {} polls", polls);
    assert_eq!(engine.last_outcome(), Some(CalibrationOutcome::Completed));

    for channel in engine.channels() {
        let mean = channel.capture_mean().unwrap();
        assert!(mean > channel.baseline() * 125 / 100);
        assert_eq!(channel.threshold(), (channel.baseline() + mean) / 2);
    }
}

/// Recollecting baselines mid-session starts the capture count over
#[test]
fn test_rebaseline_during_session_keeps_count_consistent() {
    let clock = ManualClock::new();
    let mut engine = engine(SimulatedTouchPanel::new(23).with_noise(0), &clock);

    engine.start_interactive_calibration().unwrap();
    engine.touch_mut().press(ChannelId::FrontHigh);
    for _ in 0..11 {
        engine.poll_interactive_calibration();
    }
    assert_eq!(engine.progress().completed, 1);

    engine.touch_mut().release_all();
    engine.collect_baseline();
    engine.touch_mut().press_all_except(&[]);

    assert_eq!(run_session(&mut engine, &clock), 11);
    let progress = engine.progress();
    assert_eq!(progress.outcome, Some(CalibrationOutcome::Completed));
    assert_eq!(progress.completed, CHANNEL_COUNT);
    assert_eq!(progress.percentage(), 100);
}

/// Three pads never struck: timeout, fallback thresholds for those three
#[test]
fn test_untouched_channels_fall_back_after_timeout() {
    let clock = ManualClock::new();
    let untouched = [ChannelId::RightLow, ChannelId::BackHigh, ChannelId::Center];
    let mut engine = engine(SimulatedTouchPanel::new(11), &clock);

    engine.start_interactive_calibration().unwrap();
    let start = engine.session().start_time_ms();
    engine.touch_mut().press_all_except(&untouched);

    run_session(&mut engine, &clock);

    assert_eq!(engine.last_outcome(), Some(CalibrationOutcome::TimedOut));
    assert!(clock.now_ms() - start > 60_000);
    assert_eq!(engine.progress().completed, 6);

    for channel in engine.channels() {
        if untouched.contains(&channel.id()) {
            assert!(!channel.is_calibrated());
            assert_eq!(channel.threshold(), channel.baseline() * 120 / 100);
        } else {
            assert!(channel.is_calibrated());
            let mean = channel.capture_mean().unwrap();
            assert_eq!(channel.threshold(), (channel.baseline() + mean) / 2);
        }
    }
}

/// Baseline 1000 and captures averaging 1454 give a threshold of 1227
#[test]
fn test_threshold_is_midpoint_of_baseline_and_captures() {
    let clock = ManualClock::new();
    let probe = clock.clone();
    // Resting during the 9 s baseline, then a steady strike on FRONT HIGH
    let touch = move |id: ChannelId| -> u32 {
        if probe.now_ms() >= 9_000 && id == ChannelId::FrontHigh {
            1_454
        } else {
            1_000
        }
    };
    let mut engine = engine(touch, &clock);

    engine.start_interactive_calibration().unwrap();
    run_session(&mut engine, &clock);

    let front = engine.channel(ChannelId::FrontHigh);
    assert!(front.is_calibrated());
    assert_eq!(front.baseline(), 1_000);
    assert_eq!(front.capture_mean(), Some(1_454));
    assert_eq!(front.threshold(), 1_227);

    // Everything else timed out onto 1000 * 1.2
    for index in 1..CHANNEL_COUNT {
        assert_eq!(engine.threshold(index).unwrap(), 1_200);
    }
}

#[test]
fn test_collect_baseline_clears_calibration() {
    let clock = ManualClock::new();
    let mut engine = engine(SimulatedTouchPanel::new(5).with_noise(0), &clock);
    engine.calibrate_blocking().unwrap();
    engine.collect_baseline();

    for index in 0..CHANNEL_COUNT {
        assert_eq!(engine.baseline(index).unwrap(), 1_000);
        assert!(!engine.is_calibrated(index).unwrap());
    }
}

#[test]
fn test_second_start_is_rejected() {
    let clock = ManualClock::new();
    let mut engine = engine(SimulatedTouchPanel::new(5), &clock);

    engine.start_interactive_calibration().unwrap();
    let started_at = engine.session().start_time_ms();

    assert_eq!(
        engine.start_interactive_calibration(),
        Err(CalibrationError::AlreadyInProgress)
    );
    assert!(engine.is_session_active());
    assert_eq!(engine.session().start_time_ms(), started_at);
}

#[test]
fn test_detect_touch_reports_lowest_index() {
    let clock = ManualClock::new();
    let mut engine = engine(SimulatedTouchPanel::new(9).with_noise(0), &clock);
    engine.start_interactive_calibration().unwrap();
    engine.touch_mut().press_all_except(&[]);
    run_session(&mut engine, &clock);

    engine.touch_mut().release_all();
    assert_eq!(engine.detect_touch(), None);

    engine.touch_mut().press(ChannelId::BackHigh);
    engine.touch_mut().press(ChannelId::RightLow);
    assert_eq!(engine.detect_touch(), Some(ChannelId::RightLow));
}

#[test]
fn test_out_of_range_channel_is_an_error() {
    let clock = ManualClock::new();
    let mut engine = engine(SimulatedTouchPanel::new(1), &clock);

    assert_eq!(
        engine.read_channel(CHANNEL_COUNT),
        Err(CalibrationError::ChannelOutOfRange {
            index: CHANNEL_COUNT,
            channels: CHANNEL_COUNT,
        })
    );
    assert!(engine.threshold(42).is_err());
    assert_eq!(engine.channel_name(8).unwrap(), "CENTER");
}
