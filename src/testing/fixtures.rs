//! Deterministic sensor sources for tests and the CLI simulator.
//!
//! The calibration engine and force pipeline only see the `hal` traits, so
//! these sources can stand in for the touch pads, the accelerometer and the
//! clock. Noise comes from a seeded `StdRng` so every run is reproducible.

use rand::{rngs::StdRng, Rng, SeedableRng};
use std::cell::Cell;
use std::f64::consts::PI;
use std::rc::Rc;

use crate::calibration::{ChannelId, CHANNEL_COUNT};
use crate::hal::{Clock, MotionSample, MotionSource, TouchSource};

/// Clock that only moves when told to, or when the core calls `delay_ms`
///
/// Clones share the same time, so a test can keep a handle while the
/// engine owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(ms: u64) -> Self {
        let clock = Self::default();
        clock.set(ms);
        clock
    }

    pub fn set(&self, ms: u64) {
        self.now.set(ms);
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }

    fn delay_ms(&mut self, ms: u64) {
        self.advance(ms);
    }
}

/// Simulated capacitive pad bank
///
/// Idle pads read their resting level plus a little noise. A pressed pad
/// reads well above its trigger level on each read with probability
/// `press_probability`, which mimics a user striking it repeatedly.
#[derive(Debug, Clone)]
pub struct SimulatedTouchPanel {
    resting: [u32; CHANNEL_COUNT],
    pressed: [bool; CHANNEL_COUNT],
    noise: u32,
    press_gain_percent: u32,
    press_probability: f64,
    rng: StdRng,
}

impl SimulatedTouchPanel {
    pub fn new(seed: u64) -> Self {
        Self {
            resting: [1_000; CHANNEL_COUNT],
            pressed: [false; CHANNEL_COUNT],
            noise: 5,
            press_gain_percent: 45,
            press_probability: 1.0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn with_resting(mut self, resting: [u32; CHANNEL_COUNT]) -> Self {
        self.resting = resting;
        self
    }

    pub fn with_noise(mut self, noise: u32) -> Self {
        self.noise = noise;
        self
    }

    pub fn with_press_probability(mut self, probability: f64) -> Self {
        self.press_probability = probability.clamp(0.0, 1.0);
        self
    }

    pub fn press(&mut self, channel: ChannelId) {
        self.pressed[channel.index()] = true;
    }

    pub fn release(&mut self, channel: ChannelId) {
        self.pressed[channel.index()] = false;
    }

    pub fn release_all(&mut self) {
        self.pressed = [false; CHANNEL_COUNT];
    }

    /// Press every pad not listed in `untouched`
    pub fn press_all_except(&mut self, untouched: &[ChannelId]) {
        for id in ChannelId::ALL {
            self.pressed[id.index()] = !untouched.contains(&id);
        }
    }

    pub fn resting(&self, channel: ChannelId) -> u32 {
        self.resting[channel.index()]
    }
}

impl TouchSource for SimulatedTouchPanel {
    fn read(&mut self, channel: ChannelId) -> u32 {
        let i = channel.index();
        let resting = self.resting[i];
        let jitter = if self.noise > 0 {
            self.rng.gen_range(0..=self.noise * 2) as i64 - self.noise as i64
        } else {
            0
        };
        let mut value = resting as i64 + jitter;

        if self.pressed[i] && self.rng.gen_bool(self.press_probability) {
            value += (resting as u64 * self.press_gain_percent as u64 / 100) as i64;
        }

        value.max(0) as u32
    }
}

/// Impact added on top of the resting accelerometer signal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpactProfile {
    /// Sample index where the impact starts
    pub start_sample: u64,
    /// Peak acceleration of the impact in g
    pub peak_g: f64,
    /// Ringing frequency of the bag in Hz
    pub frequency_hz: f64,
    /// Exponential decay constant in samples
    pub decay_samples: f64,
}

/// Synthetic accelerometer: gravity on Z, uniform noise and optional impacts
#[derive(Debug, Clone)]
pub struct SyntheticMotion {
    sample_rate_hz: f64,
    noise_g: f64,
    impacts: Vec<ImpactProfile>,
    sample_index: u64,
    rng: StdRng,
}

impl SyntheticMotion {
    pub fn new(seed: u64, sample_rate_hz: f64) -> Self {
        Self {
            sample_rate_hz,
            noise_g: 0.01,
            impacts: Vec::new(),
            sample_index: 0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn with_noise(mut self, noise_g: f64) -> Self {
        self.noise_g = noise_g.max(0.0);
        self
    }

    pub fn with_impact(mut self, impact: ImpactProfile) -> Self {
        self.impacts.push(impact);
        self
    }

    /// Samples produced so far
    pub fn sample_index(&self) -> u64 {
        self.sample_index
    }

    fn impact_at(&self, index: u64) -> f64 {
        self.impacts
            .iter()
            .filter(|impact| index >= impact.start_sample)
            .map(|impact| {
                let t = (index - impact.start_sample) as f64;
                let envelope = (-t / impact.decay_samples.max(1.0)).exp();
                let phase = 2.0 * PI * impact.frequency_hz * t / self.sample_rate_hz;
                impact.peak_g * envelope * phase.cos()
            })
            .sum()
    }
}

impl MotionSource for SyntheticMotion {
    fn read_motion(&mut self) -> MotionSample {
        let index = self.sample_index;
        self.sample_index += 1;

        let mut noise = || {
            if self.noise_g > 0.0 {
                self.rng.gen_range(-self.noise_g..=self.noise_g)
            } else {
                0.0
            }
        };
        let (nx, ny, nz) = (noise(), noise(), noise());

        MotionSample::new(nx + self.impact_at(index), ny, 1.0 + nz)
    }
}

/// Replays a fixed list of magnitudes (on the Z axis), holding the last one
#[derive(Debug, Clone)]
pub struct ScriptedMotion {
    magnitudes: Vec<f64>,
    position: usize,
}

impl ScriptedMotion {
    pub fn new(magnitudes: Vec<f64>) -> Self {
        Self {
            magnitudes,
            position: 0,
        }
    }
}

impl MotionSource for ScriptedMotion {
    fn read_motion(&mut self) -> MotionSample {
        let value = match self.magnitudes.get(self.position) {
            Some(&value) => {
                self.position += 1;
                value
            }
            None => self.magnitudes.last().copied().unwrap_or(0.0),
        };
        MotionSample::new(0.0, 0.0, value)
    }
}
