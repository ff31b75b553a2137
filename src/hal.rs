// Hardware seams - touch pads, motion sensor and time
//
// The calibration engine and the force pipeline never talk to hardware
// directly. They are generic over these traits so the same logic runs on
// the device, in the CLI simulator and in tests with a manual clock.

use std::thread;
use std::time::{Duration, Instant};

use crate::calibration::ChannelId;

/// Raw reading source for the capacitive touch channels
///
/// Readings are non-negative and increase under sustained contact.
pub trait TouchSource {
    fn read(&mut self, channel: ChannelId) -> u32;
}

impl<F> TouchSource for F
where
    F: FnMut(ChannelId) -> u32,
{
    fn read(&mut self, channel: ChannelId) -> u32 {
        self(channel)
    }
}

/// One 3-axis accelerometer reading in g
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotionSample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl MotionSample {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Resultant magnitude of the three axes
    #[inline]
    pub fn resultant(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// Motion sensor producing one sample per call
pub trait MotionSource {
    fn read_motion(&mut self) -> MotionSample;
}

/// Monotonic millisecond clock with a blocking delay
///
/// `delay_ms` is the only way the core waits, so a simulated clock can
/// advance time instead of sleeping.
pub trait Clock {
    /// Milliseconds since an arbitrary fixed origin
    fn now_ms(&self) -> u64;

    /// Block for `ms` milliseconds
    fn delay_ms(&mut self, ms: u64);
}

/// Wall clock backed by `Instant` and `thread::sleep`
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    fn delay_ms(&mut self, ms: u64) {
        if ms > 0 {
            thread::sleep(Duration::from_millis(ms));
        }
    }
}
