// PeakTracker - running maximum with rising/falling hysteresis

/// Hysteresis peak detector over a stream of energy values
///
/// O(1) per sample. The flag records whether the envelope is currently
/// rising; the reported value is the highest energy since the last reset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakTracker {
    current_max: f64,
    rising: bool,
}

impl Default for PeakTracker {
    fn default() -> Self {
        Self {
            current_max: 0.0,
            rising: true,
        }
    }
}

impl PeakTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one energy value and return the running maximum
    pub fn update(&mut self, energy: f64) -> f64 {
        if self.rising && energy < self.current_max {
            self.rising = false;
        } else if !self.rising && energy > self.current_max {
            self.rising = true;
        }

        if energy > self.current_max {
            self.current_max = energy;
        }

        self.current_max
    }

    pub fn current_max(&self) -> f64 {
        self.current_max
    }

    pub fn is_rising(&self) -> bool {
        self.rising
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
