// ForceSampleWindow - circular buffer of motion magnitudes
//
// Keeps the most recent `capacity` samples plus a running sum so the mean
// is updated in O(1): the displaced sample is subtracted and the new one
// added, the buffer is never rescanned.

/// Fill state of the window
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum WindowState {
    /// No samples since construction or reset
    Empty,
    /// Some samples, fewer than capacity
    Filling,
    /// Filled at least once; every push displaces the oldest sample
    SteadyState,
}

#[derive(Debug, Clone)]
pub struct ForceSampleWindow {
    samples: Vec<f64>,
    next: usize,
    filled: usize,
    sum: f64,
}

impl ForceSampleWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: vec![0.0; capacity],
            next: 0,
            filled: 0,
            sum: 0.0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    /// Samples currently held (saturates at capacity)
    pub fn len(&self) -> usize {
        self.filled
    }

    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    pub fn is_full(&self) -> bool {
        self.filled == self.capacity()
    }

    pub fn state(&self) -> WindowState {
        if self.filled == 0 {
            WindowState::Empty
        } else if self.is_full() {
            WindowState::SteadyState
        } else {
            WindowState::Filling
        }
    }

    /// Add a sample, displacing the oldest once full
    ///
    /// Samples must be finite; a NaN would stay in the running sum.
    ///
    /// # Returns
    /// `true` if the window is full after the push
    pub fn push(&mut self, sample: f64) -> bool {
        if self.is_full() {
            self.sum += sample - self.samples[self.next];
        } else {
            self.sum += sample;
            self.filled += 1;
        }
        self.samples[self.next] = sample;
        self.next = (self.next + 1) % self.capacity();
        self.is_full()
    }

    /// Running sum divided by capacity
    ///
    /// Equals the true mean once the window is full.
    pub fn mean(&self) -> f64 {
        self.sum / self.capacity() as f64
    }

    /// Samples from oldest to newest
    pub fn ordered(&self) -> impl Iterator<Item = f64> + '_ {
        let capacity = self.capacity();
        let start = if self.is_full() { self.next } else { 0 };
        (0..self.filled).map(move |k| self.samples[(start + k) % capacity])
    }

    pub fn reset(&mut self) {
        self.samples.iter_mut().for_each(|s| *s = 0.0);
        self.next = 0;
        self.filled = 0;
        self.sum = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_transitions() {
        let mut window = ForceSampleWindow::new(4);
        assert_eq!(window.state(), WindowState::Empty);

        assert!(!window.push(1.0));
        assert_eq!(window.state(), WindowState::Filling);

        window.push(2.0);
        window.push(3.0);
        assert!(window.push(4.0));
        assert_eq!(window.state(), WindowState::SteadyState);

        window.reset();
        assert_eq!(window.state(), WindowState::Empty);
        assert!(window.is_empty());
    }

    #[test]
    fn test_running_mean_tracks_displacement() {
        let mut window = ForceSampleWindow::new(4);
        for sample in [1.0, 2.0, 3.0, 4.0] {
            window.push(sample);
        }
        assert!((window.mean() - 2.5).abs() < 1e-12);

        // 1.0 is displaced by 9.0
        window.push(9.0);
        assert!((window.mean() - 4.5).abs() < 1e-12);
        assert_eq!(window.len(), 4);
    }

    #[test]
    fn test_ordered_oldest_first() {
        let mut window = ForceSampleWindow::new(3);
        for sample in [1.0, 2.0, 3.0, 4.0, 5.0] {
            window.push(sample);
        }
        let ordered: Vec<f64> = window.ordered().collect();
        assert_eq!(ordered, vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_ordered_while_filling() {
        let mut window = ForceSampleWindow::new(4);
        window.push(7.0);
        window.push(8.0);
        let ordered: Vec<f64> = window.ordered().collect();
        assert_eq!(ordered, vec![7.0, 8.0]);
    }
}
