// SpectralEnergy - windowed FFT magnitude sum
//
// Algorithm per call:
// 1. Subtract the window mean (removes the 1 g gravity offset)
// 2. Apply a Hamming window to reduce spectral leakage
// 3. Forward FFT of the real sequence
// 4. Magnitude |X[k]| for k in 1..N/2 (DC bin and Nyquist excluded)
// 5. Energy = sum of those magnitudes

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// Spectral energy estimator for a fixed transform size
pub struct SpectralEnergy {
    fft: Arc<dyn Fft<f64>>,
    size: usize,
    /// Hamming window (pre-computed)
    window: Vec<f64>,
    buffer: Vec<Complex<f64>>,
    scratch: Vec<Complex<f64>>,
    /// Magnitudes of the last transform, bins 0..N/2
    magnitudes: Vec<f64>,
}

impl SpectralEnergy {
    /// Create an estimator for `size`-point transforms
    ///
    /// The FFT is planned once here and reused for every sample.
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        let scratch_len = fft.get_inplace_scratch_len();

        let window = (0..size)
            .map(|i| {
                0.54 - 0.46 * ((2.0 * std::f64::consts::PI * i as f64) / (size as f64 - 1.0)).cos()
            })
            .collect();

        Self {
            fft,
            size,
            window,
            buffer: vec![Complex::new(0.0, 0.0); size],
            scratch: vec![Complex::new(0.0, 0.0); scratch_len],
            magnitudes: vec![0.0; size / 2],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Compute the energy of one window of samples
    ///
    /// # Arguments
    /// * `samples` - Oldest-to-newest samples; missing samples are zero-padded
    /// * `mean` - DC level subtracted from every sample
    pub fn energy<I>(&mut self, samples: I, mean: f64) -> f64
    where
        I: IntoIterator<Item = f64>,
    {
        self.buffer
            .iter_mut()
            .for_each(|c| *c = Complex::new(0.0, 0.0));
        for ((slot, sample), w) in self.buffer.iter_mut().zip(samples).zip(&self.window) {
            *slot = Complex::new((sample - mean) * w, 0.0);
        }

        self.fft
            .process_with_scratch(&mut self.buffer, &mut self.scratch);

        for (magnitude, bin) in self.magnitudes.iter_mut().zip(&self.buffer) {
            *magnitude = bin.norm();
        }

        self.magnitudes.iter().skip(1).sum()
    }

    /// Magnitudes from the last call to `energy`, bins 0..N/2
    pub fn magnitudes(&self) -> &[f64] {
        &self.magnitudes
    }

    /// Strongest non-DC bin of the last transform
    pub fn dominant_bin(&self) -> Option<usize> {
        self.magnitudes
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, m)| **m > 0.0)
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(bin, _)| bin)
    }

    /// Centre frequency of `bin` for a given sampling rate
    pub fn bin_frequency(&self, bin: usize, sampling_frequency_hz: f64) -> f64 {
        bin as f64 * sampling_frequency_hz / self.size as f64
    }
}
