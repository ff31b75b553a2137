// Force estimation - accelerometer magnitude to punch force
//
// Module organization:
// - window: circular sample buffer with running mean
// - spectrum: Hamming-windowed FFT and magnitude summation
// - peak: hysteresis peak tracker over energy values
// - pipeline: coordinator (ForcePipeline) and measurement episodes
//
// Pipeline per motion sample:
// 1. Push resultant magnitude into the 64-sample window
// 2. Once full: subtract mean, window, FFT, sum |X[k]| for k in 1..32
// 3. During an episode, feed each energy into the peak tracker

pub mod peak;
pub mod pipeline;
pub mod spectrum;
pub mod window;

pub use peak::PeakTracker;
pub use pipeline::{EpisodeState, ForcePipeline};
pub use spectrum::SpectralEnergy;
pub use window::{ForceSampleWindow, WindowState};
