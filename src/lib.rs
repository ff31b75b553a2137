// Punch Trainer Core - touch calibration and impact force estimation
// Self-calibrating capacitive pads and an FFT-based force pipeline

// Module declarations
pub mod calibration;
pub mod config;
pub mod context;
pub mod error;
pub mod force;
pub mod hal;
pub mod testing;

// Re-exports for convenience
pub use calibration::{ChannelId, TouchCalibrationEngine, CHANNEL_COUNT};
pub use config::AppConfig;
pub use context::{DeviceStatus, TrainerContext};
pub use force::ForcePipeline;

use tracing::Level;

/// Install the fmt subscriber for host builds (CLI, tests)
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging(level: Level) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init();
}
