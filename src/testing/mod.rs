//! Testability harness utilities.
//!
//! Simulated touch pads, accelerometer and clock that drive the real
//! calibration and force code without hardware. Used by unit tests,
//! integration tests and the `punch_cli` simulator.

pub mod fixtures;

pub use fixtures::{ImpactProfile, ManualClock, ScriptedMotion, SimulatedTouchPanel, SyntheticMotion};
