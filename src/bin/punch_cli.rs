use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use punch_trainer::calibration::CalibrationOutcome;
use punch_trainer::hal::Clock;
use punch_trainer::testing::{ImpactProfile, ManualClock, SimulatedTouchPanel, SyntheticMotion};
use punch_trainer::{init_logging, AppConfig, ChannelId, TrainerContext};
use serde::Serialize;
use tracing::Level;

#[derive(Parser, Debug)]
#[command(
    name = "punch_cli",
    about = "Simulated bench harness for the punch trainer sensor core"
)]
struct Cli {
    /// JSON configuration file (defaults are used when omitted or invalid)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Enable debug logging
    #[arg(long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run interactive calibration against a simulated touch panel
    Calibrate {
        /// Pads the simulated user never touches (comma separated)
        #[arg(long, value_delimiter = ',')]
        untouched: Vec<ChannelId>,
        /// Chance that a struck pad registers on each read (0.0 - 1.0)
        #[arg(long, default_value_t = 1.0)]
        press_probability: f64,
        #[arg(long, default_value_t = 7)]
        seed: u64,
    },
    /// Measure one force episode from a synthetic accelerometer
    Force {
        /// Peak acceleration of a simulated punch in g
        #[arg(long)]
        impact: Option<f64>,
        #[arg(long, default_value_t = 7)]
        seed: u64,
    },
    /// Print the default configuration as JSON
    Config,
}

#[derive(Serialize)]
struct ForceReport {
    force: f64,
    dominant_frequency_hz: Option<f64>,
    elapsed_ms: u64,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(if cli.verbose { Level::DEBUG } else { Level::INFO });

    let config = cli
        .config
        .map(AppConfig::load_from_file)
        .unwrap_or_default();

    match cli.command {
        Commands::Calibrate {
            untouched,
            press_probability,
            seed,
        } => run_calibrate(config, &untouched, press_probability, seed),
        Commands::Force { impact, seed } => run_force(config, impact, seed),
        Commands::Config => run_config(),
    }
}

fn run_calibrate(
    config: AppConfig,
    untouched: &[ChannelId],
    press_probability: f64,
    seed: u64,
) -> Result<ExitCode> {
    let poll_interval = config.calibration.capture_poll_interval_ms;
    let clock = ManualClock::new();
    let mut context = TrainerContext::new(
        SimulatedTouchPanel::new(seed).with_press_probability(press_probability),
        SyntheticMotion::new(seed, config.force.sampling_frequency_hz),
        clock.clone(),
        config,
    )
    .context("building trainer context")?;

    context
        .start_calibration()
        .context("starting calibration")?;
    context
        .calibration_mut()
        .touch_mut()
        .press_all_except(untouched);

    while !context.poll_calibration() {
        clock.advance(poll_interval);
    }
    context.calibration_mut().touch_mut().release_all();

    let status = context.status();
    println!("{}", serde_json::to_string_pretty(&status)?);

    match status.calibration.outcome {
        Some(CalibrationOutcome::Completed) => Ok(ExitCode::from(0)),
        _ => Ok(ExitCode::from(2)),
    }
}

fn run_force(config: AppConfig, impact: Option<f64>, seed: u64) -> Result<ExitCode> {
    let clock = ManualClock::new();
    let mut motion = SyntheticMotion::new(seed, config.force.sampling_frequency_hz);
    if let Some(peak_g) = impact {
        // Land the punch mid-episode so the ringing fits in the window
        motion = motion.with_impact(ImpactProfile {
            start_sample: u64::from(config.force.episode_iterations / 2),
            peak_g,
            frequency_hz: 15.0,
            decay_samples: 20.0,
        });
    }

    let mut context = TrainerContext::new(
        SimulatedTouchPanel::new(seed),
        motion,
        clock.clone(),
        config,
    )
    .context("building trainer context")?;

    let force = context.measure_force();
    let report = ForceReport {
        force,
        dominant_frequency_hz: context.force().dominant_frequency_hz(),
        elapsed_ms: clock.now_ms(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(ExitCode::from(0))
}

fn run_config() -> Result<ExitCode> {
    let json = serde_json::to_string_pretty(&AppConfig::default())
        .context("serializing default configuration")?;
    println!("{}", json);
    Ok(ExitCode::from(0))
}
