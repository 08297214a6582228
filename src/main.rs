//! video-scale - weigh objects from the oscillation of a spring scale
//!
//! # Usage
//!
//! ```bash
//! # Simulated 100 g load at 30 fps
//! cargo run --release
//!
//! # Simulated 250 g load with tracker noise, as fast as possible
//! ./video-scale --simulate-mass 0.25 --noise 0.002 --speed 0
//!
//! # Replay recorded tracker output
//! ./video-scale --csv frames.csv --fps 30
//!
//! # Live tracker feeding JSON lines
//! tracker | ./video-scale --stdin --json
//! ```
//!
//! # Environment Variables
//!
//! - `GAUGE_CONFIG`: Path to gauge_config.toml
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use video_scale::acquisition::{read_csv_observations, SyntheticOscillation};
use video_scale::config::defaults;
use video_scale::pipeline::{LineSource, ReplaySource, SampleSource};
use video_scale::{
    DisplayState, GaugeConfig, PipelineCoordinator, PipelineStats, ProcessingLoop, ReadingSink,
    WeightReading,
};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "video-scale")]
#[command(about = "Weigh objects from the oscillation period of a spring scale")]
#[command(version)]
struct CliArgs {
    /// Read JSON lines (observations and control messages) from stdin
    #[arg(long, conflicts_with_all = ["csv", "simulate_mass"])]
    stdin: bool,

    /// Replay tracker output from a CSV file (timestamp,position[,confidence])
    #[arg(long, value_name = "PATH", conflicts_with = "simulate_mass")]
    csv: Option<PathBuf>,

    /// Simulate a load of this many kilograms (default input)
    #[arg(long, value_name = "KG")]
    simulate_mass: Option<f64>,

    /// Frame rate for simulation and replay pacing
    #[arg(long)]
    fps: Option<f64>,

    /// Number of simulated frames
    #[arg(long)]
    samples: Option<usize>,

    /// Standard deviation of simulated position noise
    #[arg(long, default_value = "0")]
    noise: f64,

    /// Simulated timestamp jitter as a fraction of the frame interval
    #[arg(long, default_value = "0")]
    jitter: f64,

    /// Replay speed multiplier (1 = realtime, 0 = no delay)
    #[arg(long, default_value = "1")]
    speed: f64,

    /// Display unit (must exist in the unit table)
    #[arg(long)]
    unit: Option<String>,

    /// Path to gauge_config.toml
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    dump_config: bool,

    /// Emit readings as JSON lines instead of text
    #[arg(long)]
    json: bool,

    /// Structured JSON logs on stderr
    #[arg(long)]
    log_json: bool,
}

// ============================================================================
// Output
// ============================================================================

/// Writes readings to stdout, one per line. Logs go to stderr.
struct StdoutSink {
    json: bool,
}

impl ReadingSink for StdoutSink {
    fn on_reading(&mut self, reading: &WeightReading) {
        let line = if self.json {
            match serde_json::to_string(reading) {
                Ok(s) => s,
                Err(e) => {
                    warn!("Failed to serialize reading: {}", e);
                    return;
                }
            }
        } else {
            reading.to_string()
        };
        let mut out = std::io::stdout().lock();
        if let Err(e) = writeln!(out, "{}", line) {
            warn!("Failed to write reading: {}", e);
        }
    }

    fn on_display(&mut self, shown: &DisplayState) {
        if !matches!(shown, DisplayState::Value(_)) {
            info!("Display: {}", shown.render());
        }
    }
}

// ============================================================================
// Pipeline Runner
// ============================================================================

async fn run_pipeline<S: SampleSource>(
    source: S,
    config: &GaugeConfig,
    json: bool,
    cancel_token: CancellationToken,
) -> Result<PipelineStats> {
    let coordinator = PipelineCoordinator::new(config).context("Invalid gauge configuration")?;
    let pipeline = ProcessingLoop::new(
        coordinator,
        StdoutSink { json },
        &config.tracking,
        cancel_token,
    );
    let outcome = pipeline.run(source).await;
    Ok(outcome.stats)
}

fn replay_delay_ms(fps: f64, speed: f64) -> u64 {
    if speed <= 0.0 || fps <= 0.0 {
        0
    } else {
        (defaults::SIMULATION_BASE_DELAY_MS / (fps * speed)).round() as u64
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    // Logs on stderr so stdout carries only readings
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr);
    if args.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let mut config = GaugeConfig::load_or_default(args.config.as_deref())?;
    if let Some(unit) = args.unit {
        if !config.units.contains_key(&unit) {
            let known: Vec<&str> = config.units.keys().map(String::as_str).collect();
            anyhow::bail!("Unknown unit '{}' (available: {})", unit, known.join(", "));
        }
        config.display.unit = unit;
    }

    if args.dump_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("  video-scale");
    info!(
        "  Spring: {} N/m | Spring mass: {} kg | Pan: {} kg",
        config.calibration.spring_stiffness_n_per_m,
        config.calibration.spring_mass_kg,
        config.calibration.pan_mass_kg
    );
    info!(
        "  Band: {}-{} Hz | Windows: {:?} | Unit: {}",
        config.band.lower_hz, config.band.higher_hz, config.buffer.window_sizes, config.display.unit
    );
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // Graceful shutdown via Ctrl+C
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("🛑 Received Ctrl+C, initiating shutdown...");
        shutdown_token.cancel();
    });

    let fps = args.fps.unwrap_or(defaults::SIMULATION_FPS);
    let delay_ms = replay_delay_ms(fps, args.speed);

    let stats = if args.stdin {
        info!("📥 Input: stdin (JSON lines)");
        run_pipeline(LineSource::stdin(), &config, args.json, cancel_token).await?
    } else if let Some(path) = args.csv {
        info!("📥 Input: CSV replay from {}", path.display());
        let frames = read_csv_observations(&path)?;
        info!("⏱️  Speed: {}x ({}ms delay between frames)", args.speed, delay_ms);
        let source = ReplaySource::new(frames, delay_ms).named("CSV");
        run_pipeline(source, &config, args.json, cancel_token).await?
    } else {
        let mass = args.simulate_mass.unwrap_or(defaults::SIMULATION_MASS_KG);
        let mut simulation = SyntheticOscillation::new(mass)
            .with_fps(fps)
            .with_noise(args.noise)
            .with_jitter(args.jitter);
        if let Some(samples) = args.samples {
            simulation = simulation.with_samples(samples);
        }
        let calib = config.calibration_params();
        info!(
            "📥 Input: simulated {} kg load ({:.3} Hz at {} fps, {} frames)",
            mass,
            simulation.frequency_hz(&calib),
            fps,
            simulation.samples
        );
        let frames = simulation.generate(&calib)?;
        info!("⏱️  Speed: {}x ({}ms delay between frames)", args.speed, delay_ms);
        let source = ReplaySource::new(frames, delay_ms).named("simulation");
        run_pipeline(source, &config, args.json, cancel_token).await?
    };

    if stats.readings_emitted == 0 {
        warn!("No reading was produced");
    }
    Ok(())
}
