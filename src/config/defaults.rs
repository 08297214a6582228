//! System-wide default constants.
//!
//! Values match the reference scale hardware: a 218 N/m spring weighing
//! 2.5 g with a 21.5 g pan, tracked by a phone camera.

// ============================================================================
// Config File Discovery
// ============================================================================

/// Environment variable naming a config file path.
pub const CONFIG_ENV_VAR: &str = "GAUGE_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "gauge_config.toml";

// ============================================================================
// Calibration
// ============================================================================

/// Spring stiffness k (N/m).
pub const SPRING_STIFFNESS_N_PER_M: f64 = 218.0;

/// Mass of the spring itself (kg).
pub const SPRING_MASS_KG: f64 = 0.0025;

/// Mass of the pan (kg).
pub const PAN_MASS_KG: f64 = 0.0215;

// ============================================================================
// Spectral Analysis
// ============================================================================

/// Lowest plausible oscillation frequency (Hz).
pub const LOWER_FREQ_HZ: f64 = 0.5;

/// Highest plausible oscillation frequency (Hz).
pub const HIGHER_FREQ_HZ: f64 = 50.0;

/// Buffer lengths at which an analysis runs.
pub const WINDOW_SIZES: [usize; 4] = [32, 64, 128, 256];

// ============================================================================
// Tracking / Ingest
// ============================================================================

/// Observations below this tracker confidence never reach the buffer.
pub const MIN_TRACKING_CONFIDENCE: f64 = 0.3;

/// Capacity of the producer → pipeline command channel.
///
/// One full ceiling window of frames.
pub const COMMAND_CHANNEL_CAPACITY: usize = 256;

// ============================================================================
// Display
// ============================================================================

/// Unit selected at startup.
pub const DEFAULT_UNIT: &str = "g";

// ============================================================================
// Simulation
// ============================================================================

/// Load simulated when no input is given (kg).
pub const SIMULATION_MASS_KG: f64 = 0.1;

/// Camera frame rate for the synthetic source (fps).
pub const SIMULATION_FPS: f64 = 30.0;

/// Frames generated by the synthetic source.
pub const SIMULATION_SAMPLES: usize = 512;

/// Initial oscillation amplitude in normalized image units.
pub const SIMULATION_AMPLITUDE: f64 = 0.05;

/// Resting position of the pan in normalized image units.
pub const SIMULATION_REST_POSITION: f64 = 0.5;

/// Exponential amplitude decay rate (1/s).
pub const SIMULATION_DAMPING_PER_SEC: f64 = 0.05;

/// Base delay denominator for `--speed`.
///
/// `delay_ms = 1000 / (fps * speed)`
pub const SIMULATION_BASE_DELAY_MS: f64 = 1000.0;
