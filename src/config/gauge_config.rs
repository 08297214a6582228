//! Gauge Configuration - calibration and analysis settings as TOML values
//!
//! Every struct implements `Default` with the reference hardware values, so a
//! missing file or a missing section behaves exactly like the stock device.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use super::defaults;
use crate::types::{default_unit_table, CalibrationParams, UnitSpec, UnitTable};

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for one scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaugeConfig {
    /// Spring and pan constants
    #[serde(default)]
    pub calibration: CalibrationConfig,

    /// Plausible oscillation band
    #[serde(default)]
    pub band: BandConfig,

    /// Analysis window sizes
    #[serde(default)]
    pub buffer: BufferConfig,

    /// Ingest gating and channel sizing
    #[serde(default)]
    pub tracking: TrackingConfig,

    /// Active display unit
    #[serde(default)]
    pub display: DisplayConfig,

    /// Available display units
    #[serde(default = "default_unit_table")]
    pub units: UnitTable,
}

impl Default for GaugeConfig {
    fn default() -> Self {
        Self {
            calibration: CalibrationConfig::default(),
            band: BandConfig::default(),
            buffer: BufferConfig::default(),
            tracking: TrackingConfig::default(),
            display: DisplayConfig::default(),
            units: default_unit_table(),
        }
    }
}

impl GaugeConfig {
    /// Load configuration using the standard search order:
    /// 1. `$GAUGE_CONFIG` environment variable
    /// 2. `./gauge_config.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        // 1. Check env var
        if let Ok(path) = std::env::var(defaults::CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded gauge config from {}", defaults::CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", defaults::CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", defaults::CONFIG_ENV_VAR);
            }
        }

        // 2. Check ./gauge_config.toml
        let local = PathBuf::from(defaults::LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded gauge config from ./{}", defaults::LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", defaults::LOCAL_CONFIG_FILE);
                }
            }
        }

        // 3. Defaults
        info!("No gauge config found, using built-in defaults");
        Self::default()
    }

    /// Load from an explicit path if given, otherwise use [`load`](Self::load).
    ///
    /// An explicit path that fails to load is an error, not a fallback.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                let config = Self::load_from_file(p)?;
                info!(path = %p.display(), "Loaded gauge config");
                Ok(config)
            }
            None => Ok(Self::load()),
        }
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, err) => ConfigError::Parse(path.to_path_buf(), err),
            other => other,
        })
    }

    /// Parse and validate a TOML document.
    ///
    /// Unknown keys only produce warnings; range violations are errors.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        // Two-pass: check for unknown keys first (warnings only)
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the effective configuration.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Write the effective configuration to a file.
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        std::fs::write(path, contents).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        info!(path = %path.display(), "Gauge config saved");
        Ok(())
    }

    /// Validate all values for physical and numerical consistency.
    ///
    /// Collects every problem instead of stopping at the first.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (errors, warnings) = super::validation::validate_physical_ranges(self);
        for w in &warnings {
            warn!("{}", w);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Calibration constants in model form.
    pub fn calibration_params(&self) -> CalibrationParams {
        self.calibration.params()
    }

    /// Spec of the configured display unit, if it exists in the table.
    pub fn active_unit(&self) -> Option<UnitSpec> {
        self.units.get(&self.display.unit).copied()
    }
}

// ============================================================================
// Sections
// ============================================================================

/// Spring and pan constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Spring stiffness (N/m)
    pub spring_stiffness_n_per_m: f64,
    /// Spring's own mass (kg)
    pub spring_mass_kg: f64,
    /// Pan mass (kg)
    pub pan_mass_kg: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            spring_stiffness_n_per_m: defaults::SPRING_STIFFNESS_N_PER_M,
            spring_mass_kg: defaults::SPRING_MASS_KG,
            pan_mass_kg: defaults::PAN_MASS_KG,
        }
    }
}

impl CalibrationConfig {
    pub fn params(&self) -> CalibrationParams {
        CalibrationParams {
            spring_stiffness: self.spring_stiffness_n_per_m,
            spring_mass: self.spring_mass_kg,
            pan_mass: self.pan_mass_kg,
        }
    }
}

/// Frequencies outside this band are discarded before the peak search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BandConfig {
    pub lower_hz: f64,
    pub higher_hz: f64,
}

impl Default for BandConfig {
    fn default() -> Self {
        Self {
            lower_hz: defaults::LOWER_FREQ_HZ,
            higher_hz: defaults::HIGHER_FREQ_HZ,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    /// Buffer lengths that trigger an analysis; the largest is the ceiling
    pub window_sizes: Vec<usize>,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            window_sizes: defaults::WINDOW_SIZES.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Minimum tracker confidence for an observation to be forwarded
    pub min_confidence: f64,
    /// Bounded command channel capacity
    pub channel_capacity: usize,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            min_confidence: defaults::MIN_TRACKING_CONFIDENCE,
            channel_capacity: defaults::COMMAND_CHANNEL_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Key into the unit table
    pub unit: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            unit: defaults::DEFAULT_UNIT.to_string(),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config I/O error ({path}): {err}", path = .0.display(), err = .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config parse error ({path}): {err}", path = .0.display(), err = .1)]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("Config serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config validation failed:\n  - {errors}", errors = .0.join("\n  - "))]
    Validation(Vec<String>),
}
