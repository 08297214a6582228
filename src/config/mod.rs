//! Gauge Configuration Module
//!
//! Calibration constants, band limits, window sizes and the unit table,
//! loaded once at startup from TOML.
//!
//! ## Loading Order
//!
//! 1. Explicit path (`--config`)
//! 2. `GAUGE_CONFIG` environment variable (path to TOML file)
//! 3. `gauge_config.toml` in the current working directory
//! 4. Built-in defaults (the reference scale hardware)
//!
//! The loaded [`GaugeConfig`] is handed to
//! [`PipelineCoordinator::new`](crate::pipeline::PipelineCoordinator::new);
//! nothing reads configuration from global state.

mod gauge_config;
pub mod defaults;
pub mod validation;

pub use gauge_config::*;
