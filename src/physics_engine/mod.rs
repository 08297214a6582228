//! Physics Engine Module
//!
//! Deterministic spring-mass calculations. All math here is pure: the same
//! inputs always give the same outputs and nothing is cached.
//!
//! - `period_from_frequency()` - Peak frequency to oscillation period
//! - `raw_weight_kg()` - Period to attached mass
//! - `weight()` - Mass scaled to a display unit with tare applied
//! - `period_for_mass()` - Inverse model, used by the synthetic source

pub mod spring_model;

pub use spring_model::{period_for_mass, period_from_frequency, raw_weight_kg, weight};
