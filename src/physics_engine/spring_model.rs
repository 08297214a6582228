//! Spring-mass weight model
//!
//! An ideal spring oscillates with `T = 2π·sqrt(m / k)`. A real spring also
//! carries about a third of its own mass along, and the pan hangs on it
//! regardless of load:
//!
//! ```text
//! m_total = m + spring_mass / 3 + pan_mass
//! m       = (T / 2π)² · k - spring_mass / 3 - pan_mass
//! ```

use std::f64::consts::PI;

use crate::processing::ProcessingError;
use crate::types::CalibrationParams;

/// Oscillation period for a peak frequency.
///
/// Zero, negative or non-finite frequencies have no finite period and are
/// rejected.
pub fn period_from_frequency(frequency_hz: f64) -> Result<f64, ProcessingError> {
    if !frequency_hz.is_finite() || frequency_hz <= 0.0 {
        return Err(ProcessingError::DegenerateFrequency(frequency_hz));
    }
    Ok(1.0 / frequency_hz)
}

/// Attached mass (kg) implied by an oscillation period (s).
pub fn raw_weight_kg(period_s: f64, calib: &CalibrationParams) -> f64 {
    (period_s / (2.0 * PI)).powi(2) * calib.spring_stiffness - calib.fixed_oscillating_mass()
}

/// Displayed weight: raw mass in `unit_ratio` units minus the tare.
///
/// `zero_adjustment` is in kilograms.
pub fn weight(
    period_s: f64,
    calib: &CalibrationParams,
    zero_adjustment: f64,
    unit_ratio: f64,
) -> f64 {
    unit_ratio * raw_weight_kg(period_s, calib) - unit_ratio * zero_adjustment
}

/// Period (s) at which a mass of `mass_kg` would oscillate.
pub fn period_for_mass(mass_kg: f64, calib: &CalibrationParams) -> f64 {
    let total = (mass_kg + calib.fixed_oscillating_mass()).max(0.0);
    2.0 * PI * (total / calib.spring_stiffness).sqrt()
}
