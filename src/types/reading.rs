//! Weight readings emitted by the pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UnitSpec;

/// One completed analysis cycle, expressed in the active display unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightReading {
    /// Zero-adjusted weight in `unit`
    pub value: f64,
    /// Unadjusted model output in kilograms
    pub raw_kg: f64,
    /// Unit identifier (e.g. "g")
    pub unit: String,
    /// Display precision for `value`
    pub fractional_digits: u8,
    /// Dominant oscillation frequency (Hz)
    pub peak_frequency_hz: f64,
    /// Normalized magnitude at the peak bin
    pub peak_magnitude: f64,
    /// Oscillation period (s)
    pub period_s: f64,
    /// Number of samples in the analyzed window
    pub window_len: usize,
    /// Sample rate derived from the window timestamps (Hz)
    pub sample_rate_hz: f64,
    /// Wall-clock time of the analysis
    pub computed_at: DateTime<Utc>,
}

impl WeightReading {
    /// Value rendered with the unit's fractional digits, without the unit label.
    pub fn formatted(&self) -> String {
        UnitSpec::new(1.0, self.fractional_digits).format(self.value)
    }
}

impl std::fmt::Display for WeightReading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.formatted(), self.unit)
    }
}

/// What an external display should currently show.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DisplayState {
    /// No target or just reset
    #[default]
    NotAvailable,
    /// Target selected, waiting for the first full window
    Computing,
    /// Latest completed reading
    Value(WeightReading),
}

impl DisplayState {
    pub fn render(&self) -> String {
        match self {
            DisplayState::NotAvailable => "-".to_string(),
            DisplayState::Computing => "Computing...".to_string(),
            DisplayState::Value(reading) => reading.to_string(),
        }
    }
}
