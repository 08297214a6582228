//! Position data acquisition
//!
//! Turns recorded or generated tracker output into [`Observation`]s and
//! applies the confidence gate that keeps poorly tracked frames out of the
//! sample buffer.

pub mod csv_replay;
pub mod synthetic;

pub use csv_replay::{parse_csv_line, read_csv_observations};
pub use synthetic::SyntheticOscillation;

use thiserror::Error;

use crate::types::Observation;

#[derive(Error, Debug)]
pub enum AcquisitionError {
    #[error("Failed to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Invalid simulation parameter: {0}")]
    InvalidSimulation(String),
}

/// Whether an observation is trustworthy enough to enter the buffer.
///
/// Non-finite confidences never pass.
pub fn passes_confidence(observation: &Observation, min_confidence: f64) -> bool {
    observation.confidence.is_finite() && observation.confidence >= min_confidence
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(confidence: f64) -> Observation {
        Observation {
            position: 0.5,
            timestamp: 0.0,
            confidence,
        }
    }

    #[test]
    fn test_confidence_gate() {
        assert!(passes_confidence(&obs(0.9), 0.3));
        assert!(passes_confidence(&obs(0.3), 0.3));
        assert!(!passes_confidence(&obs(0.29), 0.3));
        assert!(!passes_confidence(&obs(f64::NAN), 0.0));
    }
}
