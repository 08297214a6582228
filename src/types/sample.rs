//! Position sample types

use serde::{Deserialize, Serialize};

/// Single vertical position observation of the tracked object.
///
/// `timestamp` is in seconds. Within a buffer timestamps never decrease.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub position: f64,
    pub timestamp: f64,
}

impl Sample {
    pub fn new(position: f64, timestamp: f64) -> Self {
        Self { position, timestamp }
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.timestamp.is_finite()
    }
}

/// Raw tracker output before confidence gating.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub position: f64,
    pub timestamp: f64,
    /// Tracker confidence in [0, 1]. Missing values are treated as fully confident.
    #[serde(default = "full_confidence")]
    pub confidence: f64,
}

fn full_confidence() -> f64 {
    1.0
}

impl Observation {
    pub fn sample(&self) -> Sample {
        Sample::new(self.position, self.timestamp)
    }
}
