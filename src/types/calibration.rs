//! Spring calibration constants

use serde::{Deserialize, Serialize};

/// Physical constants of the spring and pan, set once per device.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationParams {
    /// Spring stiffness k (N/m)
    pub spring_stiffness: f64,
    /// Mass of the spring itself (kg)
    pub spring_mass: f64,
    /// Mass of the pan hanging from the spring (kg)
    pub pan_mass: f64,
}

impl CalibrationParams {
    /// Mass that oscillates even with an empty pan (kg).
    ///
    /// A third of the spring's own mass plus the pan.
    pub fn fixed_oscillating_mass(&self) -> f64 {
        self.spring_mass / 3.0 + self.pan_mass
    }
}
