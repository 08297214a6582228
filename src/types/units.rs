//! Output units and their formatting

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Conversion factor from kilograms plus display precision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitSpec {
    /// Multiplier applied to a value in kilograms
    pub ratio: f64,
    /// Digits after the decimal point when rendering
    pub fractional_digits: u8,
}

impl UnitSpec {
    pub const fn new(ratio: f64, fractional_digits: u8) -> Self {
        Self {
            ratio,
            fractional_digits,
        }
    }

    /// Render a value already expressed in this unit.
    pub fn format(&self, value: f64) -> String {
        format!("{:.*}", self.fractional_digits as usize, value)
    }
}

/// Unit identifier → spec. Owned by the display side of the system.
pub type UnitTable = BTreeMap<String, UnitSpec>;

/// Grams, kilograms, ounces and pounds.
pub fn default_unit_table() -> UnitTable {
    let mut table = UnitTable::new();
    table.insert("g".to_string(), UnitSpec::new(1000.0, 0));
    table.insert("kg".to_string(), UnitSpec::new(1.0, 3));
    table.insert("oz".to_string(), UnitSpec::new(35.273_961_9, 1));
    table.insert("lb".to_string(), UnitSpec::new(2.204_622_62, 2));
    table
}
