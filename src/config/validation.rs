//! Checks applied to `gauge_config.toml` before the scale starts.
//!
//! Misspelled keys (`spring_stifness_n_per_m`, `[bnad]`, a unit table with
//! `fractional_digit`) are reported with the nearest known name and never
//! stop loading. Calibration, band, buffer and unit values are then checked
//! against what a spring scale can physically mean; those errors are fatal.

use std::collections::HashSet;

use super::GaugeConfig;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Fields allowed inside each `[units.<id>]` table.
const UNIT_FIELDS: [&str; 2] = ["ratio", "fractional_digits"];

/// Returns the complete set of valid dotted key paths for GaugeConfig.
///
/// Unit ids under `[units]` are free-form and are checked separately.
/// Any new field added to GaugeConfig must be added here too.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [calibration]
        "calibration",
        "calibration.spring_stiffness_n_per_m",
        "calibration.spring_mass_kg",
        "calibration.pan_mass_kg",
        // [band]
        "band",
        "band.lower_hz",
        "band.higher_hz",
        // [buffer]
        "buffer",
        "buffer.window_sizes",
        // [tracking]
        "tracking",
        "tracking.min_confidence",
        "tracking.channel_capacity",
        // [display]
        "display",
        "display.unit",
        // [units]
        "units",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// Key Paths and Edit Distance
// ============================================================================

/// Every table and key in a parsed document as a dotted path, parents
/// before children: `[units.g] ratio = 1` gives `units`, `units.g`,
/// `units.g.ratio`.
pub fn dotted_key_paths(document: &toml::Value) -> Vec<String> {
    fn collect(
        table: &toml::map::Map<String, toml::Value>,
        parent: Option<&str>,
        out: &mut Vec<String>,
    ) {
        for (name, child) in table {
            let path = parent.map_or_else(|| name.clone(), |p| format!("{p}.{name}"));
            out.push(path.clone());
            if let toml::Value::Table(inner) = child {
                collect(inner, Some(&path), out);
            }
        }
    }

    let mut paths = Vec::new();
    if let toml::Value::Table(root) = document {
        collect(root, None, &mut paths);
    }
    paths
}

/// Insertions, deletions and substitutions needed to turn `typed` into
/// `candidate`. Single rolling row.
fn edit_distance(typed: &str, candidate: &str) -> usize {
    let target: Vec<char> = candidate.chars().collect();
    let mut row: Vec<usize> = (0..=target.len()).collect();

    for (i, t) in typed.chars().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, &c) in target.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if t == c {
                diagonal
            } else {
                1 + diagonal.min(above).min(row[j])
            };
            diagonal = above;
        }
    }

    row[target.len()]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    let mut best: Option<(&str, usize)> = None;
    for &k in known {
        let dist = edit_distance(unknown, k);
        if dist > 3 {
            continue;
        }
        // Ties resolve alphabetically so suggestions are stable across runs
        let better = match best {
            Some((best_key, best_dist)) => dist < best_dist || (dist == best_dist && k < best_key),
            None => true,
        };
        if better {
            best = Some((k, dist));
        }
    }
    best.map(|(k, _)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// Unknown keys only warn. Existing configs always continue to load.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(), // parse errors are handled by serde later
    };

    let known = known_config_keys();
    let unit_fields: HashSet<&str> = UNIT_FIELDS.iter().copied().collect();
    let mut warnings = Vec::new();

    for key in dotted_key_paths(&value) {
        if let Some(rest) = key.strip_prefix("units.") {
            // units.<id> is free-form; units.<id>.<field> must be a unit field
            if let Some((_, field)) = rest.split_once('.') {
                if !unit_fields.contains(field) {
                    warnings.push(ValidationWarning {
                        field: key.clone(),
                        message: format!("Unknown unit field '{key}'"),
                        suggestion: suggest_correction(field, &unit_fields),
                    });
                }
            }
            continue;
        }

        if !known.contains(key.as_str()) {
            warnings.push(ValidationWarning {
                suggestion: suggest_correction(&key, &known),
                message: format!("Unknown config key '{key}'"),
                field: key,
            });
        }
    }

    warnings
}

// ============================================================================
// Physical Range Validation
// ============================================================================

/// Validate physical ranges on a parsed GaugeConfig.
///
/// Returns (errors, warnings). Errors are impossible values that must
/// prevent startup; warnings are suspicious but not fatal.
pub fn validate_physical_ranges(config: &GaugeConfig) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    // Calibration
    let c = &config.calibration;
    if !c.spring_stiffness_n_per_m.is_finite() || c.spring_stiffness_n_per_m <= 0.0 {
        errors.push(format!(
            "calibration.spring_stiffness_n_per_m = {} must be a finite value > 0",
            c.spring_stiffness_n_per_m
        ));
    } else if !(1.0..=10_000.0).contains(&c.spring_stiffness_n_per_m) {
        warnings.push(ValidationWarning {
            field: "calibration.spring_stiffness_n_per_m".to_string(),
            message: format!(
                "spring_stiffness_n_per_m = {:.1} is outside typical range (1-10000 N/m)",
                c.spring_stiffness_n_per_m
            ),
            suggestion: None,
        });
    }
    for (name, mass) in [
        ("calibration.spring_mass_kg", c.spring_mass_kg),
        ("calibration.pan_mass_kg", c.pan_mass_kg),
    ] {
        if !mass.is_finite() || mass < 0.0 {
            errors.push(format!("{name} = {mass} must be a finite value >= 0"));
        }
    }

    // Band
    let b = &config.band;
    if !b.lower_hz.is_finite() || !b.higher_hz.is_finite() {
        errors.push(format!(
            "band: limits must be finite (got lower={}, higher={})",
            b.lower_hz, b.higher_hz
        ));
    } else {
        if b.lower_hz < 0.0 {
            errors.push(format!("band.lower_hz = {} cannot be negative", b.lower_hz));
        }
        if b.higher_hz <= b.lower_hz {
            errors.push(format!(
                "band.higher_hz ({:.3}) must be greater than band.lower_hz ({:.3})",
                b.higher_hz, b.lower_hz
            ));
        }
    }

    // Window sizes
    let sizes = &config.buffer.window_sizes;
    if sizes.is_empty() {
        errors.push("buffer.window_sizes must contain at least one size".to_string());
    }
    for &n in sizes {
        if n < 2 || !n.is_power_of_two() {
            errors.push(format!(
                "buffer.window_sizes entry {n} must be a power of two >= 2"
            ));
        }
    }
    if let Some(&ceiling) = sizes.iter().max() {
        if ceiling > 4096 {
            warnings.push(ValidationWarning {
                field: "buffer.window_sizes".to_string(),
                message: format!(
                    "largest window {ceiling} spans minutes of video at typical frame rates"
                ),
                suggestion: None,
            });
        }
    }

    // Tracking
    let t = &config.tracking;
    if !(0.0..=1.0).contains(&t.min_confidence) {
        errors.push(format!(
            "tracking.min_confidence = {} must be within 0-1",
            t.min_confidence
        ));
    }
    if t.channel_capacity == 0 {
        errors.push("tracking.channel_capacity must be > 0".to_string());
    }

    // Units
    if config.units.is_empty() {
        errors.push("units: at least one unit must be defined".to_string());
    }
    for (id, spec) in &config.units {
        if !spec.ratio.is_finite() || spec.ratio <= 0.0 {
            errors.push(format!(
                "units.{id}.ratio = {} must be a finite value > 0",
                spec.ratio
            ));
        }
        if spec.fractional_digits > 12 {
            errors.push(format!(
                "units.{id}.fractional_digits = {} exceeds 12",
                spec.fractional_digits
            ));
        }
    }
    if !config.units.contains_key(&config.display.unit) {
        errors.push(format!(
            "display.unit '{}' is not defined under [units]",
            config.display.unit
        ));
    }

    (errors, warnings)
}

// ============================================================================
// Tests
// ============================================================================
