//! Config Validation Tests
//!
//! Typo detection on raw TOML, range validation on parsed configs, and the
//! file loading paths the binary uses. These exercise the config layer
//! independently from the rest of the pipeline.

use std::io::Write;
use video_scale::config::validation::{
    known_config_keys, suggest_correction, validate_physical_ranges, validate_unknown_keys,
};
use video_scale::config::{ConfigError, GaugeConfig};
use video_scale::{PipelineCoordinator, UnitSpec};

// ============================================================================
// Typo Detection
// ============================================================================

#[test]
fn typo_in_calibration_key_warns_with_suggestion() {
    let toml_str = r#"
[calibration]
spring_stifness_n_per_m = 180.0
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1, "Expected exactly 1 warning");
    assert!(warnings[0].field.contains("spring_stifness_n_per_m"));
    assert_eq!(
        warnings[0].suggestion.as_deref(),
        Some("calibration.spring_stiffness_n_per_m")
    );
}

#[test]
fn typo_in_section_name_warns() {
    let toml_str = r#"
[bnad]
lower_hz = 1.0
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert!(!warnings.is_empty());
    assert!(warnings
        .iter()
        .any(|w| w.field == "bnad" && w.suggestion.as_deref() == Some("band")));
}

#[test]
fn full_valid_config_produces_zero_warnings() {
    let toml_str = r#"
[calibration]
spring_stiffness_n_per_m = 218.0
spring_mass_kg = 0.0025
pan_mass_kg = 0.0215

[band]
lower_hz = 0.5
higher_hz = 50.0

[buffer]
window_sizes = [32, 64, 128, 256]

[tracking]
min_confidence = 0.3
channel_capacity = 256

[display]
unit = "g"

[units.g]
ratio = 1000.0
fractional_digits = 0

[units.grain]
ratio = 15432.358
fractional_digits = 0
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert!(
        warnings.is_empty(),
        "Valid config should produce 0 warnings, got: {:?}",
        warnings.iter().map(|w| &w.field).collect::<Vec<_>>()
    );
}

#[test]
fn misspelled_unit_field_is_flagged() {
    let toml_str = r#"
[units.ct]
ratio = 5000.0
fractional_digit = 0
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].field, "units.ct.fractional_digit");
    assert_eq!(warnings[0].suggestion.as_deref(), Some("fractional_digits"));
}

#[test]
fn unknown_keys_do_not_prevent_loading() {
    let toml_str = r#"
[display]
unit = "kg"
colour = "green"
"#;
    let config = GaugeConfig::from_toml_str(toml_str).expect("unknown keys only warn");
    assert_eq!(config.display.unit, "kg");
}

#[test]
fn suggestion_requires_reasonable_distance() {
    let known = known_config_keys();
    assert_eq!(
        suggest_correction("band.lowr_hz", &known).as_deref(),
        Some("band.lower_hz")
    );
    assert_eq!(suggest_correction("completely.unrelated", &known), None);
}

// ============================================================================
// Range Validation
// ============================================================================

#[test]
fn default_config_is_clean() {
    let (errors, warnings) = validate_physical_ranges(&GaugeConfig::default());
    assert!(errors.is_empty(), "{:?}", errors);
    assert!(warnings.is_empty());
}

#[test]
fn zero_stiffness_is_error() {
    let mut config = GaugeConfig::default();
    config.calibration.spring_stiffness_n_per_m = 0.0;
    let (errors, _) = validate_physical_ranges(&config);
    assert!(errors
        .iter()
        .any(|e| e.contains("calibration.spring_stiffness_n_per_m")));
}

#[test]
fn inverted_band_is_error() {
    let mut config = GaugeConfig::default();
    config.band.lower_hz = 10.0;
    config.band.higher_hz = 5.0;
    let (errors, _) = validate_physical_ranges(&config);
    assert!(errors.iter().any(|e| e.contains("band.higher_hz")));
}

#[test]
fn confidence_outside_unit_interval_is_error() {
    let mut config = GaugeConfig::default();
    config.tracking.min_confidence = 1.5;
    let (errors, _) = validate_physical_ranges(&config);
    assert!(errors.iter().any(|e| e.contains("tracking.min_confidence")));
}

#[test]
fn bad_unit_ratio_is_error() {
    let mut config = GaugeConfig::default();
    config
        .units
        .insert("broken".to_string(), UnitSpec::new(-1.0, 2));
    let (errors, _) = validate_physical_ranges(&config);
    assert!(errors.iter().any(|e| e.contains("units.broken.ratio")));
}

#[test]
fn every_problem_is_reported_at_once() {
    let toml_str = r#"
[calibration]
spring_stiffness_n_per_m = -5.0

[buffer]
window_sizes = [30, 64]

[display]
unit = "stone"
"#;
    match GaugeConfig::from_toml_str(toml_str) {
        Err(ConfigError::Validation(errors)) => {
            assert!(errors.len() >= 3, "{:?}", errors);
        }
        other => panic!("expected validation failure, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn coordinator_refuses_invalid_config() {
    let mut config = GaugeConfig::default();
    config.buffer.window_sizes = vec![48];
    assert!(matches!(
        PipelineCoordinator::new(&config),
        Err(ConfigError::Validation(_))
    ));
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn load_from_file_applies_overrides() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[calibration]
spring_stiffness_n_per_m = 150.0

[display]
unit = "oz"
"#
    )
    .unwrap();

    let config = GaugeConfig::load_from_file(file.path()).unwrap();
    assert_eq!(config.calibration.spring_stiffness_n_per_m, 150.0);
    assert_eq!(config.calibration.pan_mass_kg, 0.0215);
    assert_eq!(config.display.unit, "oz");
    assert_eq!(config.active_unit(), Some(UnitSpec::new(35.273_961_9, 1)));
}

#[test]
fn dumped_config_loads_back_identically() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gauge_config.toml");

    let mut config = GaugeConfig::default();
    config.band.higher_hz = 20.0;
    config.tracking.min_confidence = 0.5;
    config.save_to_file(&path).unwrap();

    assert_eq!(GaugeConfig::load_from_file(&path).unwrap(), config);
}

#[test]
fn malformed_file_reports_parse_error_with_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[band]\nlower_hz = \"half\"").unwrap();

    let err = GaugeConfig::load_from_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(..)));
    assert!(err
        .to_string()
        .contains(&file.path().display().to_string()));
}
