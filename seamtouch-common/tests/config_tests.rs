//! Tests for bootstrap configuration loading and validation
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate SEAMTOUCH_CONFIG are marked with #[serial].

use seamtouch_common::config::{resolve_config_path, FusionConfig, CONFIG_ENV_VAR};
use seamtouch_common::{Error, MountingOrientation, SensorPosition};
use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};

#[test]
fn test_empty_toml_uses_defaults() {
    let config = FusionConfig::from_toml_str("").unwrap();

    assert_eq!(config.orientation, MountingOrientation::Horizontal);
    assert_eq!(config.surface_width, 3000);
    assert_eq!(config.surface_height, 3000);
    assert_eq!(config.sensors, vec![SensorPosition::TopLeft, SensorPosition::BottomLeft]);
    assert_eq!(config.queue_capacity, 256);
    assert_eq!(config.poll_interval_ms, 1000);
    assert_eq!(config.tuning.debounce_interval_ms, 100);
    assert_eq!(config.tuning.release_timeout_ms, 100);
    assert_eq!(config.tuning.ghost_speed_limit, 5.0);
    assert_eq!(config.tuning.smoothing_window, 8);
    assert_eq!(config.tuning.seam_weight, 4);
    assert_eq!(config.logging.level, "info");
    assert!(!config.logging.verbose);
    assert!(config.positions_file.is_none());
}

#[test]
fn test_default_matches_empty_toml() {
    let parsed = FusionConfig::from_toml_str("").unwrap();
    let built = FusionConfig::default();

    assert_eq!(parsed.sensors, built.sensors);
    assert_eq!(parsed.tuning.smoothing_window, built.tuning.smoothing_window);
    assert_eq!(parsed.logging.level, built.logging.level);
}

#[test]
fn test_full_config_parses() {
    let toml = r#"
        orientation = "vertical"
        surface_width = 2800
        surface_height = 1600
        sensors = ["top_left", "top_right"]
        positions_file = "/var/lib/seamtouch/sensor_positions.csv"
        queue_capacity = 64
        poll_interval_ms = 250

        [tuning]
        debounce_interval_ms = 80
        release_timeout_ms = 120
        ghost_speed_limit = 7.5
        smoothing_window = 4
        seam_weight = 3

        [logging]
        level = "warn"
        verbose = true
    "#;

    let config = FusionConfig::from_toml_str(toml).unwrap();

    assert_eq!(config.orientation, MountingOrientation::Vertical);
    assert_eq!(config.surface_width, 2800);
    assert_eq!(config.sensors, vec![SensorPosition::TopLeft, SensorPosition::TopRight]);
    assert_eq!(
        config.positions_file,
        Some(PathBuf::from("/var/lib/seamtouch/sensor_positions.csv"))
    );
    assert_eq!(config.poll_interval().as_millis(), 250);
    assert_eq!(config.tuning.release_timeout().as_millis(), 120);
    assert_eq!(config.tuning.seam_weight, 3);
    // Verbose overrides the configured level
    assert_eq!(config.log_directive(), "debug");
}

#[test]
fn test_duplicate_expected_position_rejected() {
    let err = FusionConfig::from_toml_str(r#"sensors = ["top_left", "top_left"]"#).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn test_empty_sensor_list_rejected() {
    let err = FusionConfig::from_toml_str("sensors = []").unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn test_lone_sensor_without_opposite_rejected() {
    let err = FusionConfig::from_toml_str(r#"sensors = ["top_left"]"#).unwrap_err();
    assert!(matches!(err, Error::Config(ref msg) if msg.contains("bottom_left")));
}

#[test]
fn test_seam_partners_follow_orientation() {
    // Side by side is a valid pair only when mounted vertically
    let row = r#"sensors = ["top_left", "top_right"]"#;
    assert!(matches!(FusionConfig::from_toml_str(row).unwrap_err(), Error::Config(_)));

    let vertical = FusionConfig::from_toml_str(&format!("orientation = \"vertical\"\n{row}")).unwrap();
    assert_eq!(vertical.sensors.len(), 2);

    let quad = FusionConfig::from_toml_str(
        r#"sensors = ["top_left", "bottom_left", "top_right", "bottom_right"]"#,
    )
    .unwrap();
    assert_eq!(quad.sensors.len(), 4);

    let missing_corner =
        FusionConfig::from_toml_str(r#"sensors = ["top_left", "bottom_left", "top_right"]"#).unwrap_err();
    assert!(matches!(missing_corner, Error::Config(_)));
}

#[test]
fn test_zero_poll_interval_rejected() {
    let err = FusionConfig::from_toml_str("poll_interval_ms = 0").unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn test_unknown_position_name_is_parse_error() {
    let err = FusionConfig::from_toml_str(r#"sensors = ["center"]"#).unwrap_err();
    assert!(matches!(err, Error::Toml(_)));
}

#[test]
fn test_zero_smoothing_window_rejected() {
    let err = FusionConfig::from_toml_str("[tuning]\nsmoothing_window = 0").unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn test_zero_surface_rejected() {
    let err = FusionConfig::from_toml_str("surface_width = 0").unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "orientation = \"vertical\"").unwrap();
    writeln!(file, "sensors = [\"top_left\", \"top_right\"]").unwrap();

    let config = FusionConfig::load(file.path()).unwrap();
    assert_eq!(config.orientation, MountingOrientation::Vertical);
}

#[test]
fn test_load_missing_file_is_io_error() {
    let err = FusionConfig::load(Path::new("/nonexistent/seamtouch/config.toml")).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
#[serial]
fn test_cli_argument_takes_priority_over_env() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/from-env.toml");

    let resolved = resolve_config_path(Some(Path::new("/tmp/from-cli.toml")));
    assert_eq!(resolved, Some(PathBuf::from("/tmp/from-cli.toml")));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_env_var_used_without_cli_argument() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/from-env.toml");

    let resolved = resolve_config_path(None);
    assert_eq!(resolved, Some(PathBuf::from("/tmp/from-env.toml")));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_load_or_default_reads_env_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "queue_capacity = 32").unwrap();
    env::set_var(CONFIG_ENV_VAR, file.path());

    let config = FusionConfig::load_or_default(None).unwrap();
    assert_eq!(config.queue_capacity, 32);

    env::remove_var(CONFIG_ENV_VAR);
}
