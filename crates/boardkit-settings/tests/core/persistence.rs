use boardkit_core::FloaterBboxPolicy;
use boardkit_settings::{Config, ConfigError, LogLevel, SettingsError};

fn sample() -> Config {
    let mut config = Config::new();
    config.undo.max_serials = 25;
    config.spatial.cell_size = 250_000;
    config.extobj.floater_bbox = FloaterBboxPolicy::IncludeInFull;
    config.extobj.regenerate_on_edit = false;
    config.logging.level = LogLevel::Debug;
    config.logging.json = true;
    config
}

#[test]
fn test_json_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    sample().save_to_file(&path).unwrap();
    assert_eq!(Config::load_from_file(&path).unwrap(), sample());
}

#[test]
fn test_toml_round_trip_creates_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");
    sample().save_to_file(&path).unwrap();
    let loaded = Config::load_from_file(&path).unwrap();
    assert_eq!(loaded, sample());

    let options = loaded.board_options();
    assert_eq!(options.max_serials, 25);
    assert_eq!(options.cell_size, 250_000);
    assert!(!options.regenerate_on_edit);
}

#[test]
fn test_unsupported_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    let err = Config::new().save_to_file(&path).unwrap_err();
    assert!(matches!(
        err,
        SettingsError::Invalid(ConfigError::UnsupportedFormat(ref ext)) if ext == "yaml"
    ));
}

#[test]
fn test_invalid_file_rejected_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[undo]\nmax_serials = 0\n").unwrap();
    let err = Config::load_from_file(&path).unwrap_err();
    assert!(matches!(err, SettingsError::Invalid(ConfigError::ValueOutOfRange { .. })));
}

#[test]
fn test_malformed_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(matches!(
        Config::load_from_file(&path),
        Err(SettingsError::Json(_))
    ));
}

#[test]
fn test_missing_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    assert_eq!(Config::load_or_default(&path).unwrap(), Config::default());
    assert!(matches!(
        Config::load_from_file(&path),
        Err(SettingsError::Read { .. })
    ));
}
