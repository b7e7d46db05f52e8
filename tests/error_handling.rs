// tests/error_handling.rs

use std::fs;
use std::path::PathBuf;

use adwatch::cli::CliArgs;
use adwatch::config::{load_and_validate, load_for_cli};
use adwatch::errors::AdwatchError;

#[test]
fn missing_explicit_config_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let args = CliArgs {
        config: Some(dir.path().join("nope.toml")),
        ..CliArgs::default()
    };

    match load_for_cli(&args) {
        Err(AdwatchError::ConfigError(msg)) => assert!(msg.contains("does not exist")),
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn malformed_toml_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[watch\nroots = 3").unwrap();

    let err = load_and_validate(&path).unwrap_err();
    assert!(matches!(err, AdwatchError::TomlError(_)), "got {err:?}");
}

#[test]
fn wrongly_typed_field_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[watch]\nroots = [\"/rec\"]\nstability_wait_secs = \"soon\"\n").unwrap();

    assert!(matches!(load_and_validate(&path), Err(AdwatchError::TomlError(_))));
}

#[test]
fn unknown_identity_mode_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(
        &path,
        "[watch]\nroots = [\"/rec\"]\nidentity = \"inode\"\n[tool]\noutput_dir = \"/videos\"\n",
    )
    .unwrap();

    assert!(load_and_validate(&path).is_err());
}

#[test]
fn config_without_output_dir_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("adwatch.toml");
    fs::write(&path, "[watch]\nroots = [\"/rec\"]\n").unwrap();

    match load_and_validate(&path) {
        Err(AdwatchError::ConfigError(msg)) => assert!(msg.contains("output")),
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn cli_can_supply_what_the_file_lacks() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("adwatch.toml");
    fs::write(&path, "[watch]\nroots = [\"/rec\"]\n").unwrap();

    let args = CliArgs {
        config: Some(path),
        output_dir: Some(PathBuf::from("/videos")),
        ..CliArgs::default()
    };
    assert!(load_for_cli(&args).is_ok());
}

#[test]
fn invalid_pattern_from_cli_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("adwatch.toml");
    fs::write(&path, "[watch]\nroots = [\"/rec\"]\n[tool]\noutput_dir = \"/videos\"\n").unwrap();

    let args = CliArgs {
        config: Some(path),
        pattern: Some("*.{ts".to_string()),
        ..CliArgs::default()
    };
    assert!(matches!(load_for_cli(&args), Err(AdwatchError::ConfigError(_))));
}
