// src/config/validate.rs

use std::collections::HashSet;
use std::path::Path;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{AdwatchError, Result};
use crate::scan::FilePattern;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::AdwatchError;

    fn try_from(mut raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        normalize(&mut raw);
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.watch, raw.tool, raw.state))
    }
}

/// Tidy values that are easy to mistype in TOML. Validation and the engine
/// then see exactly the same strings.
fn normalize(cfg: &mut RawConfigFile) {
    let trimmed = cfg.watch.pattern.trim();
    if trimmed.len() != cfg.watch.pattern.len() {
        cfg.watch.pattern = trimmed.to_string();
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_roots(cfg)?;
    validate_pattern(cfg)?;
    validate_tool(cfg)?;
    validate_state_files(cfg)?;
    Ok(())
}

fn ensure_has_roots(cfg: &RawConfigFile) -> Result<()> {
    if cfg.watch.roots.is_empty() {
        return Err(AdwatchError::ConfigError(
            "no watched roots: set [watch].roots or pass --input-root".to_string(),
        ));
    }
    if cfg.watch.roots.iter().any(|r| is_blank(r)) {
        return Err(AdwatchError::ConfigError(
            "[watch].roots contains an empty path".to_string(),
        ));
    }
    Ok(())
}

fn validate_pattern(cfg: &RawConfigFile) -> Result<()> {
    let pattern = cfg.watch.pattern.as_str();
    if pattern.is_empty() {
        return Err(AdwatchError::ConfigError(
            "[watch].pattern must not be empty".to_string(),
        ));
    }
    FilePattern::new(pattern).map_err(|e| {
        AdwatchError::ConfigError(format!("[watch].pattern {pattern:?} is not a valid glob: {e:#}"))
    })?;
    Ok(())
}

fn validate_tool(cfg: &RawConfigFile) -> Result<()> {
    if is_blank(&cfg.tool.path) {
        return Err(AdwatchError::ConfigError(
            "[tool].path must not be empty".to_string(),
        ));
    }
    if is_blank(&cfg.tool.output_dir) {
        return Err(AdwatchError::ConfigError(
            "no output directory: set [tool].output_dir or pass --output-dir".to_string(),
        ));
    }
    if cfg.tool.benign_marker.is_empty() {
        return Err(AdwatchError::ConfigError(
            "[tool].benign_marker must not be empty".to_string(),
        ));
    }
    for ext in cfg.tool.side_file_extensions.iter() {
        let ext = ext.trim_start_matches('.');
        if ext.is_empty() || ext.contains(['/', '\\']) {
            return Err(AdwatchError::ConfigError(format!(
                "[tool].side_file_extensions entry {ext:?} is not a file extension"
            )));
        }
    }
    Ok(())
}

/// The sets, lock and error log must be five different files.
fn validate_state_files(cfg: &RawConfigFile) -> Result<()> {
    let state = &cfg.state;
    let named = [
        ("ignored", &state.ignored),
        ("in_flight", &state.in_flight),
        ("done", &state.done),
        ("lock", &state.lock),
        ("error_log", &state.error_log),
    ];

    let mut seen = HashSet::new();
    for (key, path) in named {
        if is_blank(path) {
            return Err(AdwatchError::ConfigError(format!(
                "[state].{key} must not be empty"
            )));
        }
        if !seen.insert(path.as_path()) {
            return Err(AdwatchError::ConfigError(format!(
                "[state].{key} ({}) is already used by another state file",
                path.display()
            )));
        }
    }
    Ok(())
}

fn is_blank(path: &Path) -> bool {
    path.as_os_str().is_empty()
}
