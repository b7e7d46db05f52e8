// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::CliArgs;
use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{AdwatchError, Result};

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(AdwatchError::ConfigError(format!(
            "config file {} does not exist",
            path.display()
        )));
    }
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path, anchor its state paths next to it,
/// and validate it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let mut raw_config = load_from_path(path)?;
    raw_config.resolve_paths(&config_root_dir(Some(path)));
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Build the effective configuration for a CLI invocation.
///
/// - `--config PATH` must exist.
/// - Without `--config`, `Adwatch.toml` in the current directory is used if
///   present, otherwise built-in defaults.
/// - CLI flags are then layered on top and the result validated.
pub fn load_for_cli(args: &CliArgs) -> Result<ConfigFile> {
    let (mut raw, base) = match &args.config {
        Some(path) => (load_from_path(path)?, config_root_dir(Some(path))),
        None => {
            let default = default_config_path();
            if default.is_file() {
                (load_from_path(&default)?, config_root_dir(Some(&default)))
            } else {
                (RawConfigFile::default(), config_root_dir(None))
            }
        }
    };

    apply_overrides(&mut raw, args);
    raw.resolve_paths(&base);
    ConfigFile::try_from(raw)
}

/// Layer CLI flags over values from the config file.
pub fn apply_overrides(raw: &mut RawConfigFile, args: &CliArgs) {
    if !args.input_roots.is_empty() {
        raw.watch.roots = args.input_roots.clone();
    }
    if let Some(dir) = &args.output_dir {
        raw.tool.output_dir = dir.clone();
    }
    if let Some(tool) = &args.tool {
        raw.tool.path = tool.clone();
    }
    if let Some(pattern) = &args.pattern {
        raw.watch.pattern = pattern.clone();
    }
    if let Some(secs) = args.size_check_seconds {
        raw.watch.stability_wait_secs = secs;
    }
    if args.no_delete_extras {
        raw.tool.delete_side_files = false;
    }
}

/// Default config file name, looked up in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Adwatch.toml")
}

/// Directory that relative state paths are anchored to.
///
/// - If the config path has a non-empty parent (e.g. "conf/Adwatch.toml"),
///   we use that directory.
/// - Otherwise (bare file name, or no file at all) we fall back to the current
///   working directory.
fn config_root_dir(config_path: Option<&Path>) -> PathBuf {
    match config_path.and_then(Path::parent) {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}
