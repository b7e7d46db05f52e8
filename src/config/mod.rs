// src/config/mod.rs

//! Configuration loading and validation for adwatch.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk and merge CLI overrides (`loader.rs`).
//! - Validate basic invariants like "at least one root" (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{apply_overrides, load_and_validate, load_for_cli, load_from_path};
pub use model::{ConfigFile, RawConfigFile, StateSection, ToolSection, WatchSection};
