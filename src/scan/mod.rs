// src/scan/mod.rs

//! Candidate discovery.
//!
//! This module is responsible for:
//! - Compiling the recording filename glob and the user's ignore list.
//! - Walking the watched roots lazily and yielding matching files.
//! - Deriving the identity string under which a recording is tracked.
//!
//! It does **not** know about the persisted sets; filtering by state happens
//! in the engine.

pub mod patterns;
pub mod walker;

use std::path::Path;

use crate::types::IdentityMode;

pub use patterns::{FilePattern, IgnoreList};
pub use walker::CandidateWalker;

/// Identity of a recording under the given mode.
pub fn identity_of(path: &Path, mode: IdentityMode) -> String {
    match mode {
        IdentityMode::Path => path.to_string_lossy().into_owned(),
        IdentityMode::FileName => path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned()),
    }
}
