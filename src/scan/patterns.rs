// src/scan/patterns.rs

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use globset::{Glob, GlobMatcher, GlobSet, GlobSetBuilder};
use tracing::debug;

/// Compiled filename pattern for recordings, e.g. `*.ts`.
///
/// Matched against the file name only, so `*.ts` finds recordings at any
/// depth below a root.
#[derive(Clone)]
pub struct FilePattern {
    raw: String,
    set: GlobSet,
}

impl fmt::Debug for FilePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilePattern")
            .field("raw", &self.raw)
            .finish_non_exhaustive()
    }
}

impl FilePattern {
    pub fn new(pattern: &str) -> Result<Self> {
        let set = build_globset(&[pattern.to_string()])
            .with_context(|| format!("building filename globset for {pattern}"))?;
        Ok(Self {
            raw: pattern.to_string(),
            set,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn matches(&self, path: &Path) -> bool {
        match path.file_name() {
            Some(name) => self.set.is_match(name),
            None => false,
        }
    }
}

/// One user-declared exclusion from the ignore list.
#[derive(Debug, Clone)]
struct IgnoreEntry {
    raw: String,
    glob: Option<GlobMatcher>,
}

/// The ignore list, loaded read-only at the start of each run.
///
/// An entry suppresses a candidate when it is a substring of the full path
/// or of the file name, or when it glob-matches either. Entries that fail to
/// compile as globs still work as substrings.
#[derive(Debug, Clone, Default)]
pub struct IgnoreList {
    entries: Vec<IgnoreEntry>,
}

impl IgnoreList {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = patterns
            .into_iter()
            .map(|p: S| -> String { p.into() })
            .filter(|raw| !raw.is_empty())
            .map(|raw| {
                let glob = match Glob::new(&raw) {
                    Ok(g) => Some(g.compile_matcher()),
                    Err(e) => {
                        debug!(pattern = %raw, error = %e, "ignore entry is not a glob; using substring match only");
                        None
                    }
                };
                IgnoreEntry { raw, glob }
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First matching entry for the given recording, if any.
    pub fn matching(&self, path: &Path) -> Option<&str> {
        let full = path.to_string_lossy();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| full.clone());

        self.entries
            .iter()
            .find(|entry| {
                if full.contains(entry.raw.as_str()) || name.contains(entry.raw.as_str()) {
                    return true;
                }
                match &entry.glob {
                    Some(glob) => glob.is_match(&*name) || glob.is_match(&*full),
                    None => false,
                }
            })
            .map(|entry| entry.raw.as_str())
    }
}

/// Build a GlobSet from simple string patterns.
fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat)
            .with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}
