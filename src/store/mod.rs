// src/store/mod.rs

//! Persisted "ignored / in-flight / done" sets.
//!
//! Each set lives in its own line-oriented UTF-8 file, one identity per line.
//! Appends go straight to the end of the file; removals rewrite the whole file
//! through `<file>.tmp` + rename, so a crash leaves either the old or the new
//! content on disk, never a mix.
//!
//! A missing file is an empty set (and is created). An unreadable file is
//! logged and treated as empty as well.

use std::collections::HashSet;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::{debug, info, warn};

use crate::fs::FileSystem;
use crate::scan::CandidateWalker;
use crate::types::IdentityMode;

/// Which of the three persisted sets an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetKind {
    /// User-declared exclusions; read-only for the engine.
    Ignored,
    /// Recordings the tool is currently running on (or was, when a run died).
    InFlight,
    /// Recordings the tool finished successfully.
    Done,
}

impl SetKind {
    pub const ALL: [SetKind; 3] = [SetKind::Ignored, SetKind::InFlight, SetKind::Done];

    /// Whether `#` lines are comments in this set's file.
    fn allows_comments(self) -> bool {
        matches!(self, SetKind::Ignored)
    }
}

impl fmt::Display for SetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SetKind::Ignored => "ignored",
            SetKind::InFlight => "in-flight",
            SetKind::Done => "done",
        };
        f.write_str(name)
    }
}

/// Locations of the three set files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetPaths {
    pub ignored: PathBuf,
    pub in_flight: PathBuf,
    pub done: PathBuf,
}

impl SetPaths {
    pub fn path(&self, kind: SetKind) -> &Path {
        match kind {
            SetKind::Ignored => &self.ignored,
            SetKind::InFlight => &self.in_flight,
            SetKind::Done => &self.done,
        }
    }
}

/// Durable storage for the three sets.
#[derive(Debug)]
pub struct SetStore<'a> {
    fs: &'a dyn FileSystem,
    paths: SetPaths,
}

impl<'a> SetStore<'a> {
    pub fn new(fs: &'a dyn FileSystem, paths: SetPaths) -> Self {
        Self { fs, paths }
    }

    pub fn paths(&self) -> &SetPaths {
        &self.paths
    }

    /// Create the backing file of `kind` empty if it does not exist.
    pub fn ensure(&self, kind: SetKind) -> Result<()> {
        let path = self.paths.path(kind);
        if self.fs.create_new(path, b"")? {
            info!(set = %kind, path = %path.display(), "created empty set file");
        }
        Ok(())
    }

    /// Read every identity in `kind`, in file order.
    pub fn load(&self, kind: SetKind) -> Result<Vec<String>> {
        let path = self.paths.path(kind);
        if !self.fs.exists(path) {
            self.ensure(kind)?;
            return Ok(Vec::new());
        }

        match self.fs.read_to_string(path) {
            Ok(contents) => Ok(parse_entries(&contents, kind)),
            Err(e) => {
                warn!(
                    set = %kind,
                    path = %path.display(),
                    error = %e,
                    "set file unreadable; treating it as empty"
                );
                Ok(Vec::new())
            }
        }
    }

    /// Durably append `identity` to `kind`.
    pub fn add(&self, kind: SetKind, identity: &str) -> Result<()> {
        if identity.is_empty() || identity.contains(['\n', '\r']) {
            bail!("identity {identity:?} cannot be stored as a single line");
        }
        let path = self.paths.path(kind);
        self.fs
            .append(path, format!("{identity}\n").as_bytes())
            .with_context(|| format!("adding {identity:?} to {kind} set"))?;
        debug!(set = %kind, identity, "added to set");
        Ok(())
    }

    /// Durably delete every record equal to `identity`.
    ///
    /// Returns how many records were removed; the file is left untouched when
    /// that is zero.
    pub fn remove(&self, kind: SetKind, identity: &str) -> Result<usize> {
        let removed = self.retain(kind, |entry| entry != identity)?;
        debug!(set = %kind, identity, removed = removed.len(), "removed from set");
        Ok(removed.len())
    }

    /// Keep only entries for which `keep` returns true, rewriting the file
    /// atomically if anything was dropped. Returns the dropped entries.
    pub fn retain<F>(&self, kind: SetKind, mut keep: F) -> Result<Vec<String>>
    where
        F: FnMut(&str) -> bool,
    {
        let entries = self.load(kind)?;
        let (kept, dropped): (Vec<String>, Vec<String>) =
            entries.into_iter().partition(|entry| keep(entry.as_str()));

        if dropped.is_empty() {
            return Ok(dropped);
        }

        self.rewrite(kind, &kept)?;
        Ok(dropped)
    }

    /// Drop `Done` entries whose recording no longer exists.
    ///
    /// - `IdentityMode::Path`: the entry must still be a file.
    /// - `IdentityMode::FileName`: some file with that name must exist below
    ///   one of `roots`.
    ///
    /// Returns the dropped entries.
    pub fn reconcile_done(&self, roots: &[PathBuf], mode: IdentityMode) -> Result<Vec<String>> {
        let dropped = match mode {
            IdentityMode::Path => self.retain(SetKind::Done, |entry| self.fs.is_file(Path::new(entry)))?,
            IdentityMode::FileName => {
                let on_disk: HashSet<String> = CandidateWalker::all_files(self.fs, roots.iter().cloned())
                    .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
                    .collect();
                self.retain(SetKind::Done, |entry| on_disk.contains(entry))?
            }
        };

        for entry in &dropped {
            info!(identity = %entry, "recording gone from disk; forgetting it was done");
        }
        Ok(dropped)
    }

    fn rewrite(&self, kind: SetKind, entries: &[String]) -> Result<()> {
        let path = self.paths.path(kind);
        let tmp = tmp_path(path);

        let mut contents = entries.join("\n");
        if !entries.is_empty() {
            contents.push('\n');
        }

        self.fs
            .write(&tmp, contents.as_bytes())
            .with_context(|| format!("writing replacement for {kind} set"))?;
        self.fs
            .rename(&tmp, path)
            .with_context(|| format!("swapping in rewritten {kind} set"))?;
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

/// Split a set file into entries.
///
/// Ignore entries are hand-written, so they are trimmed and may be comments.
/// Tracked identities are stored verbatim by [`SetStore::add`] and only lose
/// their line terminator; a recording named `" show.ts"` must read back as
/// exactly that.
fn parse_entries(contents: &str, kind: SetKind) -> Vec<String> {
    contents
        .lines()
        .map(|line| match kind {
            SetKind::Ignored => line.trim(),
            SetKind::InFlight | SetKind::Done => line.trim_end_matches('\r'),
        })
        .filter(|line| !line.is_empty())
        .filter(|line| !(kind.allows_comments() && line.starts_with('#')))
        .map(str::to_string)
        .collect()
}
