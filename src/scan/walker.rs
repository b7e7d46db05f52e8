// src/scan/walker.rs

//! Lazy, deterministic walk over the watched roots.

use std::collections::VecDeque;
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::fs::FileSystem;
use crate::scan::patterns::FilePattern;

/// Iterator over the files below a sequence of roots.
///
/// Directories are read one at a time as the iterator advances, so a long
/// run (the tool can take many minutes per recording) sees files that appear
/// in not-yet-visited directories. Each directory's entries are visited in
/// sorted order; a file's siblings come before anything in its subdirectories.
///
/// Symlinked directories below a root are not entered, so a link can neither
/// loop nor present one recording under a second path. A root that is itself
/// a link is followed, and so are links to files.
///
/// Missing roots and unreadable directories are logged and skipped.
pub struct CandidateWalker<'a> {
    fs: &'a dyn FileSystem,
    pattern: Option<&'a FilePattern>,
    roots: VecDeque<PathBuf>,
    dirs: Vec<PathBuf>,
    ready: VecDeque<PathBuf>,
}

impl<'a> CandidateWalker<'a> {
    /// Walk `roots`, yielding files whose name matches `pattern`.
    pub fn new<I>(fs: &'a dyn FileSystem, roots: I, pattern: &'a FilePattern) -> Self
    where
        I: IntoIterator<Item = PathBuf>,
    {
        Self::build(fs, roots, Some(pattern))
    }

    /// Walk `roots`, yielding every file.
    pub fn all_files<I>(fs: &'a dyn FileSystem, roots: I) -> Self
    where
        I: IntoIterator<Item = PathBuf>,
    {
        Self::build(fs, roots, None)
    }

    fn build<I>(fs: &'a dyn FileSystem, roots: I, pattern: Option<&'a FilePattern>) -> Self
    where
        I: IntoIterator<Item = PathBuf>,
    {
        Self {
            fs,
            pattern,
            roots: roots.into_iter().collect(),
            dirs: Vec::new(),
            ready: VecDeque::new(),
        }
    }

    fn expand(&mut self, dir: PathBuf) {
        let mut entries = match self.fs.read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "cannot read directory; skipping");
                return;
            }
        };
        entries.sort();

        let mut subdirs = Vec::new();
        for path in entries {
            if self.fs.is_dir(&path) {
                if self.fs.is_symlink(&path) {
                    debug!(dir = %path.display(), "not following directory symlink");
                    continue;
                }
                subdirs.push(path);
            } else if self.fs.is_file(&path) {
                if self.pattern.is_none_or(|p| p.matches(&path)) {
                    self.ready.push_back(path);
                }
            }
        }

        // Reverse so the first subdirectory (in sorted order) is popped first.
        self.dirs.extend(subdirs.into_iter().rev());
    }
}

impl Iterator for CandidateWalker<'_> {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        loop {
            if let Some(path) = self.ready.pop_front() {
                return Some(path);
            }

            if let Some(dir) = self.dirs.pop() {
                self.expand(dir);
                continue;
            }

            let root = self.roots.pop_front()?;
            if self.fs.is_dir(&root) {
                debug!(root = %root.display(), "scanning root");
                self.dirs.push(root);
            } else {
                warn!(root = %root.display(), "watched root does not exist; skipping");
            }
        }
    }
}
