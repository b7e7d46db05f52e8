// src/lock.rs

//! Single-instance run lock.
//!
//! The lock is a small file holding the decimal PID of the run that owns it.
//! A token whose process is gone (the run crashed or was killed) is stale and
//! gets taken over; a token whose process is alive makes acquisition fail.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::fs::FileSystem;

/// Process-wide mutual exclusion between overlapping runs.
///
/// Released explicitly with [`RunLock::release`] or, failing that, on drop.
#[derive(Debug)]
pub struct RunLock<'a> {
    fs: &'a dyn FileSystem,
    path: PathBuf,
    pid: u32,
    held: bool,
    holder: Option<u32>,
    reclaimed: bool,
    stale_pid: Option<u32>,
}

impl<'a> RunLock<'a> {
    /// Lock at `path` on behalf of the current process.
    pub fn new(fs: &'a dyn FileSystem, path: impl Into<PathBuf>) -> Self {
        Self::for_pid(fs, path, std::process::id())
    }

    /// Lock at `path` on behalf of an explicit PID.
    pub fn for_pid(fs: &'a dyn FileSystem, path: impl Into<PathBuf>, pid: u32) -> Self {
        Self {
            fs,
            path: path.into(),
            pid,
            held: false,
            holder: None,
            reclaimed: false,
            stale_pid: None,
        }
    }

    /// PID of the live run that refused our last acquisition attempt.
    pub fn holder(&self) -> Option<u32> {
        self.holder
    }

    /// Whether acquisition took over a stale token left by a dead run.
    pub fn reclaimed_stale(&self) -> bool {
        self.reclaimed
    }

    /// PID recorded in the stale token we took over, when it was readable.
    pub fn stale_pid(&self) -> Option<u32> {
        self.stale_pid
    }

    /// Try to become the only running instance.
    ///
    /// Returns `false` when another live process holds the lock; the caller
    /// must then exit without side effects.
    pub fn acquire(&mut self) -> Result<bool> {
        if self.held {
            return Ok(true);
        }

        let token = self.pid.to_string();
        if self
            .fs
            .create_new(&self.path, token.as_bytes())
            .with_context(|| format!("creating lock file {:?}", self.path))?
        {
            self.held = true;
            info!(pid = self.pid, lock = %self.path.display(), "acquired run lock");
            return Ok(true);
        }

        let recorded = match self.fs.read_to_string(&self.path) {
            Ok(contents) => parse_pid(&contents),
            Err(e) => {
                debug!(error = %e, "lock file unreadable; treating as stale");
                None
            }
        };

        if let Some(pid) = recorded {
            if pid_is_alive(pid) {
                self.holder = Some(pid);
                info!(pid, "another instance is running; exiting");
                return Ok(false);
            }
        }

        // Only one run may replace a stale token; the rest back off.
        let guard = takeover_path(&self.path);
        if !self
            .fs
            .create_new(&guard, token.as_bytes())
            .with_context(|| format!("creating takeover guard {:?}", guard))?
        {
            self.clear_abandoned_guard(&guard);
            info!(lock = %self.path.display(), "another instance is taking over the stale lock; exiting");
            return Ok(false);
        }

        let taken = self.take_over(&token);
        self.remove_guard(&guard);
        taken
    }

    /// Replace the stale token. Runs with the takeover guard held.
    fn take_over(&mut self, token: &str) -> Result<bool> {
        // Re-read: the token may have changed hands since it was judged stale.
        if !self.fs.exists(&self.path) {
            let created = self
                .fs
                .create_new(&self.path, token.as_bytes())
                .with_context(|| format!("creating lock file {:?}", self.path))?;
            self.held = created;
            return Ok(created);
        }

        let current = self
            .fs
            .read_to_string(&self.path)
            .ok()
            .and_then(|s| parse_pid(&s));
        if let Some(pid) = current {
            if pid_is_alive(pid) {
                self.holder = Some(pid);
                info!(pid, "lock was taken over by another instance; exiting");
                return Ok(false);
            }
        }

        warn!(
            stale_pid = ?current,
            lock = %self.path.display(),
            "taking over stale run lock"
        );
        self.fs
            .write(&self.path, token.as_bytes())
            .with_context(|| format!("overwriting stale lock file {:?}", self.path))?;
        self.held = true;
        self.reclaimed = true;
        self.stale_pid = current;
        Ok(true)
    }

    /// Remove a guard whose owner died mid-takeover; the next run retries.
    fn clear_abandoned_guard(&self, guard: &Path) {
        let owner = self.fs.read_to_string(guard).ok().and_then(|s| parse_pid(&s));
        match owner {
            Some(pid) if !pid_is_alive(pid) => {
                warn!(pid, guard = %guard.display(), "removing takeover guard left by a dead run");
                if let Err(e) = self.fs.remove_file(guard) {
                    warn!(error = %e, guard = %guard.display(), "failed to remove takeover guard");
                }
            }
            Some(_) => {}
            None => warn!(
                guard = %guard.display(),
                "takeover guard has no readable owner; remove it if no other run is active"
            ),
        }
    }

    fn remove_guard(&self, guard: &Path) {
        let ours = self.fs.read_to_string(guard).ok().and_then(|s| parse_pid(&s)) == Some(self.pid);
        if !ours {
            return;
        }
        if let Err(e) = self.fs.remove_file(guard) {
            warn!(error = %e, guard = %guard.display(), "failed to remove takeover guard");
        }
    }

    /// Remove the token if this instance holds it.
    ///
    /// Never fails: problems are logged, since release runs on exit paths
    /// that are already reporting something else.
    pub fn release(&mut self) {
        if !self.held {
            return;
        }
        self.held = false;

        let still_ours = self
            .fs
            .read_to_string(&self.path)
            .ok()
            .and_then(|s| parse_pid(&s))
            == Some(self.pid);

        if !still_ours {
            warn!(lock = %self.path.display(), "lock token no longer ours; leaving it in place");
            return;
        }

        match self.fs.remove_file(&self.path) {
            Ok(_) => debug!(pid = self.pid, "released run lock"),
            Err(e) => warn!(error = %e, lock = %self.path.display(), "failed to remove lock file"),
        }
    }
}

impl Drop for RunLock<'_> {
    fn drop(&mut self) {
        self.release();
    }
}

/// `<lock>.takeover`, created exclusively while a stale token is replaced.
fn takeover_path(lock: &Path) -> PathBuf {
    let mut name = lock.as_os_str().to_os_string();
    name.push(".takeover");
    PathBuf::from(name)
}

fn parse_pid(contents: &str) -> Option<u32> {
    contents.trim().parse::<u32>().ok().filter(|pid| *pid > 0)
}

/// Best-effort liveness check for a recorded PID.
///
/// Only an explicit "no such process" answer counts as dead; any other
/// failure (e.g. the process belongs to another user) counts as alive so two
/// runs never overlap.
#[cfg(unix)]
pub fn pid_is_alive(pid: u32) -> bool {
    let Ok(pid) = libc::pid_t::try_from(pid) else {
        return false;
    };
    if pid <= 0 {
        return false;
    }

    // SAFETY: kill with signal 0 doesn't actually send a signal;
    // it only checks whether the process exists.
    if unsafe { libc::kill(pid, 0) } == 0 {
        return true;
    }
    std::io::Error::last_os_error().raw_os_error() != Some(libc::ESRCH)
}

#[cfg(not(unix))]
pub fn pid_is_alive(_pid: u32) -> bool {
    // No signal check available; trust the token.
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;
    use std::fmt;
    use std::sync::Mutex;

    /// Larger than any Linux `pid_max`, so never a live process.
    const DEAD_PID: u32 = 999_999_999;
    const LOCK: &str = "/state/adwatch.lock";
    const GUARD: &str = "/state/adwatch.lock.takeover";

    type Hook = Box<dyn FnOnce(&MockFileSystem) + Send>;

    /// Mock filesystem that runs `hook` right after the first read of the
    /// lock token, letting a second instance act between our read and write.
    struct InterleavedFs {
        inner: MockFileSystem,
        hook: Mutex<Option<Hook>>,
    }

    impl fmt::Debug for InterleavedFs {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("InterleavedFs").finish_non_exhaustive()
        }
    }

    impl FileSystem for InterleavedFs {
        fn read_to_string(&self, path: &Path) -> Result<String> {
            let result = self.inner.read_to_string(path);
            if path == Path::new(LOCK) {
                let hook = self.hook.lock().unwrap().take();
                if let Some(hook) = hook {
                    hook(&self.inner);
                }
            }
            result
        }
        fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
            self.inner.write(path, contents)
        }
        fn append(&self, path: &Path, contents: &[u8]) -> Result<()> {
            self.inner.append(path, contents)
        }
        fn create_new(&self, path: &Path, contents: &[u8]) -> Result<bool> {
            self.inner.create_new(path, contents)
        }
        fn rename(&self, from: &Path, to: &Path) -> Result<()> {
            self.inner.rename(from, to)
        }
        fn remove_file(&self, path: &Path) -> Result<bool> {
            self.inner.remove_file(path)
        }
        fn create_dir_all(&self, path: &Path) -> Result<()> {
            self.inner.create_dir_all(path)
        }
        fn exists(&self, path: &Path) -> bool {
            self.inner.exists(path)
        }
        fn is_file(&self, path: &Path) -> bool {
            self.inner.is_file(path)
        }
        fn is_dir(&self, path: &Path) -> bool {
            self.inner.is_dir(path)
        }
        fn is_symlink(&self, path: &Path) -> bool {
            self.inner.is_symlink(path)
        }
        fn file_size(&self, path: &Path) -> Result<u64> {
            self.inner.file_size(path)
        }
        fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
            self.inner.read_dir(path)
        }
    }

    #[test]
    fn own_process_is_alive() {
        assert!(pid_is_alive(std::process::id()));
    }

    #[cfg(unix)]
    #[test]
    fn unused_pid_is_dead() {
        assert!(!pid_is_alive(DEAD_PID));
    }

    #[test]
    fn fresh_acquire_writes_pid_and_release_removes_it() {
        let fs = MockFileSystem::new();
        let mut lock = RunLock::new(&fs, LOCK);

        assert!(lock.acquire().unwrap());
        assert!(!lock.reclaimed_stale());
        assert_eq!(
            fs.read_to_string(Path::new(LOCK)).unwrap(),
            std::process::id().to_string()
        );

        lock.release();
        assert!(!fs.exists(Path::new(LOCK)));
    }

    #[test]
    fn live_holder_blocks_acquisition() {
        let fs = MockFileSystem::new();
        let live = std::process::id();
        fs.add_file(LOCK, live.to_string());

        let mut lock = RunLock::for_pid(&fs, LOCK, 4242);
        assert!(!lock.acquire().unwrap());
        assert_eq!(lock.holder(), Some(live));

        drop(lock);
        assert_eq!(fs.read_to_string(Path::new(LOCK)).unwrap(), live.to_string());
    }

    #[cfg(unix)]
    #[test]
    fn dead_holder_is_taken_over() {
        let fs = MockFileSystem::new();
        fs.add_file(LOCK, format!("{DEAD_PID}\n"));

        let mut lock = RunLock::new(&fs, LOCK);
        assert!(lock.acquire().unwrap());
        assert!(lock.reclaimed_stale());
        assert_eq!(lock.stale_pid(), Some(DEAD_PID));
        assert_eq!(
            fs.read_to_string(Path::new(LOCK)).unwrap(),
            std::process::id().to_string()
        );
    }

    #[test]
    fn garbage_token_counts_as_stale() {
        let fs = MockFileSystem::new();
        fs.add_file(LOCK, "not a pid");

        let mut lock = RunLock::new(&fs, LOCK);
        assert!(lock.acquire().unwrap());
        assert!(lock.reclaimed_stale());
        assert_eq!(lock.stale_pid(), None);
    }

    #[test]
    fn drop_releases_held_lock() {
        let fs = MockFileSystem::new();
        {
            let mut lock = RunLock::new(&fs, LOCK);
            assert!(lock.acquire().unwrap());
        }
        assert!(!fs.exists(Path::new(LOCK)));
    }

    #[test]
    fn release_keeps_a_token_that_was_replaced() {
        let fs = MockFileSystem::new();
        let mut lock = RunLock::for_pid(&fs, LOCK, 4242);
        assert!(lock.acquire().unwrap());

        fs.add_file(LOCK, "5151");
        lock.release();
        assert_eq!(fs.read_to_string(Path::new(LOCK)).unwrap(), "5151");
    }

    #[cfg(unix)]
    #[test]
    fn only_one_of_two_racing_instances_takes_over_a_stale_token() {
        let inner = MockFileSystem::new();
        inner.add_file(LOCK, DEAD_PID.to_string());
        let live = std::process::id();

        // The other instance takes over after we have read the dead token
        // but before we act on it.
        let hook: Hook = Box::new(|fs: &MockFileSystem| {
            let mut first = RunLock::new(fs, LOCK);
            assert!(first.acquire().unwrap());
            std::mem::forget(first);
        });
        let fs = InterleavedFs {
            inner: inner.clone(),
            hook: Mutex::new(Some(hook)),
        };

        let mut late = RunLock::for_pid(&fs, LOCK, 4242);
        assert!(!late.acquire().unwrap());
        assert_eq!(late.holder(), Some(live));
        assert!(!late.reclaimed_stale());

        drop(late);
        assert_eq!(inner.read_to_string(Path::new(LOCK)).unwrap(), live.to_string());
        assert!(!inner.exists(Path::new(GUARD)));
    }

    #[test]
    fn takeover_in_progress_makes_acquisition_back_off() {
        let fs = MockFileSystem::new();
        fs.add_file(LOCK, "not a pid");
        fs.add_file(GUARD, std::process::id().to_string());

        let mut lock = RunLock::for_pid(&fs, LOCK, 4242);
        assert!(!lock.acquire().unwrap());
        assert_eq!(fs.read_to_string(Path::new(LOCK)).unwrap(), "not a pid");
        assert!(fs.exists(Path::new(GUARD)));
    }

    #[cfg(unix)]
    #[test]
    fn guard_left_by_a_dead_run_is_cleared_for_the_next_attempt() {
        let fs = MockFileSystem::new();
        fs.add_file(LOCK, DEAD_PID.to_string());
        fs.add_file(GUARD, DEAD_PID.to_string());

        let mut lock = RunLock::new(&fs, LOCK);
        assert!(!lock.acquire().unwrap());
        assert!(!fs.exists(Path::new(GUARD)));

        assert!(lock.acquire().unwrap());
        assert!(lock.reclaimed_stale());
        assert!(!fs.exists(Path::new(GUARD)));
    }

    #[test]
    fn token_released_during_takeover_is_acquired_fresh() {
        let inner = MockFileSystem::new();
        inner.add_file(LOCK, "not a pid");
        let hook: Hook = Box::new(|fs: &MockFileSystem| fs.remove(LOCK));
        let fs = InterleavedFs {
            inner: inner.clone(),
            hook: Mutex::new(Some(hook)),
        };

        let mut lock = RunLock::for_pid(&fs, LOCK, 4242);
        assert!(lock.acquire().unwrap());
        assert!(!lock.reclaimed_stale());
        assert_eq!(inner.read_to_string(Path::new(LOCK)).unwrap(), "4242");
    }
}
