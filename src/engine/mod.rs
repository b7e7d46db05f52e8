// src/engine/mod.rs

//! Job-processing engine for adwatch.
//!
//! This module ties together:
//! - the run lock (one run at a time across overlapping scheduler ticks)
//! - the persisted sets and their reconciliation against disk
//! - the dispatcher loop that feeds recordings to the external tool
//! - outcome classification
//!
//! The pure triage logic lives in [`core`]; the IO-heavy loop is implemented
//! in [`dispatcher`].

use tracing::{info, warn};

use crate::config::ConfigFile;
use crate::exec::ToolRunner;
use crate::fs::FileSystem;
use crate::lock::RunLock;
use crate::store::{SetKind, SetStore};

pub mod classify;
pub mod core;
pub mod dispatcher;

pub use self::classify::{classify, Outcome};
pub use self::core::{triage, Triage, TrackedSets};
pub use self::dispatcher::Dispatcher;

/// Per-run counters, one bucket per way a recording can leave the loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Files matching the pattern below the roots.
    pub discovered: usize,
    pub ignored: usize,
    pub already_done: usize,
    pub in_flight: usize,
    pub still_writing: usize,
    /// Disappeared between discovery and the tool invocation.
    pub vanished: usize,
    pub succeeded: usize,
    /// Non-zero exit with the benign marker.
    pub no_op: usize,
    pub failed: usize,
    pub cleanup_failures: usize,
    /// Set writes that failed; the affected recording stays excluded.
    pub store_errors: usize,
    /// `Done` entries dropped because their recording is gone.
    pub reconciled: usize,
    /// Stale `InFlight` entries cleared at start.
    pub reclaimed_in_flight: usize,
}

impl RunSummary {
    /// Number of tool invocations made in this run.
    pub fn invocations(&self) -> usize {
        self.succeeded + self.no_op + self.failed
    }
}

/// How a call to [`run_once`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunReport {
    /// Another live run holds the lock; nothing was touched.
    LockContended { holder_pid: Option<u32> },
    Completed(RunSummary),
}

/// One complete run: lock, reconcile, dispatch, release.
///
/// The lock is released on every path out of this function, including
/// errors. Only problems that make the whole run impossible (state files
/// that cannot be created, an output directory that cannot be made) are
/// returned as `Err`; anything specific to one recording is counted in the
/// summary instead.
pub async fn run_once<R: ToolRunner>(
    config: &ConfigFile,
    fs: &dyn FileSystem,
    runner: &mut R,
) -> anyhow::Result<RunReport> {
    let mut lock = RunLock::new(fs, config.state.lock.clone());
    if !lock.acquire()? {
        return Ok(RunReport::LockContended {
            holder_pid: lock.holder(),
        });
    }

    let result = run_locked(config, fs, runner, &lock).await;
    lock.release();
    result.map(RunReport::Completed)
}

async fn run_locked<R: ToolRunner>(
    config: &ConfigFile,
    fs: &dyn FileSystem,
    runner: &mut R,
    lock: &RunLock<'_>,
) -> anyhow::Result<RunSummary> {
    fs.create_dir_all(&config.tool.output_dir)?;

    let store = SetStore::new(fs, config.set_paths());
    for kind in SetKind::ALL {
        store.ensure(kind)?;
    }

    let reconciled = store.reconcile_done(&config.watch.roots, config.watch.identity)?;
    let reclaimed = settle_stale_in_flight(config, &store, lock)?;

    let mut summary = Dispatcher::new(config, fs, &store, runner)?.run().await;
    summary.reconciled = reconciled.len();
    summary.reclaimed_in_flight = reclaimed;
    Ok(summary)
}

/// Apply the stale in-flight policy; returns how many entries were cleared.
///
/// Entries are only cleared when `reclaim_stale_in_flight` is set and the
/// lock was taken over from a dead run, so they can only belong to that run.
/// Otherwise they stay, and the recordings remain skipped until an operator
/// edits the in-flight file.
fn settle_stale_in_flight(
    config: &ConfigFile,
    store: &SetStore<'_>,
    lock: &RunLock<'_>,
) -> anyhow::Result<usize> {
    let stale = store.load(SetKind::InFlight)?;
    if stale.is_empty() {
        return Ok(0);
    }

    if config.state.reclaim_stale_in_flight && lock.reclaimed_stale() {
        warn!(
            entries = ?stale,
            stale_pid = ?lock.stale_pid(),
            "clearing in-flight entries left by a crashed run"
        );
        let cleared = store.retain(SetKind::InFlight, |_| false)?;
        return Ok(cleared.len());
    }

    warn!(
        entries = ?stale,
        file = %store.paths().in_flight.display(),
        "recordings still marked in flight; they stay skipped until removed from this file"
    );
    info!(count = stale.len(), "in-flight entries carried over");
    Ok(0)
}
