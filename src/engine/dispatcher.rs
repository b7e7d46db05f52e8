// src/engine/dispatcher.rs

//! The orchestration loop.
//!
//! For each discovered recording, strictly one after another:
//!
//! 1. skip if ignored, done, or in flight ([`triage`]);
//! 2. skip if still being written ([`StabilityDetector`]);
//! 3. mark in flight (the commit point);
//! 4. run the tool and classify the result;
//! 5. on success: mark done, clear in flight, delete side files;
//!    on failure: clear in flight, append a block to the error log.
//!
//! Nothing that happens to one recording aborts the batch.

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{debug, error, info, warn};

use crate::config::ConfigFile;
use crate::engine::classify::{classify, Outcome};
use crate::engine::core::{triage, Triage, TrackedSets};
use crate::engine::RunSummary;
use crate::exec::{ToolInvocation, ToolRunner};
use crate::fs::FileSystem;
use crate::scan::{identity_of, CandidateWalker, FilePattern, IgnoreList};
use crate::stability::StabilityDetector;
use crate::store::{SetKind, SetStore};

pub struct Dispatcher<'a, R: ToolRunner> {
    config: &'a ConfigFile,
    fs: &'a dyn FileSystem,
    store: &'a SetStore<'a>,
    runner: &'a mut R,
    detector: StabilityDetector,
    pattern: FilePattern,
    ignore: IgnoreList,
    sets: TrackedSets,
    summary: RunSummary,
}

impl<'a, R: ToolRunner> Dispatcher<'a, R> {
    /// Load the ignore list and the current `Done` / `InFlight` sets.
    pub fn new(
        config: &'a ConfigFile,
        fs: &'a dyn FileSystem,
        store: &'a SetStore<'a>,
        runner: &'a mut R,
    ) -> Result<Self> {
        let pattern = FilePattern::new(&config.watch.pattern)?;
        let ignore = IgnoreList::new(store.load(SetKind::Ignored)?);
        let sets = TrackedSets::new(store.load(SetKind::Done)?, store.load(SetKind::InFlight)?);

        debug!(ignore_entries = ignore.len(), "loaded ignore list");

        Ok(Self {
            config,
            fs,
            store,
            runner,
            detector: StabilityDetector::new(config.stability_wait()),
            pattern,
            ignore,
            sets,
            summary: RunSummary::default(),
        })
    }

    /// Replace the stability detector (tests use sub-second waits).
    pub fn with_detector(mut self, detector: StabilityDetector) -> Self {
        self.detector = detector;
        self
    }

    /// Walk every root and process each matching recording in turn.
    pub async fn run(mut self) -> RunSummary {
        let fs = self.fs;
        let pattern = self.pattern.clone();
        let roots = self.config.watch.roots.clone();

        info!(roots = ?roots, pattern = %pattern.as_str(), "checking for new recordings");

        for path in CandidateWalker::new(fs, roots, &pattern) {
            self.process(path).await;
        }

        self.summary
    }

    async fn process(&mut self, path: PathBuf) {
        self.summary.discovered += 1;
        let identity = identity_of(&path, self.config.watch.identity);

        match triage(&path, &identity, &self.ignore, &self.sets) {
            Triage::Ignored(entry) => {
                info!(file = %path.display(), entry, "in the ignore list; not processing");
                self.summary.ignored += 1;
                return;
            }
            Triage::AlreadyDone => {
                debug!(file = %path.display(), "already processed");
                self.summary.already_done += 1;
                return;
            }
            Triage::InFlight => {
                info!(file = %path.display(), "marked in flight; skipping");
                self.summary.in_flight += 1;
                return;
            }
            Triage::Eligible => {}
        }

        match self.detector.is_still_writing(self.fs, &path).await {
            Ok(true) => {
                self.summary.still_writing += 1;
                return;
            }
            Ok(false) => {}
            Err(e) => {
                debug!(file = %path.display(), error = %e, "recording vanished before size check");
                self.summary.vanished += 1;
                return;
            }
        }

        if !self.fs.is_file(&path) {
            debug!(file = %path.display(), "recording vanished during size check");
            self.summary.vanished += 1;
            return;
        }

        // Commit point: from here on the in-flight marker must be cleared
        // once the tool has been attempted.
        if let Err(e) = self.store.add(SetKind::InFlight, &identity) {
            error!(file = %path.display(), error = %e, "cannot mark recording in flight; skipping");
            self.summary.store_errors += 1;
            return;
        }
        self.sets.mark_in_flight(&identity);

        let config = self.config;
        let tool = &config.tool;
        let invocation = ToolInvocation::new(&tool.path, &tool.args, &tool.output_dir, &path);

        info!(file = %path.display(), "processing");
        let outcome = match self.runner.run(&invocation).await {
            Ok(output) => classify(output, &tool.benign_marker),
            Err(e) => Outcome::Failure {
                exit_code: None,
                stdout: String::new(),
                stderr: format!("{e:#}\n"),
            },
        };

        if outcome.is_success() {
            self.finish_success(&path, &identity, &outcome);
        } else {
            self.finish_failure(&path, &identity, &invocation, outcome);
        }
    }

    fn finish_success(&mut self, path: &Path, identity: &str, outcome: &Outcome) {
        if let Err(e) = self.store.add(SetKind::Done, identity) {
            // Leave the in-flight marker: re-running the tool later would be
            // worse than skipping the recording until someone looks.
            error!(
                file = %path.display(),
                error = %e,
                "tool succeeded but recording could not be marked done; leaving it in flight"
            );
            self.summary.store_errors += 1;
            return;
        }
        self.sets.mark_done(identity);
        self.clear_in_flight(identity);

        match outcome {
            Outcome::BenignNoOp => {
                info!(file = %path.display(), "no adverts found");
                self.summary.no_op += 1;
            }
            _ => {
                info!(file = %path.display(), "processed");
                self.summary.succeeded += 1;
            }
        }

        if self.config.tool.delete_side_files {
            self.delete_side_files(path);
        }
    }

    fn finish_failure(
        &mut self,
        path: &Path,
        identity: &str,
        invocation: &ToolInvocation,
        outcome: Outcome,
    ) {
        self.clear_in_flight(identity);
        self.summary.failed += 1;

        let Outcome::Failure {
            exit_code,
            stdout,
            stderr,
        } = outcome
        else {
            return;
        };

        error!(
            file = %path.display(),
            ?exit_code,
            "tool failed; details in error log"
        );

        let tool_name = self
            .config
            .tool
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.config.tool.path.display().to_string());
        let block = format!(
            "\n--- {tool_name} FAILED: {}\nCMD: {}\n{stdout}{stderr}",
            path.display(),
            invocation.command_line(),
        );
        self.append_error_log(&block);
    }

    fn clear_in_flight(&mut self, identity: &str) {
        if let Err(e) = self.store.remove(SetKind::InFlight, identity) {
            error!(identity, error = %e, "failed to clear in-flight marker");
            self.summary.store_errors += 1;
        }
        self.sets.clear_in_flight(identity);
    }

    /// Best-effort removal of `<stem>.<ext>` from the output directory.
    fn delete_side_files(&mut self, path: &Path) {
        let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
            return;
        };
        let config = self.config;

        for ext in config.tool.side_file_extensions.iter() {
            let side = config.tool.output_dir.join(format!("{stem}.{}", ext.trim_start_matches('.')));
            match self.fs.remove_file(&side) {
                Ok(true) => debug!(file = %side.display(), "deleted side file"),
                Ok(false) => {}
                Err(e) => {
                    warn!(file = %side.display(), error = %e, "failed to delete side file");
                    self.summary.cleanup_failures += 1;
                    let block = format!("\n--- Failed deleting {}\n{e:#}\n", side.display());
                    self.append_error_log(&block);
                }
            }
        }
    }

    fn append_error_log(&self, block: &str) {
        let log = &self.config.state.error_log;
        if let Err(e) = self.fs.append(log, block.as_bytes()) {
            warn!(log = %log.display(), error = %e, "failed to write error log");
        }
    }
}
