// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod lock;
pub mod logging;
pub mod scan;
pub mod stability;
pub mod store;
pub mod types;

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{load_for_cli, ConfigFile};
use crate::engine::{run_once, RunReport};
use crate::exec::CommandToolRunner;
use crate::fs::RealFileSystem;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (file + CLI overrides)
/// - the real filesystem and tool runner
/// - one locked engine run
///
/// Lock contention and per-recording failures are reported in the log and
/// still return `Ok`; only configuration or state-level problems are errors.
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_for_cli(&args)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let fs = RealFileSystem;
    let mut runner = CommandToolRunner::new();

    match run_once(&cfg, &fs, &mut runner).await? {
        RunReport::LockContended { holder_pid } => {
            info!(?holder_pid, "another run holds the lock; nothing to do");
        }
        RunReport::Completed(summary) => {
            info!(
                discovered = summary.discovered,
                processed = summary.succeeded,
                no_adverts = summary.no_op,
                failed = summary.failed,
                still_writing = summary.still_writing,
                skipped = summary.ignored + summary.already_done + summary.in_flight,
                forgotten = summary.reconciled,
                "run complete"
            );
        }
    }

    Ok(())
}

/// Simple dry-run output: print the effective configuration.
fn print_dry_run(cfg: &ConfigFile) {
    println!("adwatch dry-run");
    println!("  watch.roots:");
    for root in cfg.watch.roots.iter() {
        println!("    - {}", root.display());
    }
    println!("  watch.pattern = {}", cfg.watch.pattern);
    println!("  watch.stability_wait_secs = {}", cfg.watch.stability_wait_secs);
    println!("  watch.identity = {:?}", cfg.watch.identity);
    println!();

    println!("  tool.path = {}", cfg.tool.path.display());
    println!("  tool.args = {:?}", cfg.tool.args);
    println!("  tool.output_dir = {}", cfg.tool.output_dir.display());
    println!("  tool.benign_marker = {:?}", cfg.tool.benign_marker);
    if cfg.tool.delete_side_files {
        println!("  tool.side_file_extensions = {:?}", cfg.tool.side_file_extensions);
    } else {
        println!("  tool.delete_side_files = false");
    }
    println!();

    println!("  state.ignored = {}", cfg.state.ignored.display());
    println!("  state.in_flight = {}", cfg.state.in_flight.display());
    println!("  state.done = {}", cfg.state.done.display());
    println!("  state.lock = {}", cfg.state.lock.display());
    println!("  state.error_log = {}", cfg.state.error_log.display());
    if cfg.state.reclaim_stale_in_flight {
        println!("  state.reclaim_stale_in_flight = true");
    }

    debug!("dry-run complete (no execution)");
}
