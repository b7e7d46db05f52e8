// src/config/model.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::store::SetPaths;
use crate::types::IdentityMode;

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [watch]
/// roots = ["/recordings/hd", "/recordings/sd"]
/// pattern = "*.ts"
///
/// [tool]
/// path = "/usr/local/bin/comskip"
/// output_dir = "/videos"
///
/// [state]
/// dir = "/var/lib/adwatch"
/// ```
///
/// All sections are optional and have reasonable defaults, except that at
/// least one root and an output directory must come from somewhere (file or
/// CLI).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub watch: WatchSection,

    #[serde(default)]
    pub tool: ToolSection,

    #[serde(default)]
    pub state: StateSection,
}

/// Validated configuration, constructed once at startup and passed by
/// reference to the engine.
///
/// Obtain one through [`ConfigFile::try_from`] (see `validate.rs`) or the
/// loader functions.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub watch: WatchSection,
    pub tool: ToolSection,
    pub state: StateSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(watch: WatchSection, tool: ToolSection, state: StateSection) -> Self {
        Self { watch, tool, state }
    }

    pub fn stability_wait(&self) -> Duration {
        Duration::from_secs(self.watch.stability_wait_secs)
    }

    pub fn set_paths(&self) -> SetPaths {
        SetPaths {
            ignored: self.state.ignored.clone(),
            in_flight: self.state.in_flight.clone(),
            done: self.state.done.clone(),
        }
    }
}

/// `[watch]` section: where recordings live and how they are recognised.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchSection {
    /// Directories scanned recursively, in order.
    #[serde(default)]
    pub roots: Vec<PathBuf>,

    /// Filename glob for recordings.
    #[serde(default = "default_pattern")]
    pub pattern: String,

    /// Seconds between the two size samples of the stability check.
    #[serde(default = "default_stability_wait_secs")]
    pub stability_wait_secs: u64,

    /// `"path"` (default) or `"file_name"`.
    #[serde(default)]
    pub identity: IdentityMode,
}

fn default_pattern() -> String {
    "*.ts".to_string()
}

fn default_stability_wait_secs() -> u64 {
    5
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            pattern: default_pattern(),
            stability_wait_secs: default_stability_wait_secs(),
            identity: IdentityMode::default(),
        }
    }
}

/// `[tool]` section: the advert-detection executable.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolSection {
    /// Executable; looked up on `PATH` when not a path.
    #[serde(default = "default_tool_path")]
    pub path: PathBuf,

    /// Fixed arguments placed before `--output=<dir>` and the recording.
    #[serde(default = "default_tool_args")]
    pub args: Vec<String>,

    /// Destination for the tool's outputs (`--output=<dir>`).
    #[serde(default)]
    pub output_dir: PathBuf,

    /// Stdout text that turns a non-zero exit into a benign no-op.
    #[serde(default = "default_benign_marker")]
    pub benign_marker: String,

    /// Side files `<stem>.<ext>` deleted from `output_dir` after success.
    #[serde(default = "default_side_file_extensions")]
    pub side_file_extensions: Vec<String>,

    #[serde(default = "default_true")]
    pub delete_side_files: bool,
}

fn default_tool_path() -> PathBuf {
    PathBuf::from("comskip")
}

fn default_tool_args() -> Vec<String> {
    ["--ts", "--quiet", "--vdpau", "--ini=comskip.ini"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn default_benign_marker() -> String {
    "Commercials were not found".to_string()
}

fn default_side_file_extensions() -> Vec<String> {
    ["txt", "edl", "log"].into_iter().map(str::to_string).collect()
}

fn default_true() -> bool {
    true
}

impl Default for ToolSection {
    fn default() -> Self {
        Self {
            path: default_tool_path(),
            args: default_tool_args(),
            output_dir: PathBuf::new(),
            benign_marker: default_benign_marker(),
            side_file_extensions: default_side_file_extensions(),
            delete_side_files: true,
        }
    }
}

/// `[state]` section: the persisted sets, lock token and error log.
///
/// Relative file names are resolved under `dir`; a relative `dir` is resolved
/// against the config file's directory (see [`RawConfigFile::resolve_paths`]).
#[derive(Debug, Clone, Deserialize)]
pub struct StateSection {
    #[serde(default = "default_state_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_ignored")]
    pub ignored: PathBuf,

    #[serde(default = "default_in_flight")]
    pub in_flight: PathBuf,

    #[serde(default = "default_done")]
    pub done: PathBuf,

    #[serde(default = "default_lock")]
    pub lock: PathBuf,

    #[serde(default = "default_error_log")]
    pub error_log: PathBuf,

    /// Clear `InFlight` entries when the lock is taken over from a dead run.
    #[serde(default)]
    pub reclaim_stale_in_flight: bool,
}

fn default_state_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_ignored() -> PathBuf {
    PathBuf::from("ignore_list.txt")
}

fn default_in_flight() -> PathBuf {
    PathBuf::from("processing.txt")
}

fn default_done() -> PathBuf {
    PathBuf::from("processed.txt")
}

fn default_lock() -> PathBuf {
    PathBuf::from("adwatch.lock")
}

fn default_error_log() -> PathBuf {
    PathBuf::from("adwatch.log")
}

impl Default for StateSection {
    fn default() -> Self {
        Self {
            dir: default_state_dir(),
            ignored: default_ignored(),
            in_flight: default_in_flight(),
            done: default_done(),
            lock: default_lock(),
            error_log: default_error_log(),
            reclaim_stale_in_flight: false,
        }
    }
}

impl RawConfigFile {
    /// Anchor the state files.
    ///
    /// `state.dir` is joined onto `base` when relative, and every relative
    /// state file name is joined onto `state.dir`.
    pub fn resolve_paths(&mut self, base: &Path) {
        let state = &mut self.state;
        if state.dir.is_relative() {
            state.dir = base.join(&state.dir);
        }
        let dir = state.dir.clone();
        for file in [
            &mut state.ignored,
            &mut state.in_flight,
            &mut state.done,
            &mut state.lock,
            &mut state.error_log,
        ] {
            if file.is_relative() {
                *file = dir.join(&*file);
            }
        }
    }
}
