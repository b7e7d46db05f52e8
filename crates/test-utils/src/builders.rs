#![allow(dead_code)]

use std::path::{Path, PathBuf};

use adwatch::config::{ConfigFile, RawConfigFile};
use adwatch::types::IdentityMode;

/// Builder for `ConfigFile` to simplify test setup.
///
/// Defaults suit a `MockFileSystem`: recordings under `/rec`, tool outputs in
/// `/videos`, state files in `/state`, and no stability wait.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        let mut config = RawConfigFile::default();
        config.watch.roots = vec![PathBuf::from("/rec")];
        config.watch.stability_wait_secs = 0;
        config.tool.output_dir = PathBuf::from("/videos");
        config.state.dir = PathBuf::from("/state");
        Self { config }
    }

    /// Replace the default root on first call; append on later calls.
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        if self.config.watch.roots == [PathBuf::from("/rec")] {
            self.config.watch.roots.clear();
        }
        self.config.watch.roots.push(root.into());
        self
    }

    pub fn pattern(mut self, pattern: &str) -> Self {
        self.config.watch.pattern = pattern.to_string();
        self
    }

    pub fn identity(mut self, mode: IdentityMode) -> Self {
        self.config.watch.identity = mode;
        self
    }

    pub fn stability_wait_secs(mut self, secs: u64) -> Self {
        self.config.watch.stability_wait_secs = secs;
        self
    }

    pub fn tool(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.tool.path = path.into();
        self
    }

    pub fn tool_args(mut self, args: &[&str]) -> Self {
        self.config.tool.args = args.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.tool.output_dir = dir.into();
        self
    }

    pub fn benign_marker(mut self, marker: &str) -> Self {
        self.config.tool.benign_marker = marker.to_string();
        self
    }

    pub fn delete_side_files(mut self, val: bool) -> Self {
        self.config.tool.delete_side_files = val;
        self
    }

    pub fn state_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.state.dir = dir.into();
        self
    }

    pub fn reclaim_stale_in_flight(mut self, val: bool) -> Self {
        self.config.state.reclaim_stale_in_flight = val;
        self
    }

    pub fn build(mut self) -> ConfigFile {
        self.config.resolve_paths(Path::new("/"));
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
