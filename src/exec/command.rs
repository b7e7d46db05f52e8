// src/exec/command.rs

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

/// One fully-built invocation of the external tool.
///
/// Layout: `<program> <base args...> --output=<output_dir> <recording>`.
/// Paths are passed through as raw OS strings so non-UTF-8 names reach the
/// tool unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub recording: PathBuf,
}

impl ToolInvocation {
    pub fn new(program: &Path, base_args: &[String], output_dir: &Path, recording: &Path) -> Self {
        let mut args: Vec<OsString> = base_args.iter().map(OsString::from).collect();
        let mut output = OsString::from("--output=");
        output.push(output_dir);
        args.push(output);
        args.push(recording.as_os_str().to_os_string());
        Self {
            program: program.to_path_buf(),
            args,
            recording: recording.to_path_buf(),
        }
    }

    /// Human-readable command line for logs.
    pub fn command_line(&self) -> String {
        let mut parts = vec![quote(&self.program.to_string_lossy())];
        parts.extend(self.args.iter().map(|a| quote(&a.to_string_lossy())));
        parts.join(" ")
    }
}

impl fmt::Display for ToolInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

fn quote(arg: &str) -> String {
    if !arg.is_empty() && !arg.contains(char::is_whitespace) && !arg.contains('\'') {
        return arg.to_string();
    }
    format!("'{}'", arg.replace('\'', r"'\''"))
}

/// What the tool left behind once it exited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn exited(code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code: Some(code),
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    pub fn success() -> Self {
        Self::exited(0, "", "")
    }
}
