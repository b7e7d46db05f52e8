// src/exec/backend.rs

//! Pluggable tool runner abstraction.
//!
//! - `CommandToolRunner` is the implementation used by `adwatch`. It runs the
//!   tool to completion with `tokio::process` and captures both streams.
//! - Tests provide their own `ToolRunner` that records which recordings were
//!   handed to the tool and returns canned outputs.

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::process::Command;
use tracing::{debug, info};

use super::command::{ToolInvocation, ToolOutput};

/// Trait abstracting how the external tool is run.
///
/// The future resolves once the tool has exited. `Err` means the tool could
/// not be run at all (e.g. the executable is missing); an unsuccessful exit
/// is still `Ok` and is judged by the outcome classifier.
pub trait ToolRunner: Send {
    fn run<'a>(
        &'a mut self,
        invocation: &'a ToolInvocation,
    ) -> Pin<Box<dyn Future<Output = Result<ToolOutput>> + Send + 'a>>;
}

/// Real tool runner used in production.
#[derive(Debug, Clone, Default)]
pub struct CommandToolRunner;

impl CommandToolRunner {
    pub fn new() -> Self {
        Self
    }
}

impl ToolRunner for CommandToolRunner {
    fn run<'a>(
        &'a mut self,
        invocation: &'a ToolInvocation,
    ) -> Pin<Box<dyn Future<Output = Result<ToolOutput>> + Send + 'a>> {
        Box::pin(async move {
            info!(cmd = %invocation, "starting tool process");

            let output = Command::new(&invocation.program)
                .args(&invocation.args)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .output()
                .await
                .with_context(|| format!("spawning {:?}", invocation.program))?;

            let exit_code = output.status.code();
            debug!(
                recording = %invocation.recording.display(),
                ?exit_code,
                stdout_bytes = output.stdout.len(),
                stderr_bytes = output.stderr.len(),
                "tool process exited"
            );

            Ok(ToolOutput {
                exit_code,
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            })
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::path::Path;

    fn sh(script: &str, recording: &str) -> ToolInvocation {
        // `sh -c <script> --output=<dir> <recording>` binds $0 and $1.
        ToolInvocation::new(
            Path::new("sh"),
            &["-c".to_string(), script.to_string()],
            Path::new("/tmp/out"),
            Path::new(recording),
        )
    }

    #[tokio::test]
    async fn captures_exit_code_and_streams() {
        let inv = sh(r#"echo "scanning $1"; echo oops >&2; exit 3"#, "/rec/show.ts");
        let out = CommandToolRunner::new().run(&inv).await.unwrap();

        assert_eq!(out.exit_code, Some(3));
        assert_eq!(out.stdout, "scanning /rec/show.ts\n");
        assert_eq!(out.stderr, "oops\n");
    }

    #[tokio::test]
    async fn missing_executable_is_an_error() {
        let inv = ToolInvocation::new(
            Path::new("/definitely/not/comskip"),
            &[],
            Path::new("/tmp/out"),
            Path::new("/rec/show.ts"),
        );
        assert!(CommandToolRunner::new().run(&inv).await.is_err());
    }
}
