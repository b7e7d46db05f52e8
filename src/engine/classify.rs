// src/engine/classify.rs

//! Outcome classification for a finished tool run.

use crate::exec::ToolOutput;

/// What a tool run means for the recording's bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Exit status zero.
    Success,
    /// Non-zero exit, but stdout carries the benign marker: the tool ran fine
    /// and simply found no advert boundaries.
    BenignNoOp,
    /// Anything else. Carries the captured output for the error log.
    Failure {
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },
}

impl Outcome {
    /// Success and BenignNoOp both mark the recording done.
    pub fn is_success(&self) -> bool {
        !matches!(self, Outcome::Failure { .. })
    }
}

/// Classify a tool run.
///
/// A process killed by a signal has no exit code and is always a failure.
pub fn classify(output: ToolOutput, benign_marker: &str) -> Outcome {
    match output.exit_code {
        Some(0) => Outcome::Success,
        Some(_) if !benign_marker.is_empty() && output.stdout.contains(benign_marker) => {
            Outcome::BenignNoOp
        }
        exit_code => Outcome::Failure {
            exit_code,
            stdout: output.stdout,
            stderr: output.stderr,
        },
    }
}
