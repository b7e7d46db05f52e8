use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use adwatch::exec::{ToolInvocation, ToolOutput, ToolRunner};
use adwatch::fs::mock::MockFileSystem;
use adwatch::fs::FileSystem;

type Hook = Box<dyn FnMut(&ToolInvocation) + Send>;

enum Scripted {
    Output(ToolOutput),
    SpawnError(String),
}

/// A fake tool runner that:
/// - records every invocation it receives
/// - returns a scripted result per recording file name (exit 0 otherwise)
/// - optionally writes `<stem>.<ext>` side files into the `--output=` dir of
///   a `MockFileSystem`, like the real tool does
pub struct FakeToolRunner {
    invocations: Arc<Mutex<Vec<ToolInvocation>>>,
    scripted: HashMap<String, Scripted>,
    side_files: Option<(MockFileSystem, Vec<String>)>,
    hook: Option<Hook>,
}

impl FakeToolRunner {
    pub fn new() -> Self {
        Self {
            invocations: Arc::new(Mutex::new(Vec::new())),
            scripted: HashMap::new(),
            side_files: None,
            hook: None,
        }
    }

    /// Return `output` whenever a recording with this file name is run.
    pub fn respond(mut self, file_name: &str, output: ToolOutput) -> Self {
        self.scripted.insert(file_name.to_string(), Scripted::Output(output));
        self
    }

    /// Fail to start the tool for this file name.
    pub fn fail_to_spawn(mut self, file_name: &str, message: &str) -> Self {
        self.scripted
            .insert(file_name.to_string(), Scripted::SpawnError(message.to_string()));
        self
    }

    /// Write one side file per extension for every invocation that starts.
    pub fn writes_side_files(mut self, fs: &MockFileSystem, extensions: &[&str]) -> Self {
        let exts = extensions.iter().map(|e| e.to_string()).collect();
        self.side_files = Some((fs.clone(), exts));
        self
    }

    /// Called with each invocation before its result is produced.
    pub fn on_invoke(mut self, hook: impl FnMut(&ToolInvocation) + Send + 'static) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }

    pub fn invocations(&self) -> Vec<ToolInvocation> {
        self.invocations.lock().unwrap().clone()
    }

    /// Recordings handed to the tool, in order.
    pub fn invoked_recordings(&self) -> Vec<PathBuf> {
        self.invocations().into_iter().map(|inv| inv.recording).collect()
    }

    fn respond_to(&mut self, invocation: &ToolInvocation) -> Result<ToolOutput> {
        self.invocations.lock().unwrap().push(invocation.clone());
        if let Some(hook) = self.hook.as_mut() {
            hook(invocation);
        }

        let name = invocation
            .recording
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if let Some(Scripted::SpawnError(message)) = self.scripted.get(&name) {
            return Err(anyhow!("{message}"));
        }

        if let Some((fs, exts)) = &self.side_files {
            let output_dir = invocation
                .args
                .iter()
                .find_map(|a| a.to_str().and_then(|s| s.strip_prefix("--output=")))
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            let stem = invocation
                .recording
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            for ext in exts {
                let side = output_dir.join(format!("{stem}.{ext}"));
                if !fs.is_dir(&side) {
                    fs.add_file(&side, "side output\n");
                }
            }
        }

        match self.scripted.get(&name) {
            Some(Scripted::Output(output)) => Ok(output.clone()),
            _ => Ok(ToolOutput::success()),
        }
    }
}

impl Default for FakeToolRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRunner for FakeToolRunner {
    fn run<'a>(
        &'a mut self,
        invocation: &'a ToolInvocation,
    ) -> Pin<Box<dyn Future<Output = Result<ToolOutput>> + Send + 'a>> {
        let result = self.respond_to(invocation);
        Box::pin(async move { result })
    }
}
