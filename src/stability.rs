// src/stability.rs

//! Detects recordings that are still being written.
//!
//! Samples the file size twice, `wait` apart. Growth means the recorder (or a
//! post-processing step) is still busy with it. A recording paused for longer
//! than `wait` looks finished; that is an accepted limitation.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info};

use crate::fs::FileSystem;

#[derive(Debug, Clone, Copy)]
pub struct StabilityDetector {
    wait: Duration,
}

impl StabilityDetector {
    pub fn new(wait: Duration) -> Self {
        Self { wait }
    }

    /// True iff the file grew during the wait.
    ///
    /// Fails only when the first sample cannot be taken (the file is already
    /// gone). A file that shrinks or disappears during the wait is reported
    /// as not growing; whatever happens to it next is the caller's business.
    pub async fn is_still_writing(&self, fs: &dyn FileSystem, path: &Path) -> Result<bool> {
        let first = fs.file_size(path)?;
        debug!(file = %path.display(), size = first, "first size sample");

        if !self.wait.is_zero() {
            tokio::time::sleep(self.wait).await;
        }

        let second = match fs.file_size(path) {
            Ok(size) => size,
            Err(e) => {
                debug!(file = %path.display(), error = %e, "file vanished during size check");
                return Ok(false);
            }
        };
        debug!(file = %path.display(), size = second, "second size sample");

        let growing = second > first;
        if growing {
            info!(
                file = %path.display(),
                first,
                second,
                "still recording; skipping for now"
            );
        }
        Ok(growing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    #[tokio::test]
    async fn unchanged_size_is_stable() {
        let fs = MockFileSystem::new();
        fs.add_sized_file("/rec/show.ts", 120_000);

        let detector = StabilityDetector::new(Duration::from_millis(10));
        assert!(!detector.is_still_writing(&fs, Path::new("/rec/show.ts")).await.unwrap());
    }

    #[tokio::test]
    async fn growth_during_wait_is_detected() {
        let fs = MockFileSystem::new();
        fs.add_sized_file("/rec/movie.ts", 120_000);

        let writer = fs.clone();
        let grow = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            writer.grow("/rec/movie.ts", 5_000);
        });

        let detector = StabilityDetector::new(Duration::from_millis(200));
        assert!(detector.is_still_writing(&fs, Path::new("/rec/movie.ts")).await.unwrap());
        grow.await.unwrap();
    }

    #[tokio::test]
    async fn shrinking_file_is_not_writing() {
        let fs = MockFileSystem::new();
        fs.add_sized_file("/rec/recut.ts", 120_000);

        let writer = fs.clone();
        let shrink = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            writer.add_sized_file("/rec/recut.ts", 80_000);
        });

        let detector = StabilityDetector::new(Duration::from_millis(200));
        assert!(!detector.is_still_writing(&fs, Path::new("/rec/recut.ts")).await.unwrap());
        shrink.await.unwrap();
        assert_eq!(fs.file_size(Path::new("/rec/recut.ts")).unwrap(), 80_000);
    }

    #[tokio::test]
    async fn vanishing_file_is_not_writing() {
        let fs = MockFileSystem::new();
        fs.add_sized_file("/rec/cut.ts", 120_000);

        let writer = fs.clone();
        let vanish = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            writer.remove("/rec/cut.ts");
        });

        let detector = StabilityDetector::new(Duration::from_millis(200));
        assert!(!detector.is_still_writing(&fs, Path::new("/rec/cut.ts")).await.unwrap());
        vanish.await.unwrap();
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let fs = MockFileSystem::new();
        let detector = StabilityDetector::new(Duration::ZERO);
        assert!(detector.is_still_writing(&fs, Path::new("/rec/none.ts")).await.is_err());
    }
}
