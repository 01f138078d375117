//! Transient local files for dumps and pointer payloads.

use crate::errors::BackupResult;
use std::path::PathBuf;
use tempfile::TempDir;

const SCRATCH_PREFIX: &str = "pg-gcs-backup-";

/// Hands out private temporary directories beneath `root`.
///
/// Each transient file lives in its own [`TempDir`]; dropping the guard
/// removes the file together with any side files a tool left next to it
/// (`gsutil` writes `*.gstmp` partials beside download targets).
#[derive(Clone, Debug)]
pub struct Scratch {
    root: PathBuf,
}

impl Scratch {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create a fresh directory, removed when the returned guard drops.
    pub fn dir(&self) -> BackupResult<TempDir> {
        Ok(tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir_in(&self.root)?)
    }
}
