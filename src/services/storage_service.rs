//! src/services/storage_service.rs
//!
//! Storage gateway: moves files and small payloads between local disk and a
//! GCS bucket by shelling out to `gsutil`. Every write is name-validated
//! before anything is spawned; transient files are scratch directories that
//! are removed on every exit path.

use crate::{
    errors::{BackupError, BackupResult},
    services::{
        naming::validate_object_name,
        process::{Invocation, ProcessRunner, run_checked},
        scratch::Scratch,
    },
};
use bytes::Bytes;
use std::path::Path;
use tokio::fs;
use tracing::debug;

const DEFAULT_GSUTIL: &str = "gsutil";
const CONTENT_FILE: &str = "content";

/// Object storage operations used by the backup orchestrator.
pub trait StorageGateway {
    /// Copy the local file at `local` to `object_name` in `bucket`.
    async fn upload(&self, local: &Path, bucket: &str, object_name: &str) -> BackupResult<()>;

    /// Store `content` as the whole body of `object_name`.
    async fn write_content(
        &self,
        bucket: &str,
        object_name: &str,
        content: &[u8],
    ) -> BackupResult<()>;

    /// Copy `object_name` from `bucket` to the local path `local`.
    async fn download(&self, bucket: &str, object_name: &str, local: &Path) -> BackupResult<()>;

    /// Fetch the whole body of `object_name`.
    async fn read_content(&self, bucket: &str, object_name: &str) -> BackupResult<Bytes>;
}

/// [`StorageGateway`] backed by the `gsutil` command-line tool.
#[derive(Clone, Debug)]
pub struct GsutilStorage<R> {
    runner: R,
    program: String,
    scratch: Scratch,
}

impl<R: ProcessRunner> GsutilStorage<R> {
    pub fn new(runner: R, scratch: Scratch) -> Self {
        Self {
            runner,
            program: DEFAULT_GSUTIL.to_string(),
            scratch,
        }
    }

    /// Use a different `gsutil` executable.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    fn copy(&self, src: &str, dst: &str) -> Invocation {
        Invocation::new(&self.program).args(["-q", "cp", src, dst])
    }
}

/// `gs://bucket/object` reference understood by `gsutil`.
pub fn remote_url(bucket: &str, object_name: &str) -> String {
    format!("gs://{}/{}", bucket, object_name)
}

/// Reject names that may not be written to the bucket.
pub fn ensure_object_name(name: &str) -> BackupResult<()> {
    validate_object_name(name).map_err(|violation| BackupError::InvalidObjectName {
        name: name.to_string(),
        reason: violation.to_string(),
    })
}

impl<R: ProcessRunner> StorageGateway for GsutilStorage<R> {
    async fn upload(&self, local: &Path, bucket: &str, object_name: &str) -> BackupResult<()> {
        ensure_object_name(object_name)?;

        let dst = remote_url(bucket, object_name);
        debug!(src = %local.display(), dst = %dst, "uploading to bucket");
        run_checked(&self.runner, &self.copy(&local.to_string_lossy(), &dst)).await?;
        Ok(())
    }

    async fn write_content(
        &self,
        bucket: &str,
        object_name: &str,
        content: &[u8],
    ) -> BackupResult<()> {
        ensure_object_name(object_name)?;

        let dir = self.scratch.dir()?;
        let local = dir.path().join(CONTENT_FILE);
        fs::write(&local, content).await?;

        self.upload(&local, bucket, object_name).await
    }

    async fn download(&self, bucket: &str, object_name: &str, local: &Path) -> BackupResult<()> {
        let src = remote_url(bucket, object_name);
        debug!(src = %src, dst = %local.display(), "downloading from bucket");
        run_checked(&self.runner, &self.copy(&src, &local.to_string_lossy())).await?;
        Ok(())
    }

    async fn read_content(&self, bucket: &str, object_name: &str) -> BackupResult<Bytes> {
        let dir = self.scratch.dir()?;
        let local = dir.path().join(CONTENT_FILE);

        self.download(bucket, object_name, &local).await?;
        let content = fs::read(&local).await?;

        Ok(Bytes::from(content))
    }
}
