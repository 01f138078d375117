//! src/services/backup_service.rs
//!
//! BackupService — the pointer protocol tying the gateways together.
//!
//! A backup dumps the database, uploads the archive under a fresh
//! timestamped name and only then overwrites the lineage's `latest.txt`
//! with that name. A restore reads `latest.txt`, downloads the archive it
//! names and applies it. The pointer therefore only ever names an archive
//! that finished uploading; a crash between the two writes leaves an
//! orphaned archive and a pointer to the previous good one.

use crate::{
    errors::{BackupError, BackupResult},
    models::{
        artifact::ArtifactName,
        credentials::{CredentialArgs, Credentials},
        target::BackupTarget,
    },
    services::{
        confirm::Confirm,
        database_service::DatabaseGateway,
        naming::validate_object_name,
        scratch::Scratch,
        storage_service::{StorageGateway, ensure_object_name},
    },
};
use chrono::{DateTime, Utc};
use tracing::{Instrument, Span, info, warn};

/// Local name of the archive inside a run's scratch directory.
const LOCAL_DUMP_FILE: &str = "dump.pgdump";

/// Result of a restore run that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// The archive named by the pointer was applied.
    Restored(ArtifactName),
    /// The operator declined; nothing was touched.
    Aborted,
}

pub struct BackupService<S, D> {
    storage: S,
    database: D,
    scratch: Scratch,
    clock: fn() -> DateTime<Utc>,
    /// Diagnostics handle every run is recorded under.
    span: Span,
}

impl<S: StorageGateway, D: DatabaseGateway> BackupService<S, D> {
    pub fn new(storage: S, database: D, scratch: Scratch) -> Self {
        Self {
            storage,
            database,
            scratch,
            clock: Utc::now,
            span: Span::none(),
        }
    }

    /// Source of the timestamp embedded in artifact names.
    #[cfg(test)]
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Dump `target`, upload it and publish it as the latest backup.
    pub async fn backup(
        &self,
        bucket: &str,
        target: &BackupTarget,
        credentials: &CredentialArgs,
    ) -> BackupResult<ArtifactName> {
        self.run_backup(bucket, target, credentials)
            .instrument(self.span.clone())
            .await
    }

    async fn run_backup(
        &self,
        bucket: &str,
        target: &BackupTarget,
        credentials: &CredentialArgs,
    ) -> BackupResult<ArtifactName> {
        let artifact = ArtifactName::generate(&target.database, (self.clock)());
        let artifact_path = target.object_path(artifact.as_str());
        let pointer_path = target.pointer_path();

        // Reject bad input before spending time on a dump.
        Credentials::resolve(credentials)?;
        ensure_object_name(&artifact_path)?;
        ensure_object_name(&pointer_path)?;

        let scratch = self.scratch.dir()?;
        let dump_path = scratch.path().join(LOCAL_DUMP_FILE);

        info!(database = %target.database, "generating dump file");
        self.database
            .create_dump(target, credentials, &dump_path)
            .await
            .map_err(|err| err.during("unable to dump database"))?;

        info!(object = %artifact_path, "uploading dump file");
        self.storage
            .upload(&dump_path, bucket, &artifact_path)
            .await
            .map_err(|err| err.during("unable to upload dump to bucket"))?;

        info!(pointer = %pointer_path, artifact = %artifact, "updating latest pointer");
        self.storage
            .write_content(bucket, &pointer_path, artifact.as_str().as_bytes())
            .await
            .map_err(|err| err.during("unable to update latest pointer"))?;

        Ok(artifact)
    }

    /// Restore `target` from the archive its pointer names.
    ///
    /// `confirm` is asked first since the restore drops existing objects;
    /// declining returns [`RestoreOutcome::Aborted`] without side effects.
    pub async fn restore(
        &self,
        bucket: &str,
        target: &BackupTarget,
        credentials: &CredentialArgs,
        confirm: &mut dyn Confirm,
    ) -> BackupResult<RestoreOutcome> {
        self.run_restore(bucket, target, credentials, confirm)
            .instrument(self.span.clone())
            .await
    }

    async fn run_restore(
        &self,
        bucket: &str,
        target: &BackupTarget,
        credentials: &CredentialArgs,
        confirm: &mut dyn Confirm,
    ) -> BackupResult<RestoreOutcome> {
        Credentials::resolve(credentials)?;

        let prompt = format!(
            "THIS WILL DROP THE DATABASE NAMED '{}' BEFORE RESTORING\n\
             Are you sure? (type 'yes' to continue): ",
            target.database
        );
        if !confirm.confirm(&prompt)? {
            warn!(database = %target.database, "restore not confirmed, aborting");
            return Ok(RestoreOutcome::Aborted);
        }

        let pointer_path = target.pointer_path();
        info!(pointer = %pointer_path, "fetching latest dump filename");
        let content = self
            .storage
            .read_content(bucket, &pointer_path)
            .await
            .map_err(|err| BackupError::PointerResolution {
                path: pointer_path.clone(),
                reason: err.to_string(),
            })?;
        let artifact = resolve_pointer(&pointer_path, &content)?;
        info!(artifact = %artifact, "latest dump resolved");

        let artifact_path = target.object_path(artifact.as_str());
        let scratch = self.scratch.dir()?;
        let dump_path = scratch.path().join(LOCAL_DUMP_FILE);

        info!(object = %artifact_path, "fetching latest dump");
        self.storage
            .download(bucket, &artifact_path, &dump_path)
            .await
            .map_err(|err| err.during("unable to fetch latest dump"))?;

        info!(database = %target.database, "restoring dump file");
        self.database
            .restore_dump(target, credentials, &dump_path)
            .await
            .map_err(|err| err.during("unable to restore dump"))?;

        Ok(RestoreOutcome::Restored(artifact))
    }
}

/// Decode pointer content into the artifact name it records.
///
/// Surrounding whitespace is ignored so a hand-edited pointer with a
/// trailing newline still resolves.
pub fn resolve_pointer(path: &str, content: &[u8]) -> BackupResult<ArtifactName> {
    let failure = |reason: String| BackupError::PointerResolution {
        path: path.to_string(),
        reason,
    };

    let name = std::str::from_utf8(content)
        .map_err(|err| failure(format!("content is not UTF-8: {}", err)))?
        .trim();

    validate_object_name(name).map_err(|violation| {
        failure(format!("content is not a valid object name: {}", violation))
    })?;

    Ok(ArtifactName::from_pointer(name))
}
