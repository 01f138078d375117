//! Error taxonomy shared by the gateways and the backup orchestrator.

use std::{io, time::Duration};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("invalid object name `{name}`: {reason}")]
    InvalidObjectName { name: String, reason: String },

    #[error(
        "invalid database arguments, db host, username and password must be specified together or not at all"
    )]
    PartialCredentials,

    #[error("invalid database connection: {0}")]
    InvalidConnection(String),

    #[error("`{program}` exited with {}: stdout = '{stdout}' stderr = '{stderr}'", exit_code_label(.code))]
    ExternalProcess {
        program: String,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("`{program}` did not finish within {timeout:?}")]
    ProcessTimeout { program: String, timeout: Duration },

    #[error("unable to resolve latest dump from `{path}`: {reason}")]
    PointerResolution { path: String, reason: String },

    #[error("{context}: {source}")]
    Step {
        context: &'static str,
        #[source]
        source: Box<BackupError>,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type BackupResult<T> = Result<T, BackupError>;

impl BackupError {
    /// Wrap an error with the orchestration step it came from.
    pub fn during(self, context: &'static str) -> Self {
        BackupError::Step {
            context,
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping step context.
    pub fn root(&self) -> &BackupError {
        match self {
            BackupError::Step { source, .. } => source.root(),
            other => other,
        }
    }

    /// True for errors detected before any external process was started.
    pub fn is_validation(&self) -> bool {
        matches!(
            self.root(),
            BackupError::InvalidObjectName { .. }
                | BackupError::PartialCredentials
                | BackupError::InvalidConnection(_)
        )
    }
}

fn exit_code_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {code}"),
        None => "no exit code (killed by signal)".to_string(),
    }
}
