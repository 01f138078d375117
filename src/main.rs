use anyhow::{Context, Result};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod config;
mod errors;
mod models;
mod services;

use config::{Action, AppConfig};
use errors::BackupError;
use services::{
    backup_service::{BackupService, RestoreOutcome},
    confirm::{AssumeYes, Confirm, LinePrompt},
    database_service::PgDatabase,
    process::TokioProcessRunner,
    scratch::Scratch,
    storage_service::GsutilStorage,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // --- Parse config (usage errors exit here) ---
    let cfg = AppConfig::from_env_and_args();

    // --- Logging setup, scoped to this run ---
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(log_filter(cfg.verbose))
        .with_writer(std::io::stderr)
        .finish();
    let _logging = tracing::subscriber::set_default(subscriber);

    let Err(error) = run(cfg).await else {
        return ExitCode::SUCCESS;
    };

    let message = format!("{error:#}");
    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(error = %message, "run failed");
    } else {
        eprintln!("Error: {message}");
    }

    ExitCode::from(exit_status(&Err(error)))
}

/// 0 on success or abort, 2 for bad input, 1 for everything else.
fn exit_status(result: &Result<()>) -> u8 {
    let Err(error) = result else {
        return 0;
    };

    // bad input is a usage error, like the ones clap reports
    let invalid_input = error
        .downcast_ref::<BackupError>()
        .is_some_and(BackupError::is_validation);
    if invalid_input { 2 } else { 1 }
}

/// `RUST_LOG` wins; otherwise errors only, or everything with `--verbose`.
fn log_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("error")
        }
    })
}

async fn run(cfg: AppConfig) -> Result<()> {
    let run_id = Uuid::new_v4();
    let span = tracing::info_span!(
        "run",
        %run_id,
        action = %cfg.action,
        database = %cfg.target.database,
        bucket = %cfg.bucket
    );
    tracing::debug!(parent: &span, "Starting with config: {:?}", cfg);

    // --- Wire gateways ---
    let runner = TokioProcessRunner::new(cfg.timeout);
    let scratch = Scratch::new(cfg.scratch_dir.clone());
    let storage = GsutilStorage::new(runner, scratch.clone()).with_program(&cfg.tools.gsutil);
    let database = PgDatabase::new(runner)
        .with_programs(&cfg.tools.pg_dump, &cfg.tools.pg_restore)
        .with_compression(cfg.compression);
    let service = BackupService::new(storage, database, scratch).with_span(span.clone());

    match cfg.action {
        Action::Backup => {
            let artifact = service
                .backup(&cfg.bucket, &cfg.target, &cfg.credentials)
                .await
                .context("backup failed")?;
            tracing::info!(parent: &span, %artifact, "backup complete");
        }
        Action::Restore => {
            let mut confirm: Box<dyn Confirm> = if cfg.assume_yes {
                Box::new(AssumeYes)
            } else {
                Box::new(LinePrompt::stdio())
            };

            let outcome = service
                .restore(&cfg.bucket, &cfg.target, &cfg.credentials, confirm.as_mut())
                .await
                .context("restore failed")?;

            match outcome {
                RestoreOutcome::Restored(artifact) => {
                    tracing::info!(parent: &span, %artifact, "restore complete");
                }
                RestoreOutcome::Aborted => eprintln!("Invalid response, aborting"),
            }
        }
    }

    Ok(())
}
