use crate::models::{credentials::CredentialArgs, target::BackupTarget};
use anyhow::{Context, Result, bail};
use clap::{CommandFactory, Parser, ValueEnum, error::ErrorKind};
use std::{env, fmt, path::PathBuf, time::Duration};

/// Action requested on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Action {
    Backup,
    Restore,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Backup => f.write_str("backup"),
            Action::Restore => f.write_str("restore"),
        }
    }
}

/// Executables for the external tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolConfig {
    pub pg_dump: String,
    pub pg_restore: String,
    pub gsutil: String,
}

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub action: Action,
    pub bucket: String,
    pub target: BackupTarget,
    pub credentials: CredentialArgs,
    pub assume_yes: bool,
    pub verbose: bool,
    pub tools: ToolConfig,
    pub scratch_dir: PathBuf,
    pub timeout: Option<Duration>,
    pub compression: u8,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Automatically backup and restore your PostgreSQL database to a GCS bucket"
)]
pub struct Args {
    /// Action to take
    pub action: Action,

    /// Database name to backup/restore from
    pub db_name: String,

    /// GCS bucket name to backup/restore from
    pub bucket: String,

    /// Database host (overrides DB_HOST)
    #[arg(short = 'H', long)]
    pub db_host: Option<String>,

    /// Database username (overrides DB_USERNAME)
    #[arg(short = 'U', long)]
    pub db_username: Option<String>,

    /// Database password (overrides DB_PASSWORD)
    #[arg(short = 'P', long)]
    pub db_password: Option<String>,

    /// Store backups in this directory inside the bucket (overrides
    /// PG_GCS_BACKUP_DIRECTORY; default is the bucket root)
    #[arg(short = 'D', long)]
    pub directory: Option<String>,

    /// Assume yes on all prompts
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Verbose logging (default is to log errors only)
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// pg_dump executable (overrides PG_DUMP_BIN)
    #[arg(long)]
    pub pg_dump_bin: Option<String>,

    /// pg_restore executable (overrides PG_RESTORE_BIN)
    #[arg(long)]
    pub pg_restore_bin: Option<String>,

    /// gsutil executable (overrides GSUTIL_BIN)
    #[arg(long)]
    pub gsutil_bin: Option<String>,

    /// Directory for transient dump files (default is the system temp dir)
    #[arg(long)]
    pub scratch_dir: Option<PathBuf>,

    /// Kill any external tool running longer than this (overrides
    /// PG_GCS_BACKUP_TIMEOUT_SECS; default is no limit)
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// pg_dump compression level
    #[arg(long, default_value_t = 9, value_parser = clap::value_parser!(u8).range(0..=9))]
    pub compress: u8,
}

impl AppConfig {
    /// Parse CLI args and environment into AppConfig.
    ///
    /// Invalid combinations are reported the way clap reports usage errors
    /// and the process exits before anything runs.
    pub fn from_env_and_args() -> Self {
        let args = Args::parse();

        match Self::merge(args, |key| env::var(key).ok()) {
            Ok(cfg) => cfg,
            Err(err) => Args::command()
                .error(ErrorKind::ArgumentConflict, format!("{err:#}"))
                .exit(),
        }
    }

    /// Merge parsed arguments with environment fallbacks read through `lookup`.
    pub fn merge(args: Args, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let credentials = CredentialArgs {
            host: args.db_host.or_else(|| lookup("DB_HOST")),
            username: args.db_username.or_else(|| lookup("DB_USERNAME")),
            password: args.db_password.or_else(|| lookup("DB_PASSWORD")),
        };
        if !credentials.is_consistent() {
            bail!(
                "invalid database arguments, either all of db host, username and password must be specified or none"
            );
        }

        let timeout_secs = match args.timeout_secs {
            Some(secs) => Some(secs),
            None => match lookup("PG_GCS_BACKUP_TIMEOUT_SECS") {
                Some(value) => Some(value.parse::<u64>().with_context(|| {
                    format!("parsing PG_GCS_BACKUP_TIMEOUT_SECS value `{}`", value)
                })?),
                None => None,
            },
        };

        let directory = args
            .directory
            .or_else(|| lookup("PG_GCS_BACKUP_DIRECTORY"));

        Ok(Self {
            action: args.action,
            bucket: args.bucket,
            target: BackupTarget::new(args.db_name, directory),
            credentials,
            assume_yes: args.yes,
            verbose: args.verbose,
            tools: ToolConfig {
                pg_dump: args
                    .pg_dump_bin
                    .or_else(|| lookup("PG_DUMP_BIN"))
                    .unwrap_or_else(|| "pg_dump".into()),
                pg_restore: args
                    .pg_restore_bin
                    .or_else(|| lookup("PG_RESTORE_BIN"))
                    .unwrap_or_else(|| "pg_restore".into()),
                gsutil: args
                    .gsutil_bin
                    .or_else(|| lookup("GSUTIL_BIN"))
                    .unwrap_or_else(|| "gsutil".into()),
            },
            scratch_dir: args.scratch_dir.unwrap_or_else(env::temp_dir),
            timeout: timeout_secs.filter(|&s| s > 0).map(Duration::from_secs),
            compression: args.compress,
        })
    }
}
