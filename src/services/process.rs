//! Running the external tools (`pg_dump`, `pg_restore`, `gsutil`).
//!
//! Gateways describe a call as an [`Invocation`] and hand it to a
//! [`ProcessRunner`]. The real runner spawns the program with `tokio::process`
//! and waits for it; tests swap in a runner that simulates the tools.

use crate::errors::{BackupError, BackupResult};
use std::{fmt, process::Stdio, sync::Arc, time::Duration};
use tokio::process::Command;
use tracing::{debug, error};

const REDACTED: &str = "****";

/// One external program call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    secrets: Vec<String>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            secrets: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Mask each of `secrets` wherever it appears when this call is displayed.
    pub fn redact<I, S>(mut self, secrets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for secret in secrets {
            let secret = secret.as_ref();
            if !secret.is_empty() && !self.secrets.iter().any(|s| s == secret) {
                self.secrets.push(secret.to_string());
            }
        }
        // longest first, so a secret that contains another is masked whole
        self.secrets.sort_by_key(|s| std::cmp::Reverse(s.len()));
        self
    }

    fn masked(&self, text: &str) -> String {
        self.secrets
            .iter()
            .fold(text.to_string(), |acc, secret| acc.replace(secret.as_str(), REDACTED))
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", self.masked(arg))?;
        }
        Ok(())
    }
}

/// Exit status and captured output of a finished process.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Executes an [`Invocation`] to completion.
pub trait ProcessRunner {
    async fn run(&self, invocation: &Invocation) -> BackupResult<ProcessOutput>;
}

impl<R: ProcessRunner> ProcessRunner for Arc<R> {
    async fn run(&self, invocation: &Invocation) -> BackupResult<ProcessOutput> {
        (**self).run(invocation).await
    }
}

/// Spawns real child processes, optionally bounded by a timeout.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioProcessRunner {
    timeout: Option<Duration>,
}

impl TokioProcessRunner {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, invocation: &Invocation) -> BackupResult<ProcessOutput> {
        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // reaps the child when the timeout drops the output future
            .kill_on_drop(true);
        let output = command.output();

        let output = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, output).await.map_err(|_| {
                BackupError::ProcessTimeout {
                    program: invocation.program.clone(),
                    timeout,
                }
            })?,
            None => output.await,
        }
        .map_err(|source| BackupError::Spawn {
            program: invocation.program.clone(),
            source,
        })?;

        Ok(ProcessOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Run `invocation` and turn a non-zero exit into [`BackupError::ExternalProcess`].
///
/// Failures are logged with the (redacted) command line and both output
/// streams so they can be triaged without re-running in verbose mode.
pub async fn run_checked<R: ProcessRunner>(
    runner: &R,
    invocation: &Invocation,
) -> BackupResult<ProcessOutput> {
    debug!(command = %invocation, "running external process");
    let output = runner.run(invocation).await?;

    if output.success() {
        return Ok(output);
    }

    let stdout = invocation.masked(&output.stdout);
    let stderr = invocation.masked(&output.stderr);
    error!(
        code = ?output.code,
        command = %invocation,
        stdout = %stdout,
        stderr = %stderr,
        "external process failed"
    );

    Err(BackupError::ExternalProcess {
        program: invocation.program.clone(),
        code: output.code,
        stdout,
        stderr,
    })
}
