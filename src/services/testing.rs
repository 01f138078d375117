//! Test doubles shared by the service tests.

use crate::{
    errors::BackupResult,
    services::process::{Invocation, ProcessOutput, ProcessRunner},
};
use std::{collections::BTreeMap, fs, sync::Mutex};

/// Archive bytes written by the simulated `pg_dump`.
pub const FAKE_ARCHIVE: &[u8] = b"PGDMP fake custom archive";

/// Simulates `gsutil`, `pg_dump` and `pg_restore` against an in-memory
/// bucket, recording every invocation.
#[derive(Default)]
pub struct FakeTools {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
    calls: Mutex<Vec<Invocation>>,
    restored: Mutex<Vec<Vec<u8>>>,
    failures: Mutex<Vec<String>>,
}

impl FakeTools {
    pub fn put_object(&self, url: &str, content: &[u8]) {
        self.objects
            .lock()
            .unwrap()
            .insert(url.to_string(), content.to_vec());
    }

    pub fn object(&self, url: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(url).cloned()
    }

    pub fn object_names(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    pub fn programs(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.program).collect()
    }

    /// Archives handed to the simulated `pg_restore`.
    pub fn restored(&self) -> Vec<Vec<u8>> {
        self.restored.lock().unwrap().clone()
    }

    /// Make any call whose program or arguments contain `needle` exit 1.
    pub fn fail_matching(&self, needle: &str) {
        self.failures.lock().unwrap().push(needle.to_string());
    }

    fn should_fail(&self, invocation: &Invocation) -> bool {
        self.failures.lock().unwrap().iter().any(|needle| {
            invocation.program.contains(needle.as_str())
                || invocation.args.iter().any(|a| a.contains(needle.as_str()))
        })
    }

    fn gsutil(&self, args: &[String]) -> ProcessOutput {
        let [quiet, cp, src, dst] = args else {
            return failed("CommandException: unexpected arguments");
        };
        assert_eq!((quiet.as_str(), cp.as_str()), ("-q", "cp"));

        if src.starts_with("gs://") {
            match self.object(src) {
                Some(content) => match fs::write(dst, content) {
                    Ok(()) => ok(),
                    Err(err) => failed(&err.to_string()),
                },
                None => failed("CommandException: No URLs matched"),
            }
        } else {
            match fs::read(src) {
                Ok(content) => {
                    self.put_object(dst, &content);
                    ok()
                }
                Err(err) => failed(&err.to_string()),
            }
        }
    }

    fn pg_dump(&self, args: &[String]) -> ProcessOutput {
        let Some(file) = args
            .iter()
            .position(|a| a == "--file")
            .and_then(|i| args.get(i + 1))
        else {
            return failed("pg_dump: missing --file");
        };

        match fs::write(file, FAKE_ARCHIVE) {
            Ok(()) => ok(),
            Err(err) => failed(&err.to_string()),
        }
    }

    fn pg_restore(&self, args: &[String]) -> ProcessOutput {
        let Some(file) = args.last() else {
            return failed("pg_restore: missing input file");
        };

        match fs::read(file) {
            Ok(content) => {
                self.restored.lock().unwrap().push(content);
                ok()
            }
            Err(_) => failed(&format!(
                "pg_restore: error: could not open input file \"{file}\""
            )),
        }
    }
}

impl ProcessRunner for FakeTools {
    async fn run(&self, invocation: &Invocation) -> BackupResult<ProcessOutput> {
        self.calls.lock().unwrap().push(invocation.clone());

        if self.should_fail(invocation) {
            return Ok(failed("simulated failure"));
        }

        let output = match invocation.program.rsplit('/').next() {
            Some("gsutil") => self.gsutil(&invocation.args),
            Some("pg_dump") => self.pg_dump(&invocation.args),
            Some("pg_restore") => self.pg_restore(&invocation.args),
            _ => failed("command not found"),
        };
        Ok(output)
    }
}

fn ok() -> ProcessOutput {
    ProcessOutput {
        code: Some(0),
        ..Default::default()
    }
}

fn failed(stderr: &str) -> ProcessOutput {
    ProcessOutput {
        code: Some(1),
        stdout: String::new(),
        stderr: stderr.to_string(),
    }
}
