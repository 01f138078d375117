//! Naming scheme for dump artifacts.

use chrono::{DateTime, Utc};
use std::fmt;

/// Extension of the tool-native (custom format) archive produced by `pg_dump`.
pub const DUMP_EXTENSION: &str = "pgdump";

const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Object name of one dump, e.g. `orders-20240102T030405Z.pgdump`.
///
/// This is the bare name recorded in the pointer object, never the full
/// path including a directory prefix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactName(String);

impl ArtifactName {
    /// Generate the artifact name for `database` at `now` (UTC, second precision).
    pub fn generate(database: &str, now: DateTime<Utc>) -> Self {
        Self(format!(
            "{}-{}.{}",
            database,
            now.format(TIMESTAMP_FORMAT),
            DUMP_EXTENSION
        ))
    }

    /// Wrap a name read back from a pointer object.
    pub fn from_pointer(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
