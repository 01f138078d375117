//! Identifies where the backups of one database live inside a bucket.

/// Name of the pointer object recording the latest successful dump.
pub const POINTER_NAME: &str = "latest.txt";

/// A backup lineage: one database, optionally rooted under a directory
/// prefix inside the bucket.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackupTarget {
    /// Database to dump from or restore into.
    pub database: String,

    /// Prefix inside the bucket, without a trailing `/`.
    pub directory: Option<String>,
}

impl BackupTarget {
    /// Build a target, normalising the directory prefix.
    ///
    /// Trailing slashes are stripped and an empty prefix means the bucket
    /// root, so `nightly/` and `nightly` resolve to the same objects.
    pub fn new(database: impl Into<String>, directory: Option<String>) -> Self {
        let directory = directory
            .map(|dir| dir.trim_end_matches('/').to_string())
            .filter(|dir| !dir.is_empty());

        Self {
            database: database.into(),
            directory,
        }
    }

    /// Full object path for `name`, prefixed by the directory if any.
    pub fn object_path(&self, name: &str) -> String {
        match &self.directory {
            Some(dir) => format!("{}/{}", dir, name),
            None => name.to_string(),
        }
    }

    /// Full object path of this lineage's pointer object.
    pub fn pointer_path(&self) -> String {
        self.object_path(POINTER_NAME)
    }
}
