//! Metadata reporting
//!
//! Builds a [`FileRecord`] from filesystem stat info and the content hash.
//! Records are computed fresh on every call and never cached.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{self, Metadata};
use std::path::Path;
use std::time::SystemTime;

use crate::error::GatewayError;
use crate::storage::hasher::hash_file;
use crate::storage::results::Measured;
use crate::storage::validation::ValidatedPath;

/// Uniform descriptor of a regular file under the storage root
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    /// Path relative to the storage root
    pub path: String,
    pub size: u64,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    /// SHA-256 of the content, 64 lowercase hex characters
    pub hash: String,
    /// Extension with its leading dot (`.txt`), empty when there is none
    #[serde(rename = "type")]
    pub file_type: String,
}

impl Measured for FileRecord {
    fn size_bytes(&self) -> u64 {
        self.size
    }
}

/// Describe the regular file at `path`.
///
/// Birth time is not reported on every platform/filesystem; when it is
/// missing the modification time stands in, so repeated calls on an
/// unmodified file stay identical.
pub fn describe(path: &ValidatedPath) -> Result<FileRecord, GatewayError> {
    let absolute = path.absolute();
    let metadata = fs::metadata(absolute).map_err(|e| not_found_or_io(path.raw(), e))?;

    if !metadata.is_file() {
        return Err(GatewayError::NotFound(path.raw().to_string()));
    }

    let hash = hash_file(absolute).map_err(|e| GatewayError::io(path.raw(), e))?;
    let modified = modified_time(&metadata);
    let created = metadata.created().map(to_utc).unwrap_or(modified);

    Ok(FileRecord {
        path: path.normalized().to_string(),
        size: metadata.len(),
        created,
        modified,
        hash,
        file_type: type_tag(absolute),
    })
}

/// Extension tag used in metadata (`.json`, `.txt`, or empty)
pub fn type_tag(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

/// Modification time, falling back to the epoch when unavailable
pub fn modified_time(metadata: &Metadata) -> DateTime<Utc> {
    metadata
        .modified()
        .map(to_utc)
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

fn to_utc(time: SystemTime) -> DateTime<Utc> {
    DateTime::<Utc>::from(time)
}

/// Map a stat error: a missing target is `NotFound`, anything else is I/O
pub(crate) fn not_found_or_io(raw: &str, error: std::io::Error) -> GatewayError {
    if error.kind() == std::io::ErrorKind::NotFound {
        GatewayError::NotFound(raw.to_string())
    } else {
        GatewayError::io(raw, error)
    }
}
