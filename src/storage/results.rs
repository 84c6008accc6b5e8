//! Storage result types
//!
//! Defines result structures returned by gateway operations.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Byte size an operation moved or reported, fed to observers
pub trait Measured {
    fn size_bytes(&self) -> u64;
}

/// Result of a read
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadResult {
    pub content: String,
    /// Size of the file in bytes (not characters)
    pub size: u64,
}

/// Result of a write
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteResult {
    /// Resolved absolute path that was written
    pub path: String,
    pub size: u64,
}

/// Result of an upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadResult {
    pub filename: String,
    /// Stored location, relative to the storage root
    pub path: String,
    pub size: u64,
}

/// Result of a download; the bytes travel raw, not as JSON
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadResult {
    /// Suggested filename for the receiver
    pub filename: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

/// One immediate child of a listed directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirEntryInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Present for files only
    pub size: Option<u64>,
    pub modified: DateTime<Utc>,
}

/// Result of a directory listing, entries in discovery order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListResult {
    /// Listed directory relative to the storage root; empty for the root
    pub path: String,
    pub entries: Vec<DirEntryInfo>,
}

/// Result of a deletion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteResult {
    pub path: String,
    pub kind: EntryKind,
}

/// Aggregate numbers from a full scan of the storage root
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StorageStats {
    pub total_files: u64,
    pub total_size_bytes: u64,
    pub total_size_mb: f64,
    pub max_file_size_bytes: u64,
    pub max_file_size_mb: u64,
    pub storage_root: String,
}

impl Measured for ReadResult {
    fn size_bytes(&self) -> u64 {
        self.size
    }
}

impl Measured for WriteResult {
    fn size_bytes(&self) -> u64 {
        self.size
    }
}

impl Measured for UploadResult {
    fn size_bytes(&self) -> u64 {
        self.size
    }
}

impl Measured for DownloadResult {
    fn size_bytes(&self) -> u64 {
        self.data.len() as u64
    }
}

impl Measured for ListResult {
    fn size_bytes(&self) -> u64 {
        0
    }
}

impl Measured for DeleteResult {
    fn size_bytes(&self) -> u64 {
        0
    }
}

impl Measured for StorageStats {
    fn size_bytes(&self) -> u64 {
        0
    }
}
