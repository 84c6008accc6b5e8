//! File system storage management
//!
//! Path validation, content hashing, metadata reporting and the file
//! operation gateway that composes them.

pub mod encoding;
pub mod filesystem;
pub mod gateway;
pub mod hasher;
pub mod metadata;
pub mod observer;
pub mod operations;
pub mod results;
pub mod validation;

// Re-export commonly used types
pub use encoding::TextEncoding;
pub use gateway::{ALLOWED_EXTENSIONS, DEFAULT_MAX_FILE_SIZE, FileGateway, UPLOADS_DIR};
pub use metadata::FileRecord;
pub use observer::{
    LogObserver, ObserverSet, OperationEvent, OperationKind, OperationObserver, OperationStats,
    StatsSnapshot,
};
pub use results::*;
pub use validation::{FORBIDDEN_PREFIXES, StorageRoot, ValidatedPath};
