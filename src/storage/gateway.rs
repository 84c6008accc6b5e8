//! File operation gateway
//!
//! The one entry point for every file operation. Holds the storage root,
//! the size limit and an observer handle; nothing else survives a request.
//! The operations themselves live in [`crate::storage::operations`].

use log::warn;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::config::StorageConfig;
use crate::error::GatewayError;
use crate::storage::observer::{LogObserver, OperationEvent, OperationKind, OperationObserver};
use crate::storage::results::Measured;
use crate::storage::validation::{self, StorageRoot, ValidatedPath};

/// Default maximum file size: 50 MiB
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Subdirectory of the root that receives uploads
pub const UPLOADS_DIR: &str = "uploads";

/// Extensions accepted by upload, compared case-insensitively
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    ".py", ".js", ".ts", ".json", ".md", ".txt", ".yaml", ".html", ".css",
];

#[derive(Clone)]
pub struct FileGateway {
    root: Arc<StorageRoot>,
    max_file_size: u64,
    observer: Arc<dyn OperationObserver>,
}

impl FileGateway {
    /// Gateway over `root`, logging every operation
    pub fn new(root: StorageRoot, max_file_size: u64) -> Self {
        Self {
            root: Arc::new(root),
            max_file_size,
            observer: Arc::new(LogObserver),
        }
    }

    /// Open (and create if needed) the configured root
    pub fn from_config(config: &StorageConfig) -> io::Result<Self> {
        let root = StorageRoot::open(config.storage_root_path())?;
        Ok(Self::new(root, config.max_file_size_bytes()))
    }

    /// Replace the observer that receives operation events
    pub fn with_observer(mut self, observer: Arc<dyn OperationObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn root(&self) -> &StorageRoot {
        &self.root
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// True if `candidate` passes path validation
    pub fn validate(&self, candidate: &str) -> bool {
        validation::validate(&self.root, candidate)
    }

    /// Validate `candidate` and make sure existing symlinks along it do not
    /// lead outside the root.
    pub(crate) fn resolve(&self, candidate: &str) -> Result<ValidatedPath, GatewayError> {
        let path = validation::resolve(&self.root, candidate)?;
        self.confine(path.absolute(), candidate)?;
        Ok(path)
    }

    /// Canonicalize the deepest existing ancestor of `target` (itself
    /// included) and require it to stay under the root.
    pub(crate) fn confine(&self, target: &Path, candidate: &str) -> Result<(), GatewayError> {
        for ancestor in target.ancestors() {
            match fs::canonicalize(ancestor) {
                Ok(canonical) => {
                    if canonical.starts_with(self.root.path()) {
                        return Ok(());
                    }
                    warn!(
                        "Path {:?} resolves outside the storage root via {}",
                        candidate,
                        canonical.display()
                    );
                    return Err(GatewayError::Forbidden(candidate.to_string()));
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(GatewayError::io(candidate, e)),
            }
        }
        Err(GatewayError::Forbidden(candidate.to_string()))
    }

    pub(crate) fn check_size(&self, size: u64) -> Result<(), GatewayError> {
        if size > self.max_file_size {
            return Err(GatewayError::TooLarge {
                size,
                limit: self.max_file_size,
            });
        }
        Ok(())
    }

    /// Run `operation`, timing it and reporting the outcome to the observer
    pub(crate) fn observed<T: Measured>(
        &self,
        kind: OperationKind,
        path: &str,
        operation: impl FnOnce() -> Result<T, GatewayError>,
    ) -> Result<T, GatewayError> {
        let started = Instant::now();
        let result = operation();
        let outcome = match &result {
            Ok(value) => Ok(value.size_bytes()),
            Err(e) => Err(e.kind()),
        };
        let event = OperationEvent::new(kind, path, outcome, started.elapsed());
        self.observer.on_operation(&event);
        result
    }
}

impl std::fmt::Debug for FileGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileGateway")
            .field("root", &self.root.path())
            .field("max_file_size", &self.max_file_size)
            .finish()
    }
}

/// Lowercased extension with its leading dot, if `filename` has one
pub fn upload_extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_ascii_lowercase()))
}

/// True if `filename` carries an allow-listed extension
pub fn is_allowed_upload(filename: &str) -> bool {
    upload_extension(filename)
        .map(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}
