//! Storage operations
//!
//! Read, write, upload, download, list, metadata, delete and stats. Each
//! one validates the caller's path before any I/O, checks sizes as early as
//! they are known, and reports its outcome to the gateway's observer.

use log::{debug, info, warn};
use std::fs;
use std::path::{Component, Path};
use walkdir::WalkDir;

use crate::error::GatewayError;
use crate::storage::encoding::TextEncoding;
use crate::storage::filesystem::{self, BoundedRead};
use crate::storage::gateway::{FileGateway, UPLOADS_DIR, is_allowed_upload, upload_extension};
use crate::storage::metadata::{self, FileRecord, modified_time, not_found_or_io};
use crate::storage::observer::OperationKind;
use crate::storage::results::{
    DeleteResult, DirEntryInfo, DownloadResult, EntryKind, ListResult, ReadResult,
    StorageStats, UploadResult, WriteResult,
};
use crate::storage::validation::{self, ValidatedPath};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

impl FileGateway {
    /// Read a whole file as text in the requested encoding
    pub fn read(&self, path: &str, encoding: &str) -> Result<ReadResult, GatewayError> {
        self.observed(OperationKind::Read, path, || {
            let target = self.resolve(path)?;
            let encoding: TextEncoding = encoding.parse()?;
            let data = self.read_regular_file(&target)?;
            let content = encoding.decode(&data)?;

            Ok(ReadResult {
                content,
                size: data.len() as u64,
            })
        })
    }

    /// Replace the file at `path` with `content`, encoded as UTF-8.
    ///
    /// With `create_dirs` off, a missing parent directory is an I/O failure.
    pub fn write(
        &self,
        path: &str,
        content: &str,
        create_dirs: bool,
    ) -> Result<WriteResult, GatewayError> {
        self.observed(OperationKind::Write, path, || {
            let target = self.resolve(path)?;
            let bytes = content.as_bytes();
            self.check_size(bytes.len() as u64)?;

            if target.is_root() {
                return Err(GatewayError::Forbidden(path.to_string()));
            }

            let absolute = target.absolute();
            if create_dirs {
                if let Some(parent) = absolute.parent() {
                    filesystem::create_directory(parent)
                        .map_err(|e| GatewayError::io(path, e))?;
                }
            }

            filesystem::write_atomic(absolute, bytes).map_err(|e| GatewayError::io(path, e))?;

            Ok(WriteResult {
                path: absolute.display().to_string(),
                size: bytes.len() as u64,
            })
        })
    }

    /// Store raw bytes under the uploads directory.
    ///
    /// The declared size is checked before anything else, then the
    /// extension, then the filename itself, which must be a single plain
    /// path component.
    pub fn upload(
        &self,
        filename: &str,
        declared_size: u64,
        data: &[u8],
    ) -> Result<UploadResult, GatewayError> {
        self.observed(OperationKind::Upload, filename, || {
            self.check_size(declared_size)?;
            self.check_size(data.len() as u64)?;

            if !is_allowed_upload(filename) {
                let ext = upload_extension(filename).unwrap_or_else(|| "(none)".to_string());
                return Err(GatewayError::UnsupportedType(ext));
            }

            if !is_single_component(filename) {
                return Err(GatewayError::Forbidden(filename.to_string()));
            }

            let uploads = self.resolve(UPLOADS_DIR)?;
            filesystem::create_directory(uploads.absolute())
                .map_err(|e| GatewayError::io(UPLOADS_DIR, e))?;

            let target = self.resolve(&format!("{}/{}", UPLOADS_DIR, filename))?;
            filesystem::write_atomic(target.absolute(), data)
                .map_err(|e| GatewayError::io(filename, e))?;

            Ok(UploadResult {
                filename: filename.to_string(),
                path: target.normalized().to_string(),
                size: data.len() as u64,
            })
        })
    }

    /// Return a file's raw bytes with its name as a download hint
    pub fn download(&self, path: &str) -> Result<DownloadResult, GatewayError> {
        self.observed(OperationKind::Download, path, || {
            let target = self.resolve(path)?;
            let data = self.read_regular_file(&target)?;
            let filename = target
                .absolute()
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            Ok(DownloadResult { filename, data })
        })
    }

    /// List the immediate children of a directory, in discovery order.
    ///
    /// An empty path lists the root. Symlinks are described by their
    /// targets; links whose target lies outside the root are omitted.
    pub fn list(&self, path: &str) -> Result<ListResult, GatewayError> {
        self.observed(OperationKind::List, path, || {
            let target = self.resolve(path)?;
            let absolute = target.absolute();

            let metadata = fs::metadata(absolute).map_err(|e| not_found_or_io(path, e))?;
            if !metadata.is_dir() {
                return Err(GatewayError::NotADirectory(path.to_string()));
            }

            let reader = fs::read_dir(absolute).map_err(|e| GatewayError::io(path, e))?;
            let mut entries = Vec::new();
            for entry in reader {
                let entry = entry.map_err(|e| GatewayError::io(path, e))?;
                let name = entry.file_name().to_string_lossy().into_owned();
                let entry_path = entry.path();

                // Links leading outside the root are left out of the listing
                let is_link = entry.file_type().is_ok_and(|t| t.is_symlink());
                if is_link && self.confine(&entry_path, &name).is_err() {
                    debug!("Hiding {} from listing: link target is outside the root", name);
                    continue;
                }

                // Follows symlinks; an entry removed mid-listing is skipped
                let metadata = match fs::metadata(&entry_path) {
                    Ok(metadata) => metadata,
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                        debug!("Skipping vanished or dangling entry {}", name);
                        continue;
                    }
                    Err(e) => return Err(GatewayError::io(name, e)),
                };

                let (kind, size) = if metadata.is_dir() {
                    (EntryKind::Directory, None)
                } else {
                    (EntryKind::File, Some(metadata.len()))
                };

                entries.push(DirEntryInfo {
                    name,
                    kind,
                    size,
                    modified: modified_time(&metadata),
                });
            }

            info!(
                "Listed {} (real: {}) - {} entries",
                if target.is_root() { "/" } else { target.normalized() },
                absolute.display(),
                entries.len()
            );

            Ok(ListResult {
                path: target.normalized().to_string(),
                entries,
            })
        })
    }

    /// Size, timestamps, content hash and type tag of a file
    pub fn metadata(&self, path: &str) -> Result<FileRecord, GatewayError> {
        self.observed(OperationKind::Metadata, path, || {
            let target = self.resolve(path)?;
            metadata::describe(&target)
        })
    }

    /// Remove a file, or a directory if it is empty.
    ///
    /// Never recursive. The storage root itself cannot be deleted.
    pub fn delete(&self, path: &str) -> Result<DeleteResult, GatewayError> {
        self.observed(OperationKind::Delete, path, || {
            let target = validation::resolve(self.root(), path)?;
            if target.is_root() {
                return Err(GatewayError::Forbidden(path.to_string()));
            }

            // The entry itself may be a symlink pointing anywhere; only the
            // directory holding it has to be inside the root.
            let absolute = target.absolute();
            if let Some(parent) = absolute.parent() {
                self.confine(parent, path)?;
            }

            fs::symlink_metadata(absolute).map_err(|e| not_found_or_io(path, e))?;

            let was_dir = filesystem::remove_entry(absolute).map_err(|e| {
                warn!("Failed to delete {}: {}", absolute.display(), e);
                GatewayError::io(path, e)
            })?;

            Ok(DeleteResult {
                path: target.normalized().to_string(),
                kind: if was_dir {
                    EntryKind::Directory
                } else {
                    EntryKind::File
                },
            })
        })
    }

    /// Count files and bytes under the whole root.
    ///
    /// A full recursive scan on every call; meant for diagnostics only.
    pub fn stats(&self) -> Result<StorageStats, GatewayError> {
        self.observed(OperationKind::Stats, "", || {
            let mut total_files = 0u64;
            let mut total_size_bytes = 0u64;

            for entry in WalkDir::new(self.root().path()).follow_links(false) {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        warn!("Skipping unreadable entry during stats scan: {}", e);
                        continue;
                    }
                };
                if !entry.file_type().is_file() {
                    continue;
                }
                match entry.metadata() {
                    Ok(metadata) => {
                        total_files += 1;
                        total_size_bytes += metadata.len();
                    }
                    Err(e) => warn!("Skipping {} during stats scan: {}", entry.path().display(), e),
                }
            }

            let total_size_mb = (total_size_bytes as f64 / BYTES_PER_MB * 100.0).round() / 100.0;

            Ok(StorageStats {
                total_files,
                total_size_bytes,
                total_size_mb,
                max_file_size_bytes: self.max_file_size(),
                max_file_size_mb: self.max_file_size() / (1024 * 1024),
                storage_root: self.root().path().display().to_string(),
            })
        })
    }

    /// Stat, size-check and read a regular file, bounded by the limit
    fn read_regular_file(&self, target: &ValidatedPath) -> Result<Vec<u8>, GatewayError> {
        let raw = target.raw();
        let absolute = target.absolute();

        let metadata = fs::metadata(absolute).map_err(|e| not_found_or_io(raw, e))?;
        if !metadata.is_file() {
            return Err(GatewayError::NotFound(raw.to_string()));
        }
        self.check_size(metadata.len())?;

        match filesystem::read_bounded(absolute, self.max_file_size(), metadata.len()) {
            Ok(BoundedRead::Complete(data)) => Ok(data),
            Ok(BoundedRead::Exceeded) => Err(GatewayError::TooLarge {
                size: self.max_file_size().saturating_add(1),
                limit: self.max_file_size(),
            }),
            Err(e) => Err(not_found_or_io(raw, e)),
        }
    }
}

/// True if `filename` is exactly one ordinary path component
fn is_single_component(filename: &str) -> bool {
    let mut components = Path::new(filename).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !filename.contains('/')
}
