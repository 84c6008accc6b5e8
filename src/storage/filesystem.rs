//! File system operations
//!
//! Raw, size-bounded I/O used by the gateway once a path has been validated.

use log::{debug, error};
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};

/// Buffer size for bounded reads
pub const BUFFER_SIZE: usize = 8192;

static TEMP_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Outcome of a bounded read
#[derive(Debug)]
pub enum BoundedRead {
    Complete(Vec<u8>),
    /// The file yielded more than the limit; reading stopped early
    Exceeded,
}

/// Read a whole file, giving up as soon as more than `limit` bytes arrive.
///
/// `size_hint` (usually the pre-read stat) only sizes the buffer.
pub fn read_bounded(path: &Path, limit: u64, size_hint: u64) -> io::Result<BoundedRead> {
    let file = File::open(path)?;
    let capacity = size_hint.min(limit) as usize;
    let mut data = Vec::with_capacity(capacity);

    let mut reader = file.take(limit.saturating_add(1));
    let mut buffer = [0u8; BUFFER_SIZE];
    loop {
        let n = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        data.extend_from_slice(&buffer[..n]);
        if data.len() as u64 > limit {
            return Ok(BoundedRead::Exceeded);
        }
    }

    Ok(BoundedRead::Complete(data))
}

/// Sibling temporary path for an atomic write of `target`
pub fn temp_path_for(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let sequence = TEMP_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    target.with_file_name(format!(".{}.{}.{}.tmp", name, process::id(), sequence))
}

/// Replace `target` with `data` atomically.
///
/// Bytes go to a temporary sibling first and are renamed over the target
/// only after a successful flush and sync, so a failed write never leaves a
/// partial destination file behind. The parent directory must already exist.
pub fn write_atomic(target: &Path, data: &[u8]) -> io::Result<()> {
    let temp_path = temp_path_for(target);

    let result = (|| {
        let mut temp_file = File::create(&temp_path)?;
        temp_file.write_all(data)?;
        temp_file.flush()?;
        temp_file.sync_all()?;
        drop(temp_file);
        fs::rename(&temp_path, target)
    })();

    if let Err(e) = &result {
        error!(
            "Atomic write to {} failed: {}",
            target.display(),
            e
        );
        if let Err(cleanup) = fs::remove_file(&temp_path) {
            if cleanup.kind() != io::ErrorKind::NotFound {
                debug!(
                    "Could not remove temporary file {}: {}",
                    temp_path.display(),
                    cleanup
                );
            }
        }
    }

    result
}

/// Create a directory and any missing parents
pub fn create_directory(path: &Path) -> io::Result<()> {
    fs::create_dir_all(path)
}

/// Remove a file, a symlink, or an empty directory.
///
/// Directories are never removed recursively: a non-empty one fails with
/// the underlying I/O error.
pub fn remove_entry(path: &Path) -> io::Result<bool> {
    let metadata = fs::symlink_metadata(path)?;
    if metadata.is_dir() {
        fs::remove_dir(path)?;
        Ok(true)
    } else {
        fs::remove_file(path)?;
        Ok(false)
    }
}
