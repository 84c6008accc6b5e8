//! Content hashing
//!
//! SHA-256 digests rendered as 64 lowercase hex characters. Files are read
//! in fixed-size chunks so memory stays flat whatever the file size.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Bytes read per chunk while hashing
pub const HASH_CHUNK_SIZE: usize = 4096;

/// Hash everything `reader` yields
pub fn hash_reader<R: Read>(mut reader: R) -> io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; HASH_CHUNK_SIZE];

    loop {
        let n = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Hash the file at `path`
pub fn hash_file(path: &Path) -> io::Result<String> {
    let file = File::open(path)?;
    hash_reader(file)
}

pub fn hash_bytes(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
