//! Path validation
//!
//! Decides whether a caller-supplied path may be resolved against the
//! storage root. Everything in here is lexical: no function touches the
//! filesystem except [`StorageRoot::open`].
//!
//! Validation is two ordered predicates:
//!
//! 1. [`escapes_root`] on the normalized candidate (parent markers,
//!    absolute-path injection, NUL bytes)
//! 2. [`is_denied`] on the absolute path resolved under the root
//!
//! The second should never fire once the first passed. When it does, the
//! root itself sits somewhere it should not and the hit is logged as an
//! anomaly.

use log::warn;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::GatewayError;

/// Absolute prefixes that are never accessible, whatever the root
pub const FORBIDDEN_PREFIXES: &[&str] = &["/etc", "/sys", "/proc", "/dev", "/boot"];

/// The single directory every caller path is confined to.
#[derive(Debug, Clone)]
pub struct StorageRoot {
    path: PathBuf,
}

impl StorageRoot {
    /// Create the directory if missing and pin its canonical absolute form.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        fs::create_dir_all(path)?;
        let canonical = path.canonicalize()?;
        Ok(Self { path: canonical })
    }

    /// Use `path` as-is. The caller guarantees it is absolute and canonical.
    pub fn assume_canonical(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// A caller path that passed validation.
///
/// Only [`resolve`] constructs one, so holding a `ValidatedPath` means the
/// candidate was checked before any I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedPath {
    raw: String,
    normalized: String,
    absolute: PathBuf,
}

impl ValidatedPath {
    /// The candidate exactly as the caller sent it
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Lexically normalized relative form; empty for the root itself
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    pub fn absolute(&self) -> &Path {
        &self.absolute
    }

    pub fn is_root(&self) -> bool {
        self.normalized.is_empty()
    }
}

/// Lexically normalize a candidate path.
///
/// Drops empty and `.` segments and folds `name/..` pairs. A `..` with
/// nothing left to fold is kept for relative paths (so traversal stays
/// visible to [`escapes_root`]) and dropped right after a leading `/`, the
/// way POSIX treats `/..`. An empty relative result means "the root" and is
/// returned as the empty string.
pub fn normalize(candidate: &str) -> String {
    let absolute = candidate.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();

    for segment in candidate.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                _ if absolute => {}
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");
    if absolute {
        format!("/{}", joined)
    } else {
        joined
    }
}

/// True when a normalized candidate would leave the storage root.
///
/// Any `..` is refused, including ones glued to other characters
/// (`..\\`, `a..`, `..%2f`). Absolute paths, Windows drive or UNC prefixes
/// and NUL bytes are refused as well.
pub fn escapes_root(normalized: &str) -> bool {
    if normalized.contains("..") || normalized.contains('\0') {
        return true;
    }

    if normalized.starts_with('/') || normalized.starts_with('\\') {
        return true;
    }

    let bytes = normalized.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        return true;
    }

    Path::new(normalized)
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
}

/// True when an absolute path falls under a deny-listed prefix.
///
/// Matching is per component: `/etc/passwd` is denied, `/etcetera` is not.
pub fn is_denied(absolute: &Path) -> bool {
    FORBIDDEN_PREFIXES
        .iter()
        .any(|prefix| absolute.starts_with(prefix))
}

/// Validate `candidate` and resolve it under `root`.
pub fn resolve(root: &StorageRoot, candidate: &str) -> Result<ValidatedPath, GatewayError> {
    let normalized = normalize(candidate);

    if escapes_root(&normalized) {
        return Err(GatewayError::Forbidden(candidate.to_string()));
    }

    let absolute = if normalized.is_empty() {
        root.path().to_path_buf()
    } else {
        root.path().join(&normalized)
    };

    if is_denied(&absolute) {
        warn!(
            "Deny-list hit for {:?} after root confinement passed (resolved {}, root {}); check the storage root",
            candidate,
            absolute.display(),
            root.path().display()
        );
        return Err(GatewayError::Forbidden(candidate.to_string()));
    }

    Ok(ValidatedPath {
        raw: candidate.to_string(),
        normalized,
        absolute,
    })
}

/// True if `candidate` may be resolved against `root`
pub fn validate(root: &StorageRoot, candidate: &str) -> bool {
    resolve(root, candidate).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> StorageRoot {
        StorageRoot::assume_canonical("/data")
    }

    #[test]
    fn test_normalize_collapses_segments() {
        assert_eq!(normalize("notes/./a.txt"), "notes/a.txt");
        assert_eq!(normalize("notes//a.txt"), "notes/a.txt");
        assert_eq!(normalize("notes/drafts/../a.txt"), "notes/a.txt");
        assert_eq!(normalize("./"), "");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("a/b/../../"), "");
    }

    #[test]
    fn test_normalize_keeps_unfoldable_parents() {
        assert_eq!(normalize("../etc/hosts"), "../etc/hosts");
        assert_eq!(normalize("a/../../b"), "../b");
        assert_eq!(normalize("/../etc"), "/etc");
    }

    #[test]
    fn test_escapes_root_parent_markers() {
        for candidate in [
            "../../../etc/hosts",
            "a/../../b",
            "..",
            "foo/..\\..\\bar",
            "..%2fsecret",
            "notes/..hidden",
            "....//x",
        ] {
            assert!(
                escapes_root(&normalize(candidate)),
                "expected {candidate:?} to be rejected"
            );
        }
    }

    #[test]
    fn test_escapes_root_absolute_injection() {
        assert!(escapes_root(&normalize("/etc/passwd")));
        assert!(escapes_root(&normalize("/home/user/file.txt")));
        assert!(escapes_root("C:\\Windows\\system32"));
        assert!(escapes_root("\\\\server\\share"));
        assert!(escapes_root("notes/a\0.txt"));
    }

    #[test]
    fn test_escapes_root_accepts_plain_relative() {
        assert!(!escapes_root(&normalize("notes/a.txt")));
        assert!(!escapes_root(&normalize("deep/er/still/file.json")));
        assert!(!escapes_root(&normalize("")));
        assert!(!escapes_root(&normalize("%2e%2e/literal")));
    }

    #[test]
    fn test_is_denied_prefixes() {
        assert!(is_denied(Path::new("/etc/passwd")));
        assert!(is_denied(Path::new("/etc")));
        assert!(is_denied(Path::new("/sys/kernel/debug")));
        assert!(is_denied(Path::new("/proc/self/environ")));
        assert!(is_denied(Path::new("/dev/null")));
        assert!(is_denied(Path::new("/boot/vmlinuz")));
        assert!(!is_denied(Path::new("/etcetera/notes.txt")));
        assert!(!is_denied(Path::new("/data/etc/passwd")));
    }

    #[test]
    fn test_resolve_under_root() {
        let resolved = resolve(&root(), "notes/./a.txt").unwrap();
        assert_eq!(resolved.raw(), "notes/./a.txt");
        assert_eq!(resolved.normalized(), "notes/a.txt");
        assert_eq!(resolved.absolute(), Path::new("/data/notes/a.txt"));
        assert!(!resolved.is_root());

        let root_dir = resolve(&root(), "").unwrap();
        assert!(root_dir.is_root());
        assert_eq!(root_dir.absolute(), Path::new("/data"));
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let err = resolve(&root(), "../../../etc/hosts").unwrap_err();
        assert!(matches!(err, GatewayError::Forbidden(_)));
        assert!(!validate(&root(), "/etc/passwd"));
        assert!(!validate(&root(), "/sys/kernel/debug"));
    }

    #[test]
    fn test_resolve_rejects_denied_root() {
        // A root that itself sits under a deny-listed prefix rejects everything
        let misplaced = StorageRoot::assume_canonical("/etc/filegate");
        assert!(!validate(&misplaced, "config.json"));
        assert!(!validate(&misplaced, ""));
    }
}
