use std::fs;
use std::sync::Arc;

use filegate_server::error::{ErrorKind, GatewayError};
use filegate_server::storage::hasher::hash_bytes;
use filegate_server::storage::{
    DEFAULT_MAX_FILE_SIZE, EntryKind, FileGateway, OperationStats, StorageRoot,
};
use tempfile::TempDir;

const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

// Helper to build a gateway over a fresh temporary root
fn setup_gateway(limit: u64) -> (TempDir, FileGateway) {
    let dir = TempDir::new().unwrap();
    let root = StorageRoot::open(dir.path()).unwrap();
    (dir, FileGateway::new(root, limit))
}

fn kind_of<T: std::fmt::Debug>(result: Result<T, GatewayError>) -> ErrorKind {
    result.unwrap_err().kind()
}

#[test]
fn test_hello_scenario() {
    let (dir, gateway) = setup_gateway(DEFAULT_MAX_FILE_SIZE);

    let written = gateway.write("notes/a.txt", "hello", true).unwrap();
    assert_eq!(written.size, 5);
    assert!(dir.path().join("notes/a.txt").is_file());

    let record = gateway.metadata("notes/a.txt").unwrap();
    assert_eq!(record.hash, HELLO_SHA256);
    assert_eq!(record.size, 5);
    assert_eq!(record.file_type, ".txt");

    gateway.delete("notes/a.txt").unwrap();
    assert!(!dir.path().join("notes/a.txt").exists());

    assert_eq!(kind_of(gateway.read("notes/a.txt", "utf-8")), ErrorKind::NotFound);
}

#[test]
fn test_write_then_read_round_trip() {
    let (_dir, gateway) = setup_gateway(DEFAULT_MAX_FILE_SIZE);
    let text = "first line\nzweite Zeile: äöü\n第三行\n";

    gateway.write("docs/mixed.md", text, true).unwrap();
    let read = gateway.read("docs/mixed.md", "utf-8").unwrap();
    assert_eq!(read.content, text);
    assert_eq!(read.size, text.len() as u64);
}

#[test]
fn test_write_replaces_existing_content() {
    let (_dir, gateway) = setup_gateway(DEFAULT_MAX_FILE_SIZE);

    gateway.write("config.yaml", "a: 1\nb: 2\n", false).unwrap();
    gateway.write("config.yaml", "a: 3\n", false).unwrap();
    assert_eq!(gateway.read("config.yaml", "utf-8").unwrap().content, "a: 3\n");
}

#[test]
fn test_traversal_rejected_everywhere() {
    let (dir, gateway) = setup_gateway(DEFAULT_MAX_FILE_SIZE);
    fs::write(dir.path().join("inside.txt"), "x").unwrap();

    for path in ["../outside.txt", "a/../../b", "a/..hidden", "/etc/passwd", "..", "a\\..\\b"] {
        assert!(!gateway.validate(path), "{} should be rejected", path);
        assert_eq!(kind_of(gateway.read(path, "utf-8")), ErrorKind::Forbidden);
        assert_eq!(kind_of(gateway.metadata(path)), ErrorKind::Forbidden);
        assert_eq!(kind_of(gateway.delete(path)), ErrorKind::Forbidden);
        assert_eq!(kind_of(gateway.write(path, "x", true)), ErrorKind::Forbidden);
    }
    assert!(gateway.validate("inside.txt"));
}

#[test]
fn test_deny_listed_prefixes_rejected_without_traversal() {
    let gateway = FileGateway::new(StorageRoot::assume_canonical("/"), DEFAULT_MAX_FILE_SIZE);

    for path in ["etc/passwd", "proc/self/status", "sys/kernel", "dev/null", "boot"] {
        assert!(!gateway.validate(path), "{} should be rejected", path);
    }
    assert!(gateway.validate("etcetera/notes.txt"));
}

#[test]
fn test_oversized_write_creates_nothing() {
    let (dir, gateway) = setup_gateway(DEFAULT_MAX_FILE_SIZE);
    let content = "a".repeat(51 * 1024 * 1024);

    assert_eq!(kind_of(gateway.write("big.txt", &content, true)), ErrorKind::TooLarge);
    assert!(!dir.path().join("big.txt").exists());
}

#[test]
fn test_oversized_write_leaves_existing_file_untouched() {
    let (_dir, gateway) = setup_gateway(16);
    gateway.write("keep.txt", "original", false).unwrap();

    let err = gateway.write("keep.txt", "this is far more than sixteen bytes", false);
    assert_eq!(kind_of(err), ErrorKind::TooLarge);
    assert_eq!(gateway.read("keep.txt", "utf-8").unwrap().content, "original");
}

#[test]
fn test_oversized_file_rejected_on_read_and_download() {
    let (dir, gateway) = setup_gateway(4);
    fs::write(dir.path().join("five.txt"), "12345").unwrap();

    assert_eq!(kind_of(gateway.read("five.txt", "utf-8")), ErrorKind::TooLarge);
    assert_eq!(kind_of(gateway.download("five.txt")), ErrorKind::TooLarge);
}

#[test]
fn test_upload_rejects_disallowed_extension() {
    let (dir, gateway) = setup_gateway(DEFAULT_MAX_FILE_SIZE);

    let err = gateway.upload("payload.exe", 2, b"MZ").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedType);
    assert!(!dir.path().join("uploads/payload.exe").exists());

    assert_eq!(kind_of(gateway.upload("Makefile", 1, b"x")), ErrorKind::UnsupportedType);
}

#[test]
fn test_upload_stores_under_uploads() {
    let (dir, gateway) = setup_gateway(DEFAULT_MAX_FILE_SIZE);

    let uploaded = gateway.upload("README.MD", 6, b"# Hi\n\n").unwrap();
    assert_eq!(uploaded.size, 6);
    assert_eq!(uploaded.path, "uploads/README.MD");
    assert_eq!(fs::read(dir.path().join("uploads/README.MD")).unwrap(), b"# Hi\n\n");
}

#[test]
fn test_upload_checks_declared_size_first() {
    let (_dir, gateway) = setup_gateway(8);

    assert_eq!(kind_of(gateway.upload("a.txt", 9, b"small")), ErrorKind::TooLarge);
    // Size wins over a bad extension
    assert_eq!(kind_of(gateway.upload("a.exe", 9, b"small")), ErrorKind::TooLarge);
}

#[test]
fn test_upload_rejects_nested_filename() {
    let (_dir, gateway) = setup_gateway(DEFAULT_MAX_FILE_SIZE);

    assert_eq!(kind_of(gateway.upload("../escape.txt", 1, b"x")), ErrorKind::Forbidden);
    assert_eq!(kind_of(gateway.upload("sub/dir.txt", 1, b"x")), ErrorKind::Forbidden);
}

#[test]
fn test_download_returns_raw_bytes() {
    let (dir, gateway) = setup_gateway(DEFAULT_MAX_FILE_SIZE);
    let bytes = vec![0u8, 159, 146, 150, 255];
    fs::create_dir(dir.path().join("bin")).unwrap();
    fs::write(dir.path().join("bin/blob.dat"), &bytes).unwrap();

    let download = gateway.download("bin/blob.dat").unwrap();
    assert_eq!(download.filename, "blob.dat");
    assert_eq!(download.data, bytes);

    // Not valid UTF-8, so reading it as text fails
    assert_eq!(kind_of(gateway.read("bin/blob.dat", "utf-8")), ErrorKind::InvalidEncoding);
}

#[test]
fn test_delete_semantics() {
    let (dir, gateway) = setup_gateway(DEFAULT_MAX_FILE_SIZE);
    gateway.write("full/file.txt", "data", true).unwrap();
    fs::create_dir(dir.path().join("empty")).unwrap();

    assert_eq!(kind_of(gateway.delete("full")), ErrorKind::IoFailure);
    assert!(dir.path().join("full/file.txt").exists());

    let deleted = gateway.delete("empty").unwrap();
    assert_eq!(deleted.kind, EntryKind::Directory);
    assert!(!dir.path().join("empty").exists());

    let deleted = gateway.delete("full/file.txt").unwrap();
    assert_eq!(deleted.kind, EntryKind::File);
    assert!(!dir.path().join("full/file.txt").exists());

    assert_eq!(kind_of(gateway.delete("full/file.txt")), ErrorKind::NotFound);
    assert_eq!(kind_of(gateway.delete("")), ErrorKind::Forbidden);
    assert!(dir.path().exists());
}

#[test]
fn test_list_semantics() {
    let (dir, gateway) = setup_gateway(DEFAULT_MAX_FILE_SIZE);
    gateway.write("a.txt", "12345", false).unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();

    let listing = gateway.list("").unwrap();
    assert_eq!(listing.entries.len(), 2);
    let file = listing.entries.iter().find(|e| e.name == "a.txt").unwrap();
    assert_eq!(file.kind, EntryKind::File);
    assert_eq!(file.size, Some(5));
    let sub = listing.entries.iter().find(|e| e.name == "sub").unwrap();
    assert_eq!(sub.kind, EntryKind::Directory);
    assert_eq!(sub.size, None);

    assert_eq!(kind_of(gateway.list("a.txt")), ErrorKind::NotADirectory);
    assert_eq!(kind_of(gateway.list("missing")), ErrorKind::NotFound);
}

#[test]
fn test_write_without_create_dirs_fails_on_missing_parent() {
    let (dir, gateway) = setup_gateway(DEFAULT_MAX_FILE_SIZE);

    assert_eq!(kind_of(gateway.write("no/such/dir.txt", "x", false)), ErrorKind::IoFailure);
    assert!(!dir.path().join("no").exists());
}

#[test]
fn test_unknown_encoding_rejected() {
    let (_dir, gateway) = setup_gateway(DEFAULT_MAX_FILE_SIZE);
    gateway.write("a.txt", "abc", false).unwrap();

    assert_eq!(kind_of(gateway.read("a.txt", "klingon")), ErrorKind::InvalidEncoding);
    assert_eq!(gateway.read("a.txt", "latin-1").unwrap().content, "abc");
}

#[test]
fn test_metadata_hash_changes_with_content() {
    let (_dir, gateway) = setup_gateway(DEFAULT_MAX_FILE_SIZE);

    gateway.write("h.txt", "hello", false).unwrap();
    let first = gateway.metadata("h.txt").unwrap();
    assert_eq!(first.hash, gateway.metadata("h.txt").unwrap().hash);

    gateway.write("h.txt", "hellp", false).unwrap();
    let second = gateway.metadata("h.txt").unwrap();
    assert_ne!(first.hash, second.hash);
    assert_eq!(second.hash, hash_bytes(b"hellp"));
    assert_eq!(second.hash.len(), 64);
}

#[test]
fn test_stats_scans_whole_root() {
    let (_dir, gateway) = setup_gateway(DEFAULT_MAX_FILE_SIZE);
    gateway.write("a.txt", "12345", false).unwrap();
    gateway.write("deep/er/b.txt", "123", true).unwrap();
    gateway.upload("c.json", 2, b"{}").unwrap();

    let stats = gateway.stats().unwrap();
    assert_eq!(stats.total_files, 3);
    assert_eq!(stats.total_size_bytes, 10);
    assert_eq!(stats.total_size_mb, 0.0);
    assert_eq!(stats.max_file_size_mb, 50);
}

#[test]
fn test_observer_counts_operations() {
    let dir = TempDir::new().unwrap();
    let stats = Arc::new(OperationStats::new());
    let gateway = FileGateway::new(StorageRoot::open(dir.path()).unwrap(), 1024)
        .with_observer(stats.clone());

    gateway.write("a.txt", "hello", false).unwrap();
    gateway.read("a.txt", "utf-8").unwrap();
    gateway.read("missing.txt", "utf-8").unwrap_err();

    let snapshot = stats.snapshot();
    assert_eq!(snapshot.operations_count, 3);
    assert_eq!(snapshot.files_written, 1);
    assert_eq!(snapshot.files_read, 1);
    assert_eq!(snapshot.errors, 1);
    assert_eq!(snapshot.bytes_processed, 10);
    let last = snapshot.last_operation.unwrap();
    assert!(!last.success);
    assert_eq!(last.error, Some(ErrorKind::NotFound));
}

#[cfg(unix)]
#[test]
fn test_symlink_escape_is_forbidden() {
    use std::os::unix::fs::symlink;

    let outside = TempDir::new().unwrap();
    fs::write(outside.path().join("secret.txt"), "top secret").unwrap();

    let (dir, gateway) = setup_gateway(DEFAULT_MAX_FILE_SIZE);
    symlink(outside.path(), dir.path().join("link")).unwrap();

    assert_eq!(kind_of(gateway.read("link/secret.txt", "utf-8")), ErrorKind::Forbidden);
    assert_eq!(kind_of(gateway.write("link/new.txt", "x", false)), ErrorKind::Forbidden);
    assert!(!outside.path().join("new.txt").exists());

    // Deleting the link removes the link, not its target
    gateway.delete("link").unwrap();
    assert!(outside.path().join("secret.txt").exists());
}

#[cfg(unix)]
#[test]
fn test_list_hides_links_leaving_the_root() {
    use std::os::unix::fs::symlink;

    let outside = TempDir::new().unwrap();
    fs::write(outside.path().join("big.bin"), vec![0u8; 12345]).unwrap();

    let (dir, gateway) = setup_gateway(DEFAULT_MAX_FILE_SIZE);
    gateway.write("local.txt", "abc", false).unwrap();
    symlink(outside.path().join("big.bin"), dir.path().join("escape")).unwrap();
    symlink(outside.path(), dir.path().join("escape_dir")).unwrap();
    symlink(dir.path().join("local.txt"), dir.path().join("alias")).unwrap();

    let listing = gateway.list("").unwrap();
    let mut names: Vec<&str> = listing.entries.iter().map(|e| e.name.as_str()).collect();
    names.sort_unstable();
    assert_eq!(names, ["alias", "local.txt"]);

    // A link that stays inside the root reports its target
    let alias = listing.entries.iter().find(|e| e.name == "alias").unwrap();
    assert_eq!(alias.kind, EntryKind::File);
    assert_eq!(alias.size, Some(3));

    assert_eq!(kind_of(gateway.read("escape", "utf-8")), ErrorKind::Forbidden);
}
