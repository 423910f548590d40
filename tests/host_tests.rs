//! Tests for host primitives
//!
//! These tests verify:
//! - MemoryStorage map semantics and quota accounting
//! - FileStorage persistence and corruption detection
//! - DirFileSystem path resolution and directory creation
//! - The host call guard and the error mapping table

use std::fs;
use std::io;

use hostkv::host::{
    guard, BackendHandle, DirFileSystem, FileStorage, HostError, HostErrorKind, HostFileSystem,
    HostStorage, MemoryStorage,
};
use hostkv::{HostKvError, ResultCode};
use tempfile::TempDir;

// =============================================================================
// MemoryStorage Tests
// =============================================================================

#[test]
fn test_memory_storage_basic_operations() {
    let store = MemoryStorage::new();
    assert!(store.is_empty().unwrap());

    store.set_item("b", "2").unwrap();
    store.set_item("a", "1").unwrap();

    assert_eq!(store.get_item("a").unwrap(), Some("1".to_string()));
    assert_eq!(store.len().unwrap(), 2);
    assert_eq!(store.key_at(0).unwrap(), Some("a".to_string()));
    assert_eq!(store.key_at(2).unwrap(), None);

    store.remove_item("a").unwrap();
    store.remove_item("a").unwrap();
    assert_eq!(store.get_item("a").unwrap(), None);

    store.clear().unwrap();
    assert_eq!(store.len().unwrap(), 0);
    assert_eq!(store.used_bytes(), 0);
}

#[test]
fn test_memory_storage_quota_counts_replacements() {
    let store = MemoryStorage::with_quota(Some(10));

    store.set_item("key", "12345").unwrap();
    assert_eq!(store.used_bytes(), 8);

    // Replacing releases the old value's bytes first.
    store.set_item("key", "1234567").unwrap();
    assert_eq!(store.used_bytes(), 10);

    let err = store.set_item("other", "x").unwrap_err();
    assert_eq!(err.kind(), HostErrorKind::QuotaExceeded);
    assert_eq!(store.get_item("other").unwrap(), None);
    assert_eq!(store.used_bytes(), 10);
}

// =============================================================================
// FileStorage Tests
// =============================================================================

#[test]
fn test_file_storage_persists_across_reopen() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("local.kv");

    {
        let store = FileStorage::open(&path, None).unwrap();
        store.set_item("kvvfs-local-sz", "4096").unwrap();
        store.set_item("kvvfs-local-1", "AB").unwrap();
        store.remove_item("kvvfs-local-1").unwrap();
    }

    let store = FileStorage::open(&path, None).unwrap();
    assert_eq!(store.len().unwrap(), 1);
    assert_eq!(store.get_item("kvvfs-local-sz").unwrap(), Some("4096".to_string()));
}

#[test]
fn test_file_storage_key_at_is_ordered() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("local.kv");

    let store = FileStorage::open(&path, None).unwrap();
    store.set_item("kvvfs-local-sz", "4096").unwrap();
    store.set_item("kvvfs-local-1", "AB").unwrap();
    drop(store);

    let store = FileStorage::open(&path, None).unwrap();
    assert_eq!(store.key_at(0).unwrap(), Some("kvvfs-local-1".to_string()));
    assert_eq!(store.key_at(1).unwrap(), Some("kvvfs-local-sz".to_string()));
    assert_eq!(store.key_at(2).unwrap(), None);
}

#[test]
fn test_file_storage_clear_persists() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("local.kv");

    let store = FileStorage::open(&path, None).unwrap();
    store.set_item("k", "v").unwrap();
    store.clear().unwrap();
    drop(store);

    assert!(FileStorage::open(&path, None).unwrap().is_empty().unwrap());
}

#[test]
fn test_file_storage_quota() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("local.kv");
    let store = FileStorage::open(&path, Some(8)).unwrap();

    store.set_item("k", "v").unwrap();
    let err = store.set_item("k2", "too long").unwrap_err();

    assert_eq!(err.kind(), HostErrorKind::QuotaExceeded);
    drop(store);
    assert_eq!(FileStorage::open(&path, None).unwrap().len().unwrap(), 1);
}

#[test]
fn test_file_storage_failed_persist_cleans_up() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("local.kv");
    let store = FileStorage::open(&path, None).unwrap();

    // A directory in the snapshot's place makes the final rename fail.
    fs::create_dir(&path).unwrap();
    fs::write(path.join("occupied"), b"x").unwrap();

    let err = store.set_item("k", "v").unwrap_err();

    assert_eq!(err.kind().result_code(), ResultCode::IoError);
    assert!(!temp.path().join("local.tmp").exists());
    assert_eq!(store.get_item("k").unwrap(), None);
}

#[test]
fn test_file_storage_detects_checksum_mismatch() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("local.kv");
    FileStorage::open(&path, None).unwrap().set_item("k", "value").unwrap();

    let mut bytes = fs::read(&path).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xff;
    fs::write(&path, &bytes).unwrap();

    let err = FileStorage::open(&path, None).unwrap_err();
    assert!(matches!(err, HostKvError::Corruption(_)));
    assert_eq!(err.code(), ResultCode::IoError);
}

#[test]
fn test_file_storage_detects_bad_magic_and_truncation() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("local.kv");

    fs::write(&path, b"nope").unwrap();
    assert!(matches!(
        FileStorage::open(&path, None).unwrap_err(),
        HostKvError::Corruption(_)
    ));

    fs::write(&path, b"XXXXxxxxxxxxxxxxxxxxxx").unwrap();
    assert!(matches!(
        FileStorage::open(&path, None).unwrap_err(),
        HostKvError::Corruption(_)
    ));
}

// =============================================================================
// DirFileSystem Tests
// =============================================================================

#[test]
fn test_dir_resolve() {
    let fs = DirFileSystem::new("/srv/tree");

    assert_eq!(
        fs.resolve("/persistent/db").unwrap(),
        std::path::Path::new("/srv/tree/persistent/db")
    );
    assert!(fs.resolve("relative").is_none());
    assert!(fs.resolve("/../escape").is_none());
}

#[test]
fn test_dir_create_directory() {
    let temp = TempDir::new().unwrap();
    let tree = DirFileSystem::new(temp.path().join("tree"));

    let backend = tree.create_backend().unwrap();
    assert!(!tree.exists("/persistent").unwrap());

    tree.create_directory("/persistent", 0o777, &backend).unwrap();
    assert!(tree.exists("/persistent").unwrap());

    let err = tree.create_directory("/persistent", 0o777, &backend).unwrap_err();
    assert_eq!(err.kind(), HostErrorKind::AlreadyExists);
}

#[test]
fn test_dir_rejects_unknown_backend() {
    let temp = TempDir::new().unwrap();
    let tree = DirFileSystem::new(temp.path());

    let err = tree
        .create_directory("/persistent", 0o777, &BackendHandle::new(42))
        .unwrap_err();
    assert_eq!(err.kind(), HostErrorKind::NotFound);
}

// =============================================================================
// Guard and Mapping Tests
// =============================================================================

#[test]
fn test_guard_passes_results_through() {
    assert_eq!(guard("ok", || Ok::<_, HostError>(7)).unwrap(), 7);

    let err = guard("err", || Err::<(), _>(HostError::unavailable("off"))).unwrap_err();
    assert_eq!(err.kind(), HostErrorKind::Unavailable);
}

#[test]
fn test_guard_catches_panics() {
    let err = guard("explode", || -> Result<(), HostError> { panic!("kaboom") }).unwrap_err();

    assert_eq!(err.kind(), HostErrorKind::Panicked);
    assert!(err.message().contains("kaboom"));
}

#[test]
fn test_io_error_kinds_map_to_host_kinds() {
    let cases = [
        (io::ErrorKind::NotFound, HostErrorKind::NotFound),
        (io::ErrorKind::AlreadyExists, HostErrorKind::AlreadyExists),
        (io::ErrorKind::PermissionDenied, HostErrorKind::Unavailable),
        (io::ErrorKind::OutOfMemory, HostErrorKind::OutOfMemory),
        (io::ErrorKind::Other, HostErrorKind::Io),
    ];

    for (io_kind, expected) in cases {
        let err = HostError::from(io::Error::new(io_kind, "x"));
        assert_eq!(err.kind(), expected);
    }
}

#[test]
fn test_host_kind_result_codes() {
    assert_eq!(HostErrorKind::OutOfMemory.result_code(), ResultCode::OutOfMemory);
    for kind in [
        HostErrorKind::QuotaExceeded,
        HostErrorKind::Unavailable,
        HostErrorKind::NotFound,
        HostErrorKind::AlreadyExists,
        HostErrorKind::Corrupted,
        HostErrorKind::Panicked,
        HostErrorKind::Io,
    ] {
        assert_eq!(kind.result_code(), ResultCode::IoError, "{:?}", kind);
    }
}
