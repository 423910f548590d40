//! Tests for Runtime
//!
//! These tests verify:
//! - Opening creates the data directory and persistent map
//! - Config validation
//! - Session vs persistent lifetimes across reopen
//! - Per-event calls: smoke, mount, unlink

use hostkv::config::Config;
use hostkv::{ResultCode, Runtime};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_runtime() -> (TempDir, Runtime) {
    let temp_dir = TempDir::new().unwrap();
    let runtime = Runtime::open_path(temp_dir.path()).unwrap();
    (temp_dir, runtime)
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_runtime_open_creates_data_dir() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().join("mydb");

    let runtime = Runtime::open(Config::builder().data_dir(&data_dir).build()).unwrap();
    runtime.kv().write("local", "k", b"v").unwrap();

    assert!(data_dir.exists());
    assert!(data_dir.join("local.kv").exists());
}

#[test]
fn test_runtime_rejects_bad_config() {
    let temp_dir = TempDir::new().unwrap();

    let tiny_keys = Config::builder()
        .data_dir(temp_dir.path())
        .key_capacity(4)
        .build();
    assert_eq!(Runtime::open(tiny_keys).err().map(|e| e.code()), Some(ResultCode::Misuse));

    let bad_mount = Config::builder()
        .data_dir(temp_dir.path())
        .default_mount_point("/a/b")
        .build();
    assert!(bad_mount.validate().is_err());

    assert!(Config::default().validate().is_ok());
}

#[test]
fn test_persistent_survives_reopen_session_does_not() {
    let temp_dir = TempDir::new().unwrap();

    {
        let runtime = Runtime::open_path(temp_dir.path()).unwrap();
        runtime.kv().write("local", "sz", b"4096").unwrap();
        runtime.kv().write("session", "sz", b"1024").unwrap();
    }

    let runtime = Runtime::open_path(temp_dir.path()).unwrap();
    assert_eq!(runtime.kv().get("local", "sz").unwrap().as_deref(), Some(&b"4096"[..]));
    assert_eq!(runtime.kv().get("session", "sz").unwrap(), None);
}

#[test]
fn test_persistent_quota_from_config() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .persistent_quota(32)
        .build();
    let runtime = Runtime::open(config).unwrap();

    let err = runtime.kv().write("local", "k", &[b'x'; 64]).unwrap_err();
    assert_eq!(err.code(), ResultCode::IoError);
    runtime.kv().write("session", "k", &[b'x'; 64]).unwrap();
}

// =============================================================================
// Event Tests
// =============================================================================

#[test]
fn test_smoke() {
    let (_temp, runtime) = setup_temp_runtime();

    let report = runtime.smoke().unwrap();

    assert_eq!(report.read, 5);
    assert_eq!(report.value, "world");
    assert!(report.deleted);
}

#[cfg(feature = "opfs")]
#[test]
fn test_init_opfs_mounts_default() {
    let (temp, runtime) = setup_temp_runtime();

    runtime.init_opfs("").unwrap();
    runtime.init_opfs("/persistent").unwrap();

    assert!(temp.path().join("tree").join("persistent").is_dir());
    assert_eq!(runtime.opfs().mount_point().as_deref(), Some("/persistent"));
}

#[cfg(not(feature = "opfs"))]
#[test]
fn test_init_opfs_not_supported() {
    let (_temp, runtime) = setup_temp_runtime();
    assert_eq!(
        runtime.init_opfs("").unwrap_err().code(),
        ResultCode::NotSupported
    );
}

#[test]
fn test_unlink_through_default_kv_driver() {
    let (_temp, runtime) = setup_temp_runtime();
    runtime.kv().write("local", "journal", b"abc").unwrap();

    assert_eq!(runtime.drivers().default_driver().unwrap().name(), "kvvfs");
    assert_eq!(runtime.unlink("local-journal"), ResultCode::Success);
    assert_eq!(runtime.kv().get("local", "journal").unwrap(), None);
    assert_eq!(runtime.unlink(""), ResultCode::Misuse);
}

#[test]
fn test_unlink_after_unregistering_everything() {
    let (_temp, runtime) = setup_temp_runtime();

    assert!(runtime.drivers().unregister("kvvfs"));
    assert_eq!(runtime.drivers().default_driver().unwrap().name(), "opfs");
    assert!(runtime.drivers().unregister("opfs"));

    assert_eq!(runtime.unlink("/persistent/db"), ResultCode::Misuse);
}
