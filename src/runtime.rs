//! Runtime Module
//!
//! The explicit context that owns every backend and the driver registry.
//!
//! ## Responsibilities
//! - Open the host maps and the virtual tree under the data directory
//! - Build the key/value backend and the hierarchical backend
//! - Register the drivers, with the key/value driver as default
//! - Route the engine's per-event calls (enable tree, delete file)

use std::fs;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::config::Config;
use crate::error::{Result, ResultCode};
use crate::host::{DirFileSystem, FileStorage, MemoryStorage};
use crate::keycodec::KeyCodec;
use crate::kv::KvBackend;
use crate::opfs::OpfsBackend;
use crate::vfs::{self, DirDriver, DriverRegistry, KvDriver};

/// Outcome of [`Runtime::smoke`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmokeReport {
    /// What `read` returned for the value just written
    pub read: isize,
    /// The text it copied out
    pub value: String,
    /// Whether the key was gone after the delete
    pub deleted: bool,
}

/// Owns the storage stack for one embedding
pub struct Runtime {
    config: Config,
    kv: Arc<KvBackend>,
    tree: Arc<DirFileSystem>,
    opfs: OpfsBackend,
    drivers: DriverRegistry,
}

impl Runtime {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    const PERSISTENT_FILENAME: &'static str = "local.kv";
    const TREE_DIR: &'static str = "tree";

    /// Open or create a runtime with the given config
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        fs::create_dir_all(&config.data_dir)?;

        let session = MemoryStorage::with_quota(config.session_quota);
        let persistent = FileStorage::open(
            config.data_dir.join(Self::PERSISTENT_FILENAME),
            config.persistent_quota,
        )?;

        let codec = KeyCodec::new(config.key_prefix.clone(), config.key_capacity);
        let kv = Arc::new(KvBackend::new(
            codec,
            Arc::new(session),
            Arc::new(persistent),
            config.scratch_capacity,
        ));

        let tree = Arc::new(DirFileSystem::new(config.data_dir.join(Self::TREE_DIR)));
        let opfs = OpfsBackend::new(tree.clone(), config.default_mount_point.clone());

        let drivers = DriverRegistry::new();
        drivers.register(Arc::new(KvDriver::new(Arc::clone(&kv))), true);
        drivers.register(Arc::new(DirDriver::new(Arc::clone(&tree))), false);

        info!(data_dir = %config.data_dir.display(), "runtime opened");

        Ok(Self {
            config,
            kv,
            tree,
            opfs,
            drivers,
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().data_dir(path).build())
    }

    /// Enable the hierarchical backend, mounted at `mount_point`
    pub fn init_opfs(&self, mount_point: &str) -> Result<()> {
        self.opfs.init(mount_point)
    }

    /// Delete `path` through the default driver
    pub fn unlink(&self, path: &str) -> ResultCode {
        vfs::unlink(&self.drivers, path)
    }

    /// Write, read back and delete a session value
    pub fn smoke(&self) -> Result<SmokeReport> {
        const CLASS: &str = "session";
        const KEY: &str = "hello";

        self.kv.write(CLASS, KEY, b"world")?;

        let mut buffer = [0u8; 128];
        let read = self.kv.read(CLASS, KEY, &mut buffer);
        let copied = usize::try_from(read).unwrap_or(0);
        let value = String::from_utf8_lossy(&buffer[..copied]).into_owned();
        info!(read, value = %value, "smoke read");

        self.kv.delete(CLASS, KEY)?;
        let deleted = self.kv.get(CLASS, KEY)?.is_none();

        Ok(SmokeReport {
            read,
            value,
            deleted,
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn kv(&self) -> &KvBackend {
        &self.kv
    }

    pub fn opfs(&self) -> &OpfsBackend {
        &self.opfs
    }

    pub fn drivers(&self) -> &DriverRegistry {
        &self.drivers
    }

    /// The directory tree the hierarchical backend mounts into
    pub fn tree(&self) -> &DirFileSystem {
        &self.tree
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
