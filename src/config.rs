//! Configuration for hostkv
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{HostKvError, Result};
use crate::keycodec::{KeyCodec, DEFAULT_KEY_CAPACITY, DEFAULT_KEY_PREFIX};
use crate::opfs::{validate_mount_point, DEFAULT_MOUNT_POINT};

/// Main configuration for a hostkv runtime
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for everything the host keeps on disk
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── local.kv         (persistent-scoped map snapshot)
    ///     └── tree/            (virtual tree for the hierarchical backend)
    pub data_dir: PathBuf,

    /// Byte quota for the session-scoped map (None = unlimited)
    pub session_quota: Option<usize>,

    /// Byte quota for the persistent-scoped map (None = unlimited)
    pub persistent_quota: Option<usize>,

    // -------------------------------------------------------------------------
    // Key Configuration
    // -------------------------------------------------------------------------
    /// Literal prefix of every storage key
    pub key_prefix: String,

    /// Storage key capacity in bytes, terminator included
    pub key_capacity: usize,

    /// Size of the scratch region derived keys are built in
    pub scratch_capacity: usize,

    // -------------------------------------------------------------------------
    // Hierarchical Backend Configuration
    // -------------------------------------------------------------------------
    /// Mount point used when `init` is handed an empty path
    pub default_mount_point: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./hostkv_data"),
            session_quota: None,
            persistent_quota: None,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            key_capacity: DEFAULT_KEY_CAPACITY,
            scratch_capacity: 64 * 1024, // 64 KB
            default_mount_point: DEFAULT_MOUNT_POINT.to_string(),
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject values the runtime cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.key_prefix.is_empty() || !self.key_prefix.is_ascii() {
            return Err(HostKvError::Config(format!(
                "key prefix must be non-empty ASCII, got {:?}",
                self.key_prefix
            )));
        }

        // Prefix, one separator and the terminator must always fit.
        let minimum = KeyCodec::min_capacity(&self.key_prefix);
        if self.key_capacity < minimum {
            return Err(HostKvError::Config(format!(
                "key capacity {} cannot hold prefix {:?} (need at least {})",
                self.key_capacity, self.key_prefix, minimum
            )));
        }

        validate_mount_point(&self.default_mount_point)
            .map_err(|e| HostKvError::Config(format!("default mount point: {}", e)))?;

        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all storage)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the session map quota (in bytes)
    pub fn session_quota(mut self, bytes: usize) -> Self {
        self.config.session_quota = Some(bytes);
        self
    }

    /// Set the persistent map quota (in bytes)
    pub fn persistent_quota(mut self, bytes: usize) -> Self {
        self.config.persistent_quota = Some(bytes);
        self
    }

    /// Set the storage key prefix
    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.key_prefix = prefix.into();
        self
    }

    /// Set the storage key capacity (terminator included)
    pub fn key_capacity(mut self, capacity: usize) -> Self {
        self.config.key_capacity = capacity;
        self
    }

    /// Set the scratch region size (in bytes)
    pub fn scratch_capacity(mut self, bytes: usize) -> Self {
        self.config.scratch_capacity = bytes;
        self
    }

    /// Set the default mount point for the hierarchical backend
    pub fn default_mount_point(mut self, path: impl Into<String>) -> Self {
        self.config.default_mount_point = path.into();
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
