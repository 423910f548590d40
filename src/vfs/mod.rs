//! Storage Driver Module
//!
//! Drivers are the file-level storage backends the database engine can use.
//! A [`DriverRegistry`] owns them and tracks which one is the default.
//!
//! ## Responsibilities
//! - Driver registration, lookup and default selection
//! - Optional capabilities: a driver may or may not be able to delete
//! - [`unlink`]: delete a path through the default driver
//!
//! ## Drivers
//! - [`KvDriver`]: files kept in the key/value backend
//! - [`DirDriver`]: files kept below the hierarchical backend's tree

mod dir;
mod kvdriver;
mod registry;
mod unlink;

use crate::error::ResultCode;

pub use dir::DirDriver;
pub use kvdriver::KvDriver;
pub use registry::DriverRegistry;
pub use unlink::unlink;

/// How a delete should behave
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteOptions {
    /// Make the removal durable in the containing directory before returning
    pub sync_dir: bool,
    /// A missing target counts as success
    pub missing_ok: bool,
}

/// Delete capability of a driver
pub trait Delete {
    fn delete(&self, path: &str, options: DeleteOptions) -> ResultCode;
}

/// A storage driver the engine can open files through
pub trait StorageDriver: Send + Sync {
    /// Registry name, unique per registry
    fn name(&self) -> &str;

    /// The driver's delete capability, if it has one
    fn deleter(&self) -> Option<&dyn Delete> {
        None
    }
}
