//! Delete-by-path through the default driver

use tracing::debug;

use crate::error::ResultCode;

use super::{DeleteOptions, DriverRegistry};

/// Delete `path` using the registry's default driver.
///
/// Misuse when there is no default driver, `path` is empty, or the driver
/// cannot delete. Otherwise the driver's own result is returned untouched.
pub fn unlink(registry: &DriverRegistry, path: &str) -> ResultCode {
    let Some(driver) = registry.default_driver() else {
        debug!(path, "unlink with no default driver");
        return ResultCode::Misuse;
    };
    if path.is_empty() {
        return ResultCode::Misuse;
    }
    let Some(deleter) = driver.deleter() else {
        debug!(driver = driver.name(), "default driver cannot delete");
        return ResultCode::Misuse;
    };

    let options = DeleteOptions {
        sync_dir: true,
        missing_ok: true,
    };
    let rc = deleter.delete(path, options);
    debug!(driver = driver.name(), path, rc = rc.as_i32(), "unlink");
    rc
}
