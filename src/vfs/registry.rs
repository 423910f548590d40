//! Driver registry
//!
//! Owned explicitly by whoever embeds the engine (see
//! [`Runtime`](crate::Runtime)) rather than living in a global.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use super::StorageDriver;

#[derive(Default)]
struct Drivers {
    /// Registration order; the default is tracked separately
    list: Vec<Arc<dyn StorageDriver>>,
    default: Option<Arc<dyn StorageDriver>>,
}

/// Registered drivers plus the current default
#[derive(Default)]
pub struct DriverRegistry {
    drivers: RwLock<Drivers>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `driver`, replacing any driver with the same name.
    ///
    /// It becomes the default when `make_default` is set or when no default
    /// exists yet.
    pub fn register(&self, driver: Arc<dyn StorageDriver>, make_default: bool) {
        let mut drivers = self.drivers.write();
        let name = driver.name().to_string();

        let replaced_default = drivers
            .default
            .as_ref()
            .is_some_and(|d| d.name() == name);
        drivers.list.retain(|d| d.name() != name);
        drivers.list.push(Arc::clone(&driver));

        if make_default || replaced_default || drivers.default.is_none() {
            debug!(driver = %name, "registered as default driver");
            drivers.default = Some(driver);
        } else {
            debug!(driver = %name, "registered driver");
        }
    }

    /// Remove the driver called `name`. Returns whether it was registered.
    ///
    /// If it was the default, the earliest remaining registration becomes
    /// the default.
    pub fn unregister(&self, name: &str) -> bool {
        let mut drivers = self.drivers.write();
        let before = drivers.list.len();
        drivers.list.retain(|d| d.name() != name);
        if drivers.list.len() == before {
            return false;
        }

        if drivers.default.as_ref().is_some_and(|d| d.name() == name) {
            drivers.default = drivers.list.first().cloned();
        }
        true
    }

    /// Look a driver up by name; `None` asks for the default
    pub fn find(&self, name: Option<&str>) -> Option<Arc<dyn StorageDriver>> {
        let drivers = self.drivers.read();
        match name {
            None => drivers.default.clone(),
            Some(name) => drivers.list.iter().find(|d| d.name() == name).cloned(),
        }
    }

    pub fn default_driver(&self) -> Option<Arc<dyn StorageDriver>> {
        self.find(None)
    }

    /// Names in registration order
    pub fn names(&self) -> Vec<String> {
        self.drivers
            .read()
            .list
            .iter()
            .map(|d| d.name().to_string())
            .collect()
    }
}
