//! Driver registry for selecting a driver by name

use drivermatrix_core::{DocumentDriver, HarnessError, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of available drivers
pub struct DriverRegistry {
    drivers: HashMap<String, Arc<dyn DocumentDriver>>,
}

impl DriverRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            drivers: HashMap::new(),
        }
    }

    /// Create a registry with all built-in drivers registered
    pub fn with_defaults() -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::new();

        #[cfg(feature = "mongodb")]
        registry.register(Arc::new(crate::mongodb::MongoDbDriver::new()));

        registry
    }

    /// Register a driver, replacing any driver with the same name
    pub fn register(&mut self, driver: Arc<dyn DocumentDriver>) {
        let name = driver.name().to_string();
        tracing::debug!(driver = %name, "registering driver");
        self.drivers.insert(name, driver);
    }

    /// Get a driver by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn DocumentDriver>> {
        let driver = self.drivers.get(name).cloned();
        if driver.is_none() {
            tracing::warn!(driver = %name, "driver not found in registry");
        }
        driver
    }

    /// Get a driver by name, or a configuration error naming the
    /// registered drivers
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn DocumentDriver>> {
        self.get(name).ok_or_else(|| {
            let known = self.list();
            let known = if known.is_empty() {
                "none".to_string()
            } else {
                known.join(", ")
            };
            HarnessError::Configuration(format!(
                "unknown driver '{}' (registered: {})",
                name, known
            ))
        })
    }

    /// List all registered driver names, sorted
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.drivers.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Check if a driver is registered
    pub fn has(&self, name: &str) -> bool {
        self.drivers.contains_key(name)
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
