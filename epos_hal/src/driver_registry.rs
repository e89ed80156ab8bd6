//! Registry of vendor library backends.
//!
//! Provides a `DriverRegistry` struct for registering and retrieving
//! `EposLibrary` factories by name. The registry is built at startup and
//! passed to `HalCore` by value.

use crate::drivers;
use epos_common::hal::driver::{EposLibrary, HalError, LibraryFactory};
use std::collections::HashMap;

/// Registry of available vendor library backends.
pub struct DriverRegistry {
    factories: HashMap<&'static str, LibraryFactory>,
}

impl DriverRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Create a registry holding every built-in backend.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        drivers::register_builtin(&mut registry);
        registry
    }

    /// Register a library factory.
    ///
    /// # Panics
    /// Panics if a backend with the same name is already registered.
    pub fn register(&mut self, name: &'static str, factory: LibraryFactory) {
        if self.factories.contains_key(name) {
            panic!("Library '{name}' is already registered");
        }
        self.factories.insert(name, factory);
    }

    /// Get a library factory by name.
    pub fn get_factory(&self, name: &str) -> Option<LibraryFactory> {
        self.factories.get(name).copied()
    }

    /// Create a library instance by name.
    ///
    /// # Errors
    /// Returns `HalError::DriverNotFound` if no backend with the given name is registered.
    pub fn create_library(&self, name: &str) -> Result<Box<dyn EposLibrary>, HalError> {
        let factory = self
            .get_factory(name)
            .ok_or_else(|| HalError::DriverNotFound(name.to_string()))?;
        Ok(factory())
    }

    /// List all registered backend names, sorted.
    pub fn list_libraries(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use epos_common::hal::config::{DeviceConfig, FleetConfig};
    use epos_common::hal::driver::{EposNode, OpenError};
    use epos_common::hal::types::SerialNumber;

    struct TestLibrary;

    impl EposLibrary for TestLibrary {
        fn name(&self) -> &'static str {
            "test"
        }

        fn version(&self) -> &'static str {
            "0.1.0"
        }

        fn init(&mut self, _config: &FleetConfig) -> Result<(), HalError> {
            Ok(())
        }

        fn open_node(
            &mut self,
            _device: &DeviceConfig,
            _serial: SerialNumber,
        ) -> Result<Box<dyn EposNode>, OpenError> {
            Err(OpenError::NotFound)
        }
    }

    fn create_test_library() -> Box<dyn EposLibrary> {
        Box::new(TestLibrary)
    }

    #[test]
    fn registry_register_and_create() {
        let mut reg = DriverRegistry::new();
        reg.register("test_library", create_test_library);

        let library = reg.create_library("test_library").expect("should create");
        assert_eq!(library.name(), "test");
    }

    #[test]
    fn registry_library_not_found() {
        let reg = DriverRegistry::new();
        let result = reg.create_library("epos_cmd");
        assert!(matches!(result, Err(HalError::DriverNotFound(_))));
    }

    #[test]
    fn registry_builtin_has_simulation() {
        let reg = DriverRegistry::with_builtin();
        assert_eq!(reg.list_libraries(), vec!["simulation"]);
        let library = reg.create_library("simulation").unwrap();
        assert_eq!(library.name(), "simulation");
    }

    #[test]
    fn registry_list_sorted() {
        let mut reg = DriverRegistry::new();
        reg.register("beta", create_test_library);
        reg.register("alpha", create_test_library);
        assert_eq!(reg.list_libraries(), vec!["alpha", "beta"]);
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn registry_duplicate_panics() {
        let mut reg = DriverRegistry::new();
        reg.register("dup", create_test_library);
        reg.register("dup", create_test_library);
    }
}
