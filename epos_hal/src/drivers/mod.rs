//! Vendor library backends.
//!
//! - [`simulation`] - Software simulation backend for development and testing
//!
//! # Adding New Backends
//!
//! 1. Create a new submodule under `drivers/`
//! 2. Implement `EposLibrary` and `EposNode` from `epos_common::hal::driver`
//! 3. Register the factory in [`register_builtin`]

pub mod simulation;

use crate::driver_registry::DriverRegistry;

/// Register all built-in backends.
pub fn register_builtin(registry: &mut DriverRegistry) {
    registry.register("simulation", simulation::create_library);
}
