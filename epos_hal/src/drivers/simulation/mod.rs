//! Simulation backend.
//!
//! This module provides a software vendor library for development and
//! testing without physical controllers. All simulated nodes live on a
//! shared [`SimulationBus`] that records every call and supports missing
//! nodes, pending faults and per-call failure injection.

mod bus;
mod calls;
mod driver;
mod node;

pub use bus::{
    CALL_LOG_CAPACITY, ERROR_BAD_FAULT_INDEX, ERROR_NODE_CLOSED, ERROR_NODE_DISABLED,
    NodeSnapshot, SimulationBus,
};
pub use calls::{Operation, VendorCall};
pub use driver::{DEFAULT_INJECTED_ERROR, SimulationLibrary};
pub use node::SimulatedNode;

use epos_common::hal::driver::EposLibrary;

/// Factory function to create a simulation library instance.
pub fn create_library() -> Box<dyn EposLibrary> {
    Box::new(SimulationLibrary::new())
}
