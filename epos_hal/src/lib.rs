//! # EPOS HAL Library
//!
//! Fleet-level hardware abstraction for EPOS motor controllers with a
//! pluggable vendor library backend.
//!
//! Backends implement the `EposLibrary` and `EposNode` traits defined in
//! `epos_common::hal::driver`.
//!
//! # Module Structure
//!
//! - [`identity`] - Axis name, serial number and operation mode resolution
//! - [`params`] - Configuration to device-unit parameter translation
//! - [`session`] - Ownership of one open node handle
//! - [`sequencer`] - Ordered per-axis initialization
//! - [`axis`] - Per-axis state and cyclic I/O
//! - [`fleet`] - Fleet construction, initialization and I/O fan-out
//! - [`core`] - HalCore struct, cyclic loop management
//! - [`driver_registry`] - Library factory registration
//! - [`drivers`] - Vendor library backends
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                     epos_hal (single crate)                      │
//! │  ┌─────────────┐    ┌──────────────┐    ┌─────────────────────┐  │
//! │  │ fleet.toml  │───►│  HalCore     │◄──►│  Driver Registry    │  │
//! │  │(epos_common)│    │ (cyclic loop)│    │                     │  │
//! │  └─────────────┘    └──────┬───────┘    └─────────────────────┘  │
//! │                            │                                     │
//! │                            ▼                                     │
//! │                   ┌────────────────┐     ┌────────────────┐      │
//! │                   │  Fleet         │────►│  EposLibrary   │      │
//! │                   │  Axis × N      │     │  (trait object)│      │
//! │                   └───────┬────────┘     └────────────────┘      │
//! │                           ▼                                      │
//! │                   ┌────────────────┐                             │
//! │                   │ DeviceSession  │ owns Box<dyn EposNode>      │
//! │                   └────────────────┘                             │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

#![deny(warnings)]
#![deny(missing_docs)]

pub mod axis;
pub mod core;
pub mod driver_registry;
pub mod drivers;
pub mod fleet;
pub mod identity;
pub mod params;
pub mod sequencer;
pub mod session;

// Re-export key types for convenience
pub use crate::axis::{Axis, AxisDiagnostics, Command};
pub use crate::core::HalCore;
pub use crate::driver_registry::DriverRegistry;
pub use crate::fleet::{AxisFailure, AxisStatus, Fleet, InitReport, RejectedAxis};
pub use crate::sequencer::AxisState;
