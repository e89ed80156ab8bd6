//! Hardware abstraction layer types for EPOS motor controllers.
//!
//! - [`config`] - Fleet and per-axis configuration tree
//! - [`consts`] - Device defaults and unit factors
//! - [`driver`] - Vendor library traits and error types
//! - [`types`] - Device-native parameter and telemetry types

pub mod config;
pub mod consts;
pub mod driver;
pub mod types;
