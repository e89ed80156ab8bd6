//! EPOS Common Library
//!
//! This crate provides the configuration tree, device-native parameter
//! types and vendor library traits shared by the EPOS fleet HAL and its
//! backends.
//!
//! # Module Structure
//!
//! - [`config`] - Configuration loading traits and errors
//! - [`consts`] - System-wide limits and default paths
//! - [`hal`] - Fleet configuration, vendor library traits and device types
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use epos_common::prelude::*;
//!
//! let serial: SerialNumber = "602F3AC1".parse().unwrap();
//! assert_eq!(serial.to_string(), "602F3AC1");
//! ```

pub mod config;
pub mod consts;
pub mod hal;
pub mod prelude;
