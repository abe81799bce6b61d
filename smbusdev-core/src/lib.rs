//! Platform-agnostic SMBus connection logic
//!
//! This crate contains everything that does not depend on a specific
//! operating system interface:
//!
//! - [`Connection`], the transaction API over any [`SmbusAdapter`]
//! - [`Options`] for forced addressing and register backup
//! - [`RegisterBackup`], capture at open and restore at close
//! - [`DeviceConfig`], the serde-friendly form of the open parameters
//!
//! [`SmbusAdapter`]: smbusdev_hal::SmbusAdapter

#![no_std]
#![deny(unsafe_code)]

#[cfg(any(test, feature = "std"))]
#[macro_use]
extern crate std;

pub mod backup;
pub mod config;
pub mod connection;
pub mod error;
pub mod options;

pub use backup::RegisterBackup;
pub use config::DeviceConfig;
pub use connection::Connection;
pub use error::{ConfigError, Error, Operation};
pub use options::{Options, MAX_BACKUP_REGISTERS};
