//! Device configuration
//!
//! The open parameters of one device in a form that can be stored in a
//! configuration file and checked before any bus access.

use heapless::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::options::{Options, MAX_BACKUP_REGISTERS};

/// Highest 7-bit slave address
pub const MAX_ADDRESS: u8 = 0x7F;

/// Where and how to open a connection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DeviceConfig {
    /// Adapter number, as in `/dev/i2c-<bus>`
    pub bus: u32,
    /// Device address bound at open (optional)
    pub address: Option<u8>,
    /// Forced addressing
    pub force: bool,
    /// Registers backed up at open and restored at close
    pub backup_registers: Vec<u8, MAX_BACKUP_REGISTERS>,
}

impl DeviceConfig {
    /// Check the configuration and build open options from it
    pub fn options(&self) -> Result<Options, ConfigError> {
        match self.address {
            Some(addr) if addr > MAX_ADDRESS => return Err(ConfigError::InvalidAddress(addr)),
            None if !self.backup_registers.is_empty() => {
                return Err(ConfigError::BackupWithoutAddress)
            }
            _ => {}
        }

        Ok(Options::new()
            .with_force(self.force)
            .with_backup_registers(&self.backup_registers))
    }
}
