//! Register backup and restore
//!
//! A backup is taken from one device address when the connection opens
//! and written back, in capture order, when it closes.

use heapless::Vec;
use log::debug;
use smbusdev_hal::SmbusAdapter;

use crate::connection::Connection;
use crate::error::Error;
use crate::options::MAX_BACKUP_REGISTERS;

/// Register values captured from a single device
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterBackup {
    address: u8,
    entries: Vec<(u8, u8), MAX_BACKUP_REGISTERS>,
}

impl RegisterBackup {
    /// Read every register in `registers` from the device at `address`
    ///
    /// One byte-data read per distinct register, in the given order. The
    /// first failing read aborts the capture.
    pub fn capture<A: SmbusAdapter>(
        conn: &mut Connection<A>,
        address: u8,
        registers: &[u8],
    ) -> Result<Self, Error<A::Error>> {
        let mut entries: Vec<(u8, u8), MAX_BACKUP_REGISTERS> = Vec::new();

        for &reg in registers {
            if entries.iter().any(|&(r, _)| r == reg) {
                continue;
            }
            let value = conn.read_reg(address, reg)?;
            // At most one entry per u8 register
            let _ = entries.push((reg, value));
        }

        debug!(
            "backed up {} registers of device {:#04x}",
            entries.len(),
            address
        );
        Ok(Self { address, entries })
    }

    /// Write every captured value back, in capture order
    ///
    /// Stops at the first failing write.
    pub fn restore<A: SmbusAdapter>(&self, conn: &mut Connection<A>) -> Result<(), Error<A::Error>> {
        for &(reg, value) in &self.entries {
            conn.write_reg(self.address, reg, value)?;
        }
        debug!(
            "restored {} registers of device {:#04x}",
            self.entries.len(),
            self.address
        );
        Ok(())
    }

    /// Device address the backup was taken from
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Captured `(register, value)` pairs in capture order
    pub fn entries(&self) -> &[(u8, u8)] {
        &self.entries
    }

    /// Captured value of `register`
    pub fn value(&self, register: u8) -> Option<u8> {
        self.entries
            .iter()
            .find(|&&(r, _)| r == register)
            .map(|&(_, v)| v)
    }

    /// Number of captured registers
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was captured
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
