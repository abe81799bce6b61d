//! Open options

use heapless::Vec;

/// One slot per possible register
pub const MAX_BACKUP_REGISTERS: usize = 256;

/// Options applied when opening a connection
///
/// Built once and passed by reference to the open call; the connection
/// copies what it needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Options {
    force: bool,
    backup_registers: Vec<u8, MAX_BACKUP_REGISTERS>,
}

impl Options {
    /// Unforced addressing, no backup
    pub fn new() -> Self {
        Self::default()
    }

    /// Use forced addressing, taking addresses already claimed by a kernel driver
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Registers to read at open and write back at close
    ///
    /// Order is kept; repeated registers are backed up once.
    pub fn with_backup_registers(mut self, registers: &[u8]) -> Self {
        for &reg in registers {
            if !self.backup_registers.contains(&reg) {
                // Distinct u8 values never exceed the capacity
                let _ = self.backup_registers.push(reg);
            }
        }
        self
    }

    /// Forced addressing enabled
    pub fn force(&self) -> bool {
        self.force
    }

    /// Registers to back up, in capture order
    pub fn backup_registers(&self) -> &[u8] {
        &self.backup_registers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = Options::new();
        assert!(!opts.force());
        assert!(opts.backup_registers().is_empty());
    }

    #[test]
    fn test_backup_registers_keep_order_and_dedupe() {
        let opts = Options::new().with_backup_registers(&[0x30, 0x10, 0x30, 0x20, 0x10]);
        assert_eq!(opts.backup_registers(), &[0x30, 0x10, 0x20]);
    }

    #[test]
    fn test_every_register_fits() {
        let all: std::vec::Vec<u8> = (0..=255u8).chain(0..=255u8).collect();
        let opts = Options::new().with_backup_registers(&all);
        assert_eq!(opts.backup_registers().len(), MAX_BACKUP_REGISTERS);
    }
}
