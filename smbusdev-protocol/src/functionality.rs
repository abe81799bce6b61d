//! Adapter functionality mask returned by `I2C_FUNCS`

use bitflags::bitflags;

use crate::command::{Direction, SizeClass};

bitflags! {
    /// Transfers an adapter supports, from `<linux/i2c.h>`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Functionality: u32 {
        const I2C = 0x0000_0001;
        const TEN_BIT_ADDR = 0x0000_0002;
        const PROTOCOL_MANGLING = 0x0000_0004;
        const SMBUS_PEC = 0x0000_0008;
        const NOSTART = 0x0000_0010;
        const SLAVE = 0x0000_0020;
        const SMBUS_BLOCK_PROC_CALL = 0x0000_8000;
        const SMBUS_QUICK = 0x0001_0000;
        const SMBUS_READ_BYTE = 0x0002_0000;
        const SMBUS_WRITE_BYTE = 0x0004_0000;
        const SMBUS_READ_BYTE_DATA = 0x0008_0000;
        const SMBUS_WRITE_BYTE_DATA = 0x0010_0000;
        const SMBUS_READ_WORD_DATA = 0x0020_0000;
        const SMBUS_WRITE_WORD_DATA = 0x0040_0000;
        const SMBUS_PROC_CALL = 0x0080_0000;
        const SMBUS_READ_BLOCK_DATA = 0x0100_0000;
        const SMBUS_WRITE_BLOCK_DATA = 0x0200_0000;
        const SMBUS_READ_I2C_BLOCK = 0x0400_0000;
        const SMBUS_WRITE_I2C_BLOCK = 0x0800_0000;
        const SMBUS_HOST_NOTIFY = 0x1000_0000;
    }
}

impl Functionality {
    /// Flag the adapter must report to carry a transfer of this shape
    pub fn required_for(direction: Direction, size: SizeClass) -> Self {
        match (direction, size) {
            (Direction::Read, SizeClass::ByteData) => Self::SMBUS_READ_BYTE_DATA,
            (Direction::Write, SizeClass::ByteData) => Self::SMBUS_WRITE_BYTE_DATA,
            (Direction::Read, SizeClass::WordData) => Self::SMBUS_READ_WORD_DATA,
            (Direction::Write, SizeClass::WordData) => Self::SMBUS_WRITE_WORD_DATA,
            (Direction::Read, SizeClass::BlockData) => Self::SMBUS_READ_BLOCK_DATA,
            (Direction::Write, SizeClass::BlockData) => Self::SMBUS_WRITE_BLOCK_DATA,
            (Direction::Read, SizeClass::I2cBlockData) => Self::SMBUS_READ_I2C_BLOCK,
            (Direction::Write, SizeClass::I2cBlockData) => Self::SMBUS_WRITE_I2C_BLOCK,
        }
    }

    /// Whether a transfer of this shape is supported
    pub fn supports(&self, direction: Direction, size: SizeClass) -> bool {
        self.contains(Self::required_for(direction, size))
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Functionality {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Functionality({=u32:#x})", self.bits())
    }
}
