//! SMBus command descriptors
//!
//! A [`Command`] is the safe form of the kernel's `i2c_smbus_ioctl_data`:
//! the data pointer becomes a typed [`Payload`], and the size class is
//! derived from the payload variant instead of being set by hand.

use crate::block::{BlockBuffer, BlockError};

/// Transfer direction, as the `read_write` byte of the descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Direction {
    Write = 0,
    Read = 1,
}

impl Direction {
    /// Wire value
    pub const fn code(self) -> u8 {
        self as u8
    }
}

/// Transfer size class, as the `size` word of the descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u32)]
pub enum SizeClass {
    /// Single byte at a register
    ByteData = 2,
    /// 16-bit word at a register
    WordData = 3,
    /// SMBus block, count supplied by the device
    BlockData = 5,
    /// I2C block, count supplied by the caller
    I2cBlockData = 8,
}

impl SizeClass {
    /// Wire value
    pub const fn code(self) -> u32 {
        self as u32
    }
}

/// Data carried by a command
///
/// For reads the payload is the receive buffer: the transport overwrites
/// it with what the device returned.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Payload {
    Byte(u8),
    /// Native-endian word, handed to the kernel as-is
    Word(u16),
    /// SMBus block (size class 5)
    Block(BlockBuffer),
    /// I2C block (size class 8)
    I2cBlock(BlockBuffer),
}

impl Payload {
    /// Size class implied by this payload
    pub fn size_class(&self) -> SizeClass {
        match self {
            Payload::Byte(_) => SizeClass::ByteData,
            Payload::Word(_) => SizeClass::WordData,
            Payload::Block(_) => SizeClass::BlockData,
            Payload::I2cBlock(_) => SizeClass::I2cBlockData,
        }
    }
}

/// One SMBus transaction against the currently selected address
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Command {
    /// Read or write
    pub direction: Direction,
    /// Register (SMBus "command code")
    pub register: u8,
    /// Data to send, or buffer to receive into
    pub payload: Payload,
}

impl Command {
    /// Read a byte from `register`
    pub fn read_byte(register: u8) -> Self {
        Self {
            direction: Direction::Read,
            register,
            payload: Payload::Byte(0),
        }
    }

    /// Write `value` to `register`
    pub fn write_byte(register: u8, value: u8) -> Self {
        Self {
            direction: Direction::Write,
            register,
            payload: Payload::Byte(value),
        }
    }

    /// Read a word from `register`
    pub fn read_word(register: u8) -> Self {
        Self {
            direction: Direction::Read,
            register,
            payload: Payload::Word(0),
        }
    }

    /// Write a word to `register`
    pub fn write_word(register: u8, value: u16) -> Self {
        Self {
            direction: Direction::Write,
            register,
            payload: Payload::Word(value),
        }
    }

    /// Read `len` bytes from `register` as an I2C block
    pub fn read_i2c_block(register: u8, len: usize) -> Result<Self, BlockError> {
        Ok(Self {
            direction: Direction::Read,
            register,
            payload: Payload::I2cBlock(BlockBuffer::zeroed(len)?),
        })
    }

    /// Write `data` to `register` as an I2C block
    pub fn write_i2c_block(register: u8, data: &[u8]) -> Result<Self, BlockError> {
        Ok(Self {
            direction: Direction::Write,
            register,
            payload: Payload::I2cBlock(BlockBuffer::from_slice(data)?),
        })
    }

    /// Read an SMBus block from `register`; the device chooses the length
    pub fn read_block(register: u8) -> Self {
        Self {
            direction: Direction::Read,
            register,
            payload: Payload::Block(BlockBuffer::new()),
        }
    }

    /// Write `data` to `register` as an SMBus block
    pub fn write_block(register: u8, data: &[u8]) -> Result<Self, BlockError> {
        Ok(Self {
            direction: Direction::Write,
            register,
            payload: Payload::Block(BlockBuffer::from_slice(data)?),
        })
    }

    /// Size class of this command
    pub fn size_class(&self) -> SizeClass {
        self.payload.size_class()
    }

    /// Byte read back by a byte-data read
    pub fn byte(&self) -> Option<u8> {
        match self.payload {
            Payload::Byte(v) => Some(v),
            _ => None,
        }
    }

    /// Word read back by a word-data read
    pub fn word(&self) -> Option<u16> {
        match self.payload {
            Payload::Word(v) => Some(v),
            _ => None,
        }
    }

    /// Block read back by either block read
    pub fn block(&self) -> Option<&BlockBuffer> {
        match &self.payload {
            Payload::Block(b) | Payload::I2cBlock(b) => Some(b),
            _ => None,
        }
    }
}
