//! Block payloads and their kernel wire format.
//!
//! Wire format (the `block` member of the kernel's `i2c_smbus_data` union):
//! - LENGTH (1 byte): payload length (0-32)
//! - PAYLOAD (0-32 bytes)
//! - one spare byte the kernel reserves for PEC

use core::ops::Deref;

use heapless::Vec;

/// Maximum block payload defined by SMBus
pub const BLOCK_MAX: usize = 32;

/// Size of the kernel block data area (LENGTH + BLOCK_MAX + PEC)
pub const BLOCK_WIRE_LEN: usize = BLOCK_MAX + 2;

/// Errors that can occur when building or decoding a block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BlockError {
    /// Payload exceeds BLOCK_MAX
    TooLarge { len: usize },
    /// Length byte on the wire exceeds BLOCK_MAX
    InvalidLength(u8),
}

impl core::fmt::Display for BlockError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            BlockError::TooLarge { len } => {
                write!(f, "block of {} bytes exceeds the {} byte limit", len, BLOCK_MAX)
            }
            BlockError::InvalidLength(len) => write!(f, "invalid block length byte {}", len),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for BlockError {}

/// An SMBus block payload of at most 32 bytes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockBuffer {
    data: Vec<u8, BLOCK_MAX>,
}

impl BlockBuffer {
    /// Create an empty block
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Create a block holding a copy of `data`
    pub fn from_slice(data: &[u8]) -> Result<Self, BlockError> {
        let mut vec = Vec::new();
        vec.extend_from_slice(data)
            .map_err(|_| BlockError::TooLarge { len: data.len() })?;
        Ok(Self { data: vec })
    }

    /// Create a block of `len` zero bytes, used to request a read of that size
    pub fn zeroed(len: usize) -> Result<Self, BlockError> {
        let mut vec = Vec::new();
        vec.resize(len, 0)
            .map_err(|_| BlockError::TooLarge { len })?;
        Ok(Self { data: vec })
    }

    /// Payload bytes
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Encode into the kernel data area
    ///
    /// Bytes past the payload are zeroed.
    pub fn encode(&self, wire: &mut [u8; BLOCK_WIRE_LEN]) {
        wire.fill(0);
        wire[0] = self.data.len() as u8;
        wire[1..1 + self.data.len()].copy_from_slice(&self.data);
    }

    /// Encode into a fresh kernel data area
    pub fn to_wire(&self) -> [u8; BLOCK_WIRE_LEN] {
        let mut wire = [0u8; BLOCK_WIRE_LEN];
        self.encode(&mut wire);
        wire
    }

    /// Decode a block from the kernel data area
    ///
    /// The length byte is the count reported by the device (or by the
    /// kernel for I2C block reads).
    pub fn decode(wire: &[u8; BLOCK_WIRE_LEN]) -> Result<Self, BlockError> {
        let len = wire[0];
        if len as usize > BLOCK_MAX {
            return Err(BlockError::InvalidLength(len));
        }
        Self::from_slice(&wire[1..1 + len as usize])
    }
}

impl Deref for BlockBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for BlockBuffer {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "BlockBuffer({=[u8]:x})", self.as_slice())
    }
}
