//! Connection error types

use core::fmt;

use smbusdev_protocol::{BlockError, BLOCK_MAX};

/// Adapter operation that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Operation {
    /// Opening the bus device
    Open,
    /// Selecting the slave address
    SelectAddress,
    /// SMBus transfer
    Transfer,
    /// Functionality query
    Functionality,
    /// Raw read
    Read,
    /// Raw write
    Write,
    /// Releasing the handle
    Close,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Open => "open",
            Operation::SelectAddress => "select address",
            Operation::Transfer => "smbus transfer",
            Operation::Functionality => "functionality query",
            Operation::Read => "read",
            Operation::Write => "write",
            Operation::Close => "close",
        };
        f.write_str(name)
    }
}

/// Invalid open parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Register backup requested without an address bound at open
    BackupWithoutAddress,
    /// Address outside the 7-bit range
    InvalidAddress(u8),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::BackupWithoutAddress => {
                f.write_str("register backup requires an address bound at open")
            }
            ConfigError::InvalidAddress(addr) => {
                write!(f, "address {:#04x} is not a 7-bit address", addr)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

/// Errors returned by [`Connection`](crate::Connection)
///
/// `E` is the adapter's error type; transport failures carry it unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Invalid open parameters
    Config(ConfigError),
    /// Block payload over BLOCK_MAX, rejected before any I/O
    BlockTooLarge { len: usize },
    /// Block length byte on the wire exceeds BLOCK_MAX
    InvalidBlockLength { len: u8 },
    /// Device returned fewer block bytes than requested
    ShortBlock { requested: usize, received: usize },
    /// Adapter call failed
    Transport { op: Operation, source: E },
}

impl<E> Error<E> {
    /// Build a mapper for adapter results
    pub(crate) fn transport(op: Operation) -> impl FnOnce(E) -> Self {
        move |source| Error::Transport { op, source }
    }

    /// Adapter error, if this is a transport failure
    pub fn source_error(&self) -> Option<&E> {
        match self {
            Error::Transport { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl<E> From<ConfigError> for Error<E> {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl<E> From<BlockError> for Error<E> {
    fn from(e: BlockError) -> Self {
        match e {
            BlockError::TooLarge { len } => Error::BlockTooLarge { len },
            BlockError::InvalidLength(len) => Error::InvalidBlockLength { len },
        }
    }
}

impl<E: fmt::Display> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "{}", e),
            Error::BlockTooLarge { len } => {
                write!(f, "block of {} bytes exceeds {} bytes", len, BLOCK_MAX)
            }
            Error::InvalidBlockLength { len } => {
                write!(f, "invalid block length {} on the wire", len)
            }
            Error::ShortBlock {
                requested,
                received,
            } => write!(
                f,
                "device returned {} of {} requested block bytes",
                received, requested
            ),
            Error::Transport { op, source } => write!(f, "{} failed: {}", op, source),
        }
    }
}

#[cfg(feature = "std")]
impl<E> std::error::Error for Error<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Transport { source, .. } => Some(source),
            _ => None,
        }
    }
}
