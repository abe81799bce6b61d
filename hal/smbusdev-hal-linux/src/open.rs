//! Open calls for i2c-dev buses
//!
//! `open` and `open_file` are the option-less forms of
//! `open_with_options` and `open_file_with_options`; all four produce the
//! same [`Connection`] type.

use std::io;

use smbusdev_core::{ConfigError, Connection, Error, Operation, Options};

use crate::adapter::LinuxAdapter;

/// Connection over a Linux i2c-dev adapter
pub type LinuxConnection = Connection<LinuxAdapter>;

fn open_adapter(bus: u32) -> Result<LinuxAdapter, Error<io::Error>> {
    LinuxAdapter::open(bus).map_err(|source| Error::Transport {
        op: Operation::Open,
        source,
    })
}

/// Open bus `bus` with the device at `address` selected
pub fn open(bus: u32, address: u8) -> Result<LinuxConnection, Error<io::Error>> {
    open_with_options(bus, address, &Options::default())
}

/// Open bus `bus` with the device at `address` selected
///
/// Registers listed in `options` are read from `address` before this
/// returns and written back by [`Connection::close`].
pub fn open_with_options(
    bus: u32,
    address: u8,
    options: &Options,
) -> Result<LinuxConnection, Error<io::Error>> {
    Connection::open(open_adapter(bus)?, address, options)
}

/// Open bus `bus` without selecting an address
///
/// Call [`Connection::set_address`] before raw reads and writes.
pub fn open_file(bus: u32) -> Result<LinuxConnection, Error<io::Error>> {
    open_file_with_options(bus, &Options::default())
}

/// Open bus `bus` without selecting an address
///
/// Register backup needs a bound address; a backup list is rejected
/// before the device is opened.
pub fn open_file_with_options(
    bus: u32,
    options: &Options,
) -> Result<LinuxConnection, Error<io::Error>> {
    if !options.backup_registers().is_empty() {
        return Err(ConfigError::BackupWithoutAddress.into());
    }
    Connection::unbound(open_adapter(bus)?, options)
}
