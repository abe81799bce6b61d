//! SMBus adapter abstraction
//!
//! Provides the control and data operations of an open i2c-dev handle.

use smbusdev_protocol::{Command, Functionality};

/// An open handle on an SMBus/I2C adapter
///
/// Every method is a single blocking call on the handle. Implementations
/// must not retry and must return the platform error unchanged so callers
/// can tell, for example, a busy address from a missing device.
pub trait SmbusAdapter {
    /// Error type for adapter operations
    type Error;

    /// Point the handle at a slave address
    ///
    /// # Arguments
    /// * `address` - 7-bit slave address
    /// * `force` - bypass the kernel's check for addresses claimed by a driver
    fn select_address(&mut self, address: u8, force: bool) -> Result<(), Self::Error>;

    /// Run one SMBus transfer against the selected address
    ///
    /// For read commands the payload is overwritten with the data the
    /// device returned. For block reads the payload length becomes the
    /// count reported on the wire.
    fn transfer(&mut self, command: &mut Command) -> Result<(), Self::Error>;

    /// Query what the adapter can do
    fn functionality(&mut self) -> Result<Functionality, Self::Error>;

    /// Raw read from the selected address, no SMBus framing
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Raw write to the selected address, no SMBus framing
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error>;

    /// Release the handle
    ///
    /// Further calls on a closed adapter fail.
    fn close(&mut self) -> Result<(), Self::Error>;
}
