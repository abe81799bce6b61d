//! i2c-dev ioctl marshalling
//!
//! The only place that builds the kernel's `i2c_smbus_ioctl_data` and hands
//! raw pointers across the ioctl boundary.

use std::io;
use std::os::unix::io::RawFd;
use std::ptr;

use libc::{c_int, c_ulong};
use smbusdev_protocol::codes::select_request;
use smbusdev_protocol::{
    BlockBuffer, Command, Direction, Functionality, Payload, BLOCK_WIRE_LEN, I2C_FUNCS, I2C_SMBUS,
};

/// `union i2c_smbus_data`
#[repr(C)]
pub(crate) union SmbusData {
    byte: u8,
    word: u16,
    block: [u8; BLOCK_WIRE_LEN],
}

/// `struct i2c_smbus_ioctl_data`
#[repr(C)]
#[allow(dead_code)] // fields are read by the kernel
pub(crate) struct SmbusIoctlData {
    read_write: u8,
    command: u8,
    size: u32,
    data: *mut SmbusData,
}

fn check(ret: c_int) -> io::Result<c_int> {
    if ret < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(ret)
    }
}

fn invalid_block(e: smbusdev_protocol::BlockError) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, e)
}

/// Select the slave address (`I2C_SLAVE` / `I2C_SLAVE_FORCE`)
pub(crate) fn set_slave_address(fd: RawFd, address: u8, force: bool) -> io::Result<()> {
    // SAFETY: both requests take the address by value
    check(unsafe { libc::ioctl(fd, select_request(force) as _, c_ulong::from(address)) })?;
    Ok(())
}

/// Read the functionality mask (`I2C_FUNCS`)
pub(crate) fn funcs(fd: RawFd) -> io::Result<Functionality> {
    let mut mask: c_ulong = 0;
    // SAFETY: the kernel writes one unsigned long through the pointer
    check(unsafe { libc::ioctl(fd, I2C_FUNCS as _, ptr::addr_of_mut!(mask)) })?;
    Ok(Functionality::from_bits_truncate(mask as u32))
}

/// Run one SMBus transfer (`I2C_SMBUS`)
///
/// For reads the command payload is replaced with what the kernel returned.
pub(crate) fn smbus_transfer(fd: RawFd, command: &mut Command) -> io::Result<()> {
    let mut data = SmbusData {
        block: [0; BLOCK_WIRE_LEN],
    };
    match &command.payload {
        Payload::Byte(v) => data.byte = *v,
        Payload::Word(v) => data.word = *v,
        Payload::Block(b) | Payload::I2cBlock(b) => data.block = b.to_wire(),
    }

    let mut args = SmbusIoctlData {
        read_write: command.direction.code(),
        command: command.register,
        size: command.size_class().code(),
        data: ptr::addr_of_mut!(data),
    };

    // SAFETY: `args` and `data` outlive the call and match the kernel layout
    check(unsafe { libc::ioctl(fd, I2C_SMBUS as _, ptr::addr_of_mut!(args)) })?;

    if command.direction == Direction::Read {
        // SAFETY: every byte of the union was initialised through `block`
        let (byte, word, block) = unsafe { (data.byte, data.word, data.block) };
        command.payload = match command.payload {
            Payload::Byte(_) => Payload::Byte(byte),
            Payload::Word(_) => Payload::Word(word),
            Payload::Block(_) => Payload::Block(BlockBuffer::decode(&block).map_err(invalid_block)?),
            Payload::I2cBlock(_) => {
                Payload::I2cBlock(BlockBuffer::decode(&block).map_err(invalid_block)?)
            }
        };
    }
    Ok(())
}

/// Close the descriptor, reporting the kernel's result
pub(crate) fn close(fd: RawFd) -> io::Result<()> {
    // SAFETY: the caller gives up ownership of `fd`
    check(unsafe { libc::close(fd) })?;
    Ok(())
}
