//! SMBus protocol definitions for the Linux i2c-dev interface
//!
//! This crate describes the SMBus transactions a userspace process hands to
//! the kernel through the `I2C_SMBUS` ioctl. It contains no I/O: the
//! platform HAL marshals a [`Command`] into the kernel's descriptor.
//!
//! # Transfer descriptor
//!
//! ```text
//! ┌────────────┬─────────┬──────────┬──────────────────────────────┐
//! │ READ_WRITE │ COMMAND │ SIZE     │ DATA (pointer)               │
//! │ 1B         │ 1B      │ 4B       │ byte | word | block[34]      │
//! └────────────┴─────────┴──────────┴──────────────────────────────┘
//! ```
//!
//! Block data is length-prefixed: the first byte of the data area carries
//! the payload length (0–32), followed by the payload itself.

#![no_std]
#![deny(unsafe_code)]

#[cfg(any(test, feature = "std"))]
#[macro_use]
extern crate std;

pub mod block;
pub mod codes;
pub mod command;
pub mod functionality;

pub use block::{BlockBuffer, BlockError, BLOCK_MAX, BLOCK_WIRE_LEN};
pub use codes::{I2C_FUNCS, I2C_SLAVE, I2C_SLAVE_FORCE, I2C_SMBUS};
pub use command::{Command, Direction, Payload, SizeClass};
pub use functionality::Functionality;
