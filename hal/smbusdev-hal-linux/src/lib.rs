//! Linux i2c-dev HAL for smbusdev
//!
//! Implements [`SmbusAdapter`] over `/dev/i2c-<bus>` character devices
//! using the kernel's i2c-dev ioctls, and provides the usual open calls
//! returning a ready [`Connection`].
//!
//! # Usage
//!
//! ```no_run
//! let mut conn = smbusdev_hal_linux::open(1, 0x50)?;
//! conn.write_reg(0x50, 0x10, 0xAB)?;
//! assert_eq!(conn.read_reg(0x50, 0x10)?, 0xAB);
//! conn.close()?;
//! # Ok::<(), smbusdev_hal_linux::Error<std::io::Error>>(())
//! ```
//!
//! # Troubleshooting
//!
//! A `Permission denied` error from the open calls means the process may
//! not access `/dev/i2c-<bus>`; add the user to the `i2c` group. `ENOENT`
//! usually means the `i2c-dev` module is not loaded.
//!
//! [`SmbusAdapter`]: smbusdev_hal::SmbusAdapter

#![deny(unsafe_code)]

pub mod adapter;
#[allow(unsafe_code)]
mod ioctl;
pub mod open;

pub use adapter::{device_path, LinuxAdapter};
pub use open::{open, open_file, open_file_with_options, open_with_options, LinuxConnection};

pub use smbusdev_core::{Connection, Error, Options};
