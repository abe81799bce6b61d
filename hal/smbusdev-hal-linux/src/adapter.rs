//! i2c-dev adapter
//!
//! Wraps the open `/dev/i2c-<bus>` file. Every [`SmbusAdapter`] call maps
//! to exactly one system call; errors are the kernel's errno, untouched.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::unix::io::{AsRawFd, IntoRawFd, RawFd};
use std::path::PathBuf;

use log::debug;
use smbusdev_hal::SmbusAdapter;
use smbusdev_protocol::{Command, Functionality};

use crate::ioctl;

/// Character device of adapter `bus`
pub fn device_path(bus: u32) -> PathBuf {
    PathBuf::from(format!("/dev/i2c-{}", bus))
}

/// An open i2c-dev adapter
#[derive(Debug)]
pub struct LinuxAdapter {
    bus: u32,
    file: Option<File>,
}

impl LinuxAdapter {
    /// Open `/dev/i2c-<bus>` read-write
    pub fn open(bus: u32) -> io::Result<Self> {
        let path = device_path(bus);
        let file = OpenOptions::new().read(true).write(true).open(&path)?;
        debug!("opened {}", path.display());
        Ok(Self {
            bus,
            file: Some(file),
        })
    }

    /// Adapter number
    pub fn bus(&self) -> u32 {
        self.bus
    }

    fn file(&mut self) -> io::Result<&mut File> {
        self.file
            .as_mut()
            .ok_or_else(|| io::Error::from_raw_os_error(libc::EBADF))
    }

    fn fd(&mut self) -> io::Result<RawFd> {
        self.file().map(|f| f.as_raw_fd())
    }
}

impl SmbusAdapter for LinuxAdapter {
    type Error = io::Error;

    fn select_address(&mut self, address: u8, force: bool) -> io::Result<()> {
        ioctl::set_slave_address(self.fd()?, address, force)
    }

    fn transfer(&mut self, command: &mut Command) -> io::Result<()> {
        ioctl::smbus_transfer(self.fd()?, command)
    }

    fn functionality(&mut self) -> io::Result<Functionality> {
        ioctl::funcs(self.fd()?)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file()?.read(buf)
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.file()?.write(data)
    }

    fn close(&mut self) -> io::Result<()> {
        let file = self
            .file
            .take()
            .ok_or_else(|| io::Error::from_raw_os_error(libc::EBADF))?;
        debug!("closing {}", device_path(self.bus).display());
        ioctl::close(file.into_raw_fd())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_path() {
        assert_eq!(device_path(1), PathBuf::from("/dev/i2c-1"));
        assert_eq!(device_path(20), PathBuf::from("/dev/i2c-20"));
    }

    #[test]
    fn test_open_missing_bus() {
        let err = LinuxAdapter::open(u32::MAX).unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::ENOENT));
    }

    #[test]
    fn test_closed_adapter_reports_ebadf() {
        let mut adapter = LinuxAdapter {
            bus: 0,
            file: None,
        };

        let err = adapter.select_address(0x50, false).unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::EBADF));
        let err = adapter.close().unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::EBADF));
    }

    #[test]
    fn test_close_releases_descriptor() {
        // Any readable file stands in for the character device
        let file = File::open("/dev/null").unwrap();
        let mut adapter = LinuxAdapter {
            bus: 0,
            file: Some(file),
        };

        adapter.close().unwrap();
        assert!(adapter.file.is_none());
    }

    #[test]
    fn test_ioctl_on_regular_file_fails() {
        let file = File::open("/dev/null").unwrap();
        let mut adapter = LinuxAdapter {
            bus: 0,
            file: Some(file),
        };

        // /dev/null is not an i2c adapter
        let err = adapter.functionality().unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::ENOTTY));
    }
}
