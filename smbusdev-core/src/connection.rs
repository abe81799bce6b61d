//! SMBus connection
//!
//! A [`Connection`] owns an open adapter handle and turns register-level
//! calls into SMBus commands.
//!
//! # Addressing
//!
//! The slave address lives on the handle, and the adapter may be shared
//! with other processes that repoint it between calls. Every register
//! transaction therefore selects its address immediately before the
//! transfer. Select-then-transfer is not atomic; callers sharing one
//! adapter across threads must serialize the pair themselves.

use core::fmt;

use log::{debug, trace, warn};
use smbusdev_hal::SmbusAdapter;
use smbusdev_protocol::{BlockBuffer, Command, Functionality, Payload};

use crate::backup::RegisterBackup;
use crate::error::{ConfigError, Error, Operation};
use crate::options::Options;

/// Connection to devices on one SMBus adapter
#[derive(Debug)]
pub struct Connection<A: SmbusAdapter> {
    adapter: A,
    force: bool,
    backup: Option<RegisterBackup>,
}

impl<A: SmbusAdapter> Connection<A> {
    /// Open a connection bound to `address`
    ///
    /// Selects `address`, then backs up the registers listed in `options`
    /// from that device. On any failure the adapter is closed before the
    /// error is returned.
    pub fn open(adapter: A, address: u8, options: &Options) -> Result<Self, Error<A::Error>> {
        let mut conn = Self {
            adapter,
            force: options.force(),
            backup: None,
        };

        if let Err(e) = conn.set_address(address) {
            conn.release();
            return Err(e);
        }

        if !options.backup_registers().is_empty() {
            match RegisterBackup::capture(&mut conn, address, options.backup_registers()) {
                Ok(backup) => conn.backup = Some(backup),
                Err(e) => {
                    conn.release();
                    return Err(e);
                }
            }
        }

        debug!(
            "opened smbus connection at {:#04x} (force: {})",
            address, conn.force
        );
        Ok(conn)
    }

    /// Open a connection with no address bound
    ///
    /// Call [`set_address`](Self::set_address) before raw I/O. Register
    /// backup needs a bound address, so a backup list is rejected and the
    /// adapter closed.
    pub fn unbound(adapter: A, options: &Options) -> Result<Self, Error<A::Error>> {
        let mut conn = Self {
            adapter,
            force: options.force(),
            backup: None,
        };

        if !options.backup_registers().is_empty() {
            conn.release();
            return Err(ConfigError::BackupWithoutAddress.into());
        }

        debug!("opened unbound smbus connection (force: {})", conn.force);
        Ok(conn)
    }

    /// Forced addressing enabled
    pub fn force(&self) -> bool {
        self.force
    }

    /// Pending register backup, if any
    pub fn backup(&self) -> Option<&RegisterBackup> {
        self.backup.as_ref()
    }

    /// Get access to the underlying adapter
    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    /// Point the handle at `address`
    pub fn set_address(&mut self, address: u8) -> Result<(), Error<A::Error>> {
        self.adapter
            .select_address(address, self.force)
            .map_err(Error::transport(Operation::SelectAddress))
    }

    /// Send `data` to the selected device, no SMBus framing
    pub fn write(&mut self, data: &[u8]) -> Result<usize, Error<A::Error>> {
        self.adapter
            .write(data)
            .map_err(Error::transport(Operation::Write))
    }

    /// Send a single byte to the selected device
    pub fn write_byte(&mut self, byte: u8) -> Result<usize, Error<A::Error>> {
        self.write(&[byte])
    }

    /// Read from the selected device into `buf`, no SMBus framing
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error<A::Error>> {
        self.adapter
            .read(buf)
            .map_err(Error::transport(Operation::Read))
    }

    /// Read the byte at `register`
    pub fn read_reg(&mut self, address: u8, register: u8) -> Result<u8, Error<A::Error>> {
        let mut cmd = Command::read_byte(register);
        self.dispatch(address, &mut cmd)?;
        // Adapters keep the payload variant of the command
        Ok(cmd.byte().unwrap_or_default())
    }

    /// Write `value` to `register`
    pub fn write_reg(&mut self, address: u8, register: u8, value: u8) -> Result<(), Error<A::Error>> {
        self.dispatch(address, &mut Command::write_byte(register, value))
    }

    /// Read the word at `register`, in native byte order
    pub fn read_word(&mut self, address: u8, register: u8) -> Result<u16, Error<A::Error>> {
        let mut cmd = Command::read_word(register);
        self.dispatch(address, &mut cmd)?;
        Ok(cmd.word().unwrap_or_default())
    }

    /// Write the word `value` to `register`, in native byte order
    pub fn write_word(
        &mut self,
        address: u8,
        register: u8,
        value: u16,
    ) -> Result<(), Error<A::Error>> {
        self.dispatch(address, &mut Command::write_word(register, value))
    }

    /// Fill `buf` from `register` with an I2C block read
    ///
    /// `buf` may hold at most 32 bytes; larger buffers fail before any I/O.
    /// A device reporting fewer bytes than requested yields
    /// [`Error::ShortBlock`]; extra bytes are ignored.
    pub fn read_block_data(
        &mut self,
        address: u8,
        register: u8,
        buf: &mut [u8],
    ) -> Result<(), Error<A::Error>> {
        let mut cmd = Command::read_i2c_block(register, buf.len())?;
        self.dispatch(address, &mut cmd)?;

        let received = cmd.block().map(|b| b.as_slice()).unwrap_or_default();
        if received.len() < buf.len() {
            return Err(Error::ShortBlock {
                requested: buf.len(),
                received: received.len(),
            });
        }
        buf.copy_from_slice(&received[..buf.len()]);
        Ok(())
    }

    /// Write `buf` to `register` with an I2C block write
    ///
    /// `buf` may hold at most 32 bytes; larger buffers fail before any I/O.
    pub fn write_block_data(
        &mut self,
        address: u8,
        register: u8,
        buf: &[u8],
    ) -> Result<(), Error<A::Error>> {
        let mut cmd = Command::write_i2c_block(register, buf)?;
        self.dispatch(address, &mut cmd)
    }

    /// Read an SMBus block from `register`; the device sets the length
    pub fn read_smbus_block(
        &mut self,
        address: u8,
        register: u8,
    ) -> Result<BlockBuffer, Error<A::Error>> {
        let mut cmd = Command::read_block(register);
        self.dispatch(address, &mut cmd)?;
        match cmd.payload {
            Payload::Block(block) => Ok(block),
            _ => Ok(BlockBuffer::new()),
        }
    }

    /// Write `buf` to `register` as an SMBus block, count byte first
    pub fn write_smbus_block(
        &mut self,
        address: u8,
        register: u8,
        buf: &[u8],
    ) -> Result<(), Error<A::Error>> {
        let mut cmd = Command::write_block(register, buf)?;
        self.dispatch(address, &mut cmd)
    }

    /// Query the adapter's functionality mask
    pub fn functionality(&mut self) -> Result<Functionality, Error<A::Error>> {
        self.adapter
            .functionality()
            .map_err(Error::transport(Operation::Functionality))
    }

    /// Write the register backup back to its device now
    ///
    /// Unlike [`close`](Self::close), a failing write is returned. The
    /// backup is consumed on success; on failure it is kept so `close`
    /// makes another attempt.
    pub fn restore_backup(&mut self) -> Result<(), Error<A::Error>> {
        let Some(backup) = self.backup.take() else {
            return Ok(());
        };
        let result = backup.restore(self);
        if result.is_err() {
            self.backup = Some(backup);
        }
        result
    }

    /// Restore backed-up registers, then release the handle
    ///
    /// Restoration is best effort: the first failing write abandons the
    /// remaining registers and is only logged. The returned result is
    /// that of releasing the handle. Use
    /// [`restore_backup`](Self::restore_backup) first to observe restore
    /// failures.
    pub fn close(mut self) -> Result<(), Error<A::Error>>
    where
        A::Error: fmt::Debug,
    {
        if let Some(backup) = self.backup.take() {
            if let Err(e) = backup.restore(&mut self) {
                warn!(
                    "abandoned register restore of device {:#04x}: {:?}",
                    backup.address(),
                    e
                );
            }
        }

        debug!("closing smbus connection");
        self.adapter
            .close()
            .map_err(Error::transport(Operation::Close))
    }

    /// Select `address` and run `command` against it
    fn dispatch(&mut self, address: u8, command: &mut Command) -> Result<(), Error<A::Error>> {
        self.set_address(address)?;
        trace!(
            "smbus {:?} {:?} at {:#04x} reg {:#04x}",
            command.direction,
            command.size_class(),
            address,
            command.register
        );
        self.adapter
            .transfer(command)
            .map_err(Error::transport(Operation::Transfer))
    }

    /// Close the adapter on a failed open; the open error takes precedence
    fn release(&mut self) {
        let _ = self.adapter.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use smbusdev_hal::mock::{MockAdapter, MockCall, MockError};
    use smbusdev_protocol::{Direction, SizeClass, BLOCK_MAX};

    fn open(mock: &MockAdapter, address: u8) -> Connection<MockAdapter> {
        Connection::open(mock.clone(), address, &Options::new()).unwrap()
    }

    fn select(address: u8) -> MockCall {
        MockCall::SelectAddress {
            address,
            force: false,
        }
    }

    fn transfer(address: u8, direction: Direction, register: u8, size: SizeClass) -> MockCall {
        MockCall::Transfer {
            address: Some(address),
            direction,
            register,
            size,
        }
    }

    #[test]
    fn test_write_then_read_reg() {
        let mock = MockAdapter::new();
        let mut conn = open(&mock, 0x50);

        conn.write_reg(0x50, 0x10, 0xAB).unwrap();
        assert_eq!(conn.read_reg(0x50, 0x10).unwrap(), 0xAB);
    }

    #[test]
    fn test_open_selects_address() {
        let mock = MockAdapter::new();
        let _conn = open(&mock, 0x50);

        assert_eq!(mock.calls(), vec![select(0x50)]);
        assert_eq!(mock.selected(), Some(0x50));
    }

    #[test]
    fn test_register_ops_select_then_transfer_once() {
        let mock = MockAdapter::new();
        let mut conn = open(&mock, 0x50);
        mock.clear_calls();

        conn.read_reg(0x51, 0x01).unwrap();
        conn.write_reg(0x52, 0x02, 7).unwrap();
        conn.read_word(0x53, 0x03).unwrap();
        conn.write_word(0x54, 0x04, 0xBEEF).unwrap();

        assert_eq!(
            mock.calls(),
            vec![
                select(0x51),
                transfer(0x51, Direction::Read, 0x01, SizeClass::ByteData),
                select(0x52),
                transfer(0x52, Direction::Write, 0x02, SizeClass::ByteData),
                select(0x53),
                transfer(0x53, Direction::Read, 0x03, SizeClass::WordData),
                select(0x54),
                transfer(0x54, Direction::Write, 0x04, SizeClass::WordData),
            ]
        );
    }

    #[test]
    fn test_word_keeps_native_order() {
        let mock = MockAdapter::new();
        let mut conn = open(&mock, 0x48);

        conn.write_word(0x48, 0x02, 0x1234).unwrap();

        assert_eq!(mock.register(0x48, 0x02), Some(0x1234u16.to_ne_bytes().to_vec()));
        assert_eq!(conn.read_word(0x48, 0x02).unwrap(), 0x1234);
    }

    #[test]
    fn test_forced_addressing() {
        let mock = MockAdapter::new();
        let opts = Options::new().with_force(true);
        let mut conn = Connection::open(mock.clone(), 0x3C, &opts).unwrap();
        conn.read_reg(0x3C, 0x00).unwrap();

        assert!(conn.force());
        assert!(mock
            .calls()
            .iter()
            .filter(|c| matches!(c, MockCall::SelectAddress { .. }))
            .all(|c| *c == MockCall::SelectAddress { address: 0x3C, force: true }));
    }

    #[test]
    fn test_block_roundtrip() {
        let mock = MockAdapter::new();
        let mut conn = open(&mock, 0x50);

        conn.write_block_data(0x50, 0x20, &[1, 2, 3, 4, 5]).unwrap();
        let mut buf = [0u8; 5];
        conn.read_block_data(0x50, 0x20, &mut buf).unwrap();

        assert_eq!(buf, [1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_block_too_large_does_no_io() {
        let mock = MockAdapter::new();
        let mut conn = Connection::unbound(mock.clone(), &Options::new()).unwrap();

        let data = [0u8; 33];
        assert_eq!(
            conn.write_block_data(0x50, 0x20, &data),
            Err(Error::BlockTooLarge { len: 33 })
        );
        let mut buf = [0u8; 33];
        assert_eq!(
            conn.read_block_data(0x50, 0x20, &mut buf),
            Err(Error::BlockTooLarge { len: 33 })
        );
        assert_eq!(
            conn.write_smbus_block(0x50, 0x20, &data),
            Err(Error::BlockTooLarge { len: 33 })
        );
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_short_block_read() {
        let mock = MockAdapter::new();
        mock.set_short_block_reads(true);
        mock.set_register(0x50, 0x20, &[9, 8]);
        let mut conn = open(&mock, 0x50);

        let mut buf = [0u8; 4];
        assert_eq!(
            conn.read_block_data(0x50, 0x20, &mut buf),
            Err(Error::ShortBlock {
                requested: 4,
                received: 2
            })
        );
    }

    #[test]
    fn test_smbus_block_length_from_device() {
        let mock = MockAdapter::new();
        let mut conn = open(&mock, 0x0B);

        conn.write_smbus_block(0x0B, 0x20, b"bq40z").unwrap();
        let block = conn.read_smbus_block(0x0B, 0x20).unwrap();

        assert_eq!(block.as_slice(), b"bq40z");
        assert_eq!(
            mock.calls().last(),
            Some(&transfer(0x0B, Direction::Read, 0x20, SizeClass::BlockData))
        );
    }

    #[test]
    fn test_transfer_error_passes_through() {
        let mock = MockAdapter::new();
        mock.fail_transfer(Direction::Read, 0, MockError::EREMOTEIO);
        let mut conn = open(&mock, 0x50);

        assert_eq!(
            conn.read_reg(0x50, 0x00),
            Err(Error::Transport {
                op: Operation::Transfer,
                source: MockError::new(MockError::EREMOTEIO),
            })
        );
        // No residue: the next call succeeds
        assert_eq!(conn.read_reg(0x50, 0x00), Ok(0));
    }

    #[test]
    fn test_select_error_skips_transfer() {
        let mock = MockAdapter::new();
        let mut conn = open(&mock, 0x50);
        mock.fail_select(0, MockError::EBUSY);
        mock.clear_calls();

        assert_eq!(
            conn.write_reg(0x50, 0x00, 1),
            Err(Error::Transport {
                op: Operation::SelectAddress,
                source: MockError::new(MockError::EBUSY),
            })
        );
        assert_eq!(mock.transfer_count(), 0);
    }

    #[test]
    fn test_open_select_failure_closes_adapter() {
        let mock = MockAdapter::new();
        mock.fail_select(0, MockError::EBUSY);

        let result = Connection::open(mock.clone(), 0x50, &Options::new());

        assert!(result.is_err());
        assert!(mock.is_closed());
    }

    #[test]
    fn test_open_with_backup_reads_each_register() {
        let mock = MockAdapter::new();
        mock.set_register(0x50, 0x01, &[0xA1]);
        mock.set_register(0x50, 0x02, &[0xA2]);
        let opts = Options::new().with_backup_registers(&[0x01, 0x02, 0x03]);

        let conn = Connection::open(mock.clone(), 0x50, &opts).unwrap();

        assert_eq!(mock.transfer_count(), 3);
        let backup = conn.backup().unwrap();
        assert_eq!(backup.entries(), &[(0x01, 0xA1), (0x02, 0xA2), (0x03, 0x00)]);
    }

    #[test]
    fn test_open_backup_failure_closes_adapter() {
        let mock = MockAdapter::new();
        mock.fail_transfer(Direction::Read, 1, MockError::ENXIO);
        let opts = Options::new().with_backup_registers(&[0x01, 0x02, 0x03]);

        let result = Connection::open(mock.clone(), 0x50, &opts);

        assert!(matches!(
            result,
            Err(Error::Transport {
                op: Operation::Transfer,
                ..
            })
        ));
        assert!(mock.is_closed());
        assert_eq!(mock.transfer_count(), 2);
    }

    #[test]
    fn test_unbound_rejects_backup() {
        let mock = MockAdapter::new();
        let opts = Options::new().with_backup_registers(&[0x01]);

        let result = Connection::unbound(mock.clone(), &opts);

        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::BackupWithoutAddress))
        ));
        assert_eq!(mock.transfer_count(), 0);
        assert!(mock.is_closed());
    }

    #[test]
    fn test_unbound_needs_set_address() {
        let mock = MockAdapter::new();
        let mut conn = Connection::unbound(mock.clone(), &Options::new()).unwrap();
        assert!(mock.calls().is_empty());

        conn.set_address(0x68).unwrap();
        assert_eq!(conn.write(&[0x6B, 0x00]).unwrap(), 2);
        assert_eq!(conn.write_byte(0x75).unwrap(), 1);

        mock.set_read_data(&[0x71]);
        let mut buf = [0u8; 1];
        assert_eq!(conn.read(&mut buf).unwrap(), 1);
        assert_eq!(buf, [0x71]);
        assert_eq!(mock.written(), vec![0x6B, 0x00, 0x75]);
    }

    #[test]
    fn test_close_restores_backup_in_order() {
        let mock = MockAdapter::new();
        mock.set_register(0x50, 0x10, &[0x11]);
        mock.set_register(0x50, 0x20, &[0x22]);
        let opts = Options::new().with_backup_registers(&[0x20, 0x10]);
        let mut conn = Connection::open(mock.clone(), 0x50, &opts).unwrap();

        conn.write_reg(0x50, 0x10, 0xFF).unwrap();
        conn.write_reg(0x50, 0x20, 0xFF).unwrap();
        mock.clear_calls();

        conn.close().unwrap();

        assert_eq!(
            mock.calls(),
            vec![
                select(0x50),
                transfer(0x50, Direction::Write, 0x20, SizeClass::ByteData),
                select(0x50),
                transfer(0x50, Direction::Write, 0x10, SizeClass::ByteData),
                MockCall::Close,
            ]
        );
        assert_eq!(mock.register(0x50, 0x10), Some(vec![0x11]));
        assert_eq!(mock.register(0x50, 0x20), Some(vec![0x22]));
    }

    #[test]
    fn test_close_swallows_restore_failure() {
        let mock = MockAdapter::new();
        let opts = Options::new().with_backup_registers(&[0x01, 0x02, 0x03]);
        let conn = Connection::open(mock.clone(), 0x50, &opts).unwrap();
        mock.fail_transfer(Direction::Write, 0, MockError::EREMOTEIO);

        assert_eq!(conn.close(), Ok(()));
        assert!(mock.is_closed());
        // First restore failed, the rest were abandoned
        let writes = mock
            .calls()
            .iter()
            .filter(|c| matches!(c, MockCall::Transfer { direction: Direction::Write, .. }))
            .count();
        assert_eq!(writes, 1);
    }

    #[test]
    fn test_close_returns_close_error() {
        let mock = MockAdapter::new();
        let conn = open(&mock, 0x50);
        mock.fail_close(MockError::EBADF);

        assert_eq!(
            conn.close(),
            Err(Error::Transport {
                op: Operation::Close,
                source: MockError::new(MockError::EBADF),
            })
        );
    }

    #[test]
    fn test_restore_backup_surfaces_failure() {
        let mock = MockAdapter::new();
        let opts = Options::new().with_backup_registers(&[0x01, 0x02]);
        let mut conn = Connection::open(mock.clone(), 0x50, &opts).unwrap();
        mock.fail_transfer(Direction::Write, 0, MockError::EREMOTEIO);

        assert!(conn.restore_backup().is_err());
        assert!(conn.backup().is_some());

        assert_eq!(conn.restore_backup(), Ok(()));
        assert!(conn.backup().is_none());

        mock.clear_calls();
        conn.close().unwrap();
        assert_eq!(mock.calls(), vec![MockCall::Close]);
    }

    #[test]
    fn test_functionality() {
        let mock = MockAdapter::new();
        mock.set_functionality(Functionality::I2C | Functionality::SMBUS_READ_BYTE_DATA);
        let mut conn = Connection::unbound(mock.clone(), &Options::new()).unwrap();

        let funcs = conn.functionality().unwrap();
        assert!(funcs.contains(Functionality::SMBUS_READ_BYTE_DATA));
        assert!(!funcs.contains(Functionality::SMBUS_WRITE_BYTE_DATA));
    }

    proptest! {
        #[test]
        fn block_write_read_roundtrip(
            register in any::<u8>(),
            data in proptest::collection::vec(any::<u8>(), 0..=BLOCK_MAX),
        ) {
            let mock = MockAdapter::new();
            let mut conn = open(&mock, 0x50);

            conn.write_block_data(0x50, register, &data).unwrap();
            let mut buf = vec![0u8; data.len()];
            conn.read_block_data(0x50, register, &mut buf).unwrap();

            prop_assert_eq!(buf, data);
        }

        #[test]
        fn oversized_blocks_never_touch_the_bus(len in (BLOCK_MAX + 1)..=255usize) {
            let mock = MockAdapter::new();
            let mut conn = Connection::unbound(mock.clone(), &Options::new()).unwrap();
            let mut buf = vec![0u8; len];

            prop_assert_eq!(
                conn.read_block_data(0x50, 0, &mut buf),
                Err(Error::BlockTooLarge { len })
            );
            prop_assert_eq!(
                conn.write_block_data(0x50, 0, &buf),
                Err(Error::BlockTooLarge { len })
            );
            prop_assert!(mock.calls().is_empty());
        }
    }
}
