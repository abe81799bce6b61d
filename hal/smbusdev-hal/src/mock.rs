//! Mock SMBus adapter for testing
//!
//! Records every gateway call and behaves like a bus of ideal devices:
//! whatever is written to a register is read back from it. Clones share
//! state, so a test can keep a handle after moving the adapter into a
//! connection.

use core::cell::RefCell;
use core::fmt;
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;
use std::vec::Vec;

use smbusdev_protocol::{BlockBuffer, Command, Direction, Functionality, Payload, SizeClass};

use crate::adapter::SmbusAdapter;

/// Gateway call recorded by the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    SelectAddress { address: u8, force: bool },
    Transfer {
        address: Option<u8>,
        direction: Direction,
        register: u8,
        size: SizeClass,
    },
    Functionality,
    Read { len: usize },
    Write { data: Vec<u8> },
    Close,
}

/// Error returned by the mock, carrying an errno like the real adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockError {
    pub errno: i32,
}

impl MockError {
    /// No such device or address
    pub const ENXIO: i32 = 6;
    /// Bad file descriptor
    pub const EBADF: i32 = 9;
    /// Device or resource busy
    pub const EBUSY: i32 = 16;
    /// Remote I/O error (NACK)
    pub const EREMOTEIO: i32 = 121;

    pub fn new(errno: i32) -> Self {
        Self { errno }
    }
}

impl fmt::Display for MockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mock adapter error (errno {})", self.errno)
    }
}

impl std::error::Error for MockError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailOn {
    Select,
    Transfer(Direction),
    Functionality,
    Read,
    Write,
    Close,
}

#[derive(Debug)]
struct Failure {
    on: FailOn,
    skip: usize,
    errno: i32,
}

#[derive(Debug, Default)]
struct MockState {
    calls: Vec<MockCall>,
    registers: BTreeMap<(u8, u8), Vec<u8>>,
    selected: Option<u8>,
    closed: bool,
    short_block_reads: bool,
    functionality: Option<Functionality>,
    failures: Vec<Failure>,
    read_data: VecDeque<u8>,
    written: Vec<u8>,
}

impl MockState {
    /// Consume a scheduled failure matching `on`, if one is due
    fn take_failure(&mut self, on: FailOn) -> Result<(), MockError> {
        let mut due = None;
        for (i, failure) in self.failures.iter_mut().enumerate() {
            if failure.on != on {
                continue;
            }
            if failure.skip == 0 {
                due = Some(i);
                break;
            }
            failure.skip -= 1;
        }
        match due {
            Some(i) => Err(MockError::new(self.failures.remove(i).errno)),
            None => Ok(()),
        }
    }

    fn check_open(&self) -> Result<(), MockError> {
        if self.closed {
            Err(MockError::new(MockError::EBADF))
        } else {
            Ok(())
        }
    }
}

/// Mock SMBus adapter
#[derive(Debug, Clone, Default)]
pub struct MockAdapter {
    state: Rc<RefCell<MockState>>,
}

impl MockAdapter {
    /// Create a mock with an empty register file
    pub fn new() -> Self {
        Self::default()
    }

    /// Get call log (for test verification)
    pub fn calls(&self) -> Vec<MockCall> {
        self.state.borrow().calls.clone()
    }

    /// Clear call log
    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    /// Count recorded transfers
    pub fn transfer_count(&self) -> usize {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|c| matches!(c, MockCall::Transfer { .. }))
            .count()
    }

    /// Preload register contents of a device
    pub fn set_register(&self, address: u8, register: u8, data: &[u8]) {
        self.state
            .borrow_mut()
            .registers
            .insert((address, register), data.to_vec());
    }

    /// Current register contents of a device
    pub fn register(&self, address: u8, register: u8) -> Option<Vec<u8>> {
        self.state
            .borrow()
            .registers
            .get(&(address, register))
            .cloned()
    }

    /// Address currently selected on the handle
    pub fn selected(&self) -> Option<u8> {
        self.state.borrow().selected
    }

    /// Whether `close` has been called
    pub fn is_closed(&self) -> bool {
        self.state.borrow().closed
    }

    /// Make I2C block reads return only the stored bytes instead of
    /// padding to the requested length
    pub fn set_short_block_reads(&self, short: bool) {
        self.state.borrow_mut().short_block_reads = short;
    }

    /// Mask reported by `functionality`
    pub fn set_functionality(&self, funcs: Functionality) {
        self.state.borrow_mut().functionality = Some(funcs);
    }

    /// Set data to return for raw reads
    pub fn set_read_data(&self, data: &[u8]) {
        self.state.borrow_mut().read_data = data.iter().copied().collect();
    }

    /// Bytes received by raw writes
    pub fn written(&self) -> Vec<u8> {
        self.state.borrow().written.clone()
    }

    /// Fail the address select after `skip` successful ones
    pub fn fail_select(&self, skip: usize, errno: i32) {
        self.schedule(FailOn::Select, skip, errno);
    }

    /// Fail a transfer in `direction` after `skip` successful ones
    pub fn fail_transfer(&self, direction: Direction, skip: usize, errno: i32) {
        self.schedule(FailOn::Transfer(direction), skip, errno);
    }

    /// Fail the functionality query
    pub fn fail_functionality(&self, errno: i32) {
        self.schedule(FailOn::Functionality, 0, errno);
    }

    /// Fail the next raw read
    pub fn fail_read(&self, errno: i32) {
        self.schedule(FailOn::Read, 0, errno);
    }

    /// Fail the next raw write
    pub fn fail_write(&self, errno: i32) {
        self.schedule(FailOn::Write, 0, errno);
    }

    /// Fail `close`; the mock still counts as closed afterwards
    pub fn fail_close(&self, errno: i32) {
        self.schedule(FailOn::Close, 0, errno);
    }

    fn schedule(&self, on: FailOn, skip: usize, errno: i32) {
        self.state
            .borrow_mut()
            .failures
            .push(Failure { on, skip, errno });
    }
}

impl SmbusAdapter for MockAdapter {
    type Error = MockError;

    fn select_address(&mut self, address: u8, force: bool) -> Result<(), MockError> {
        let mut state = self.state.borrow_mut();
        state.calls.push(MockCall::SelectAddress { address, force });
        state.check_open()?;
        state.take_failure(FailOn::Select)?;
        state.selected = Some(address);
        Ok(())
    }

    fn transfer(&mut self, command: &mut Command) -> Result<(), MockError> {
        let mut state = self.state.borrow_mut();
        let address = state.selected;
        state.calls.push(MockCall::Transfer {
            address,
            direction: command.direction,
            register: command.register,
            size: command.size_class(),
        });
        state.check_open()?;
        state.take_failure(FailOn::Transfer(command.direction))?;
        let address = address.ok_or(MockError::new(MockError::ENXIO))?;
        let key = (address, command.register);

        match command.direction {
            Direction::Write => {
                let bytes = match &command.payload {
                    Payload::Byte(v) => std::vec![*v],
                    Payload::Word(v) => v.to_ne_bytes().to_vec(),
                    Payload::Block(b) | Payload::I2cBlock(b) => b.to_vec(),
                };
                state.registers.insert(key, bytes);
            }
            Direction::Read => {
                let stored = state.registers.get(&key).cloned().unwrap_or_default();
                let short = state.short_block_reads;
                let at = |i: usize| stored.get(i).copied().unwrap_or(0);
                command.payload = match &command.payload {
                    Payload::Byte(_) => Payload::Byte(at(0)),
                    Payload::Word(_) => Payload::Word(u16::from_ne_bytes([at(0), at(1)])),
                    Payload::Block(_) => {
                        let len = stored.len().min(smbusdev_protocol::BLOCK_MAX);
                        Payload::Block(block_of(&stored[..len]))
                    }
                    Payload::I2cBlock(requested) => {
                        let len = if short {
                            stored.len().min(requested.len())
                        } else {
                            requested.len()
                        };
                        let data: Vec<u8> = (0..len).map(at).collect();
                        Payload::I2cBlock(block_of(&data))
                    }
                };
            }
        }
        Ok(())
    }

    fn functionality(&mut self) -> Result<Functionality, MockError> {
        let mut state = self.state.borrow_mut();
        state.calls.push(MockCall::Functionality);
        state.check_open()?;
        state.take_failure(FailOn::Functionality)?;
        Ok(state.functionality.unwrap_or_else(Functionality::all))
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, MockError> {
        let mut state = self.state.borrow_mut();
        state.calls.push(MockCall::Read { len: buf.len() });
        state.check_open()?;
        state.take_failure(FailOn::Read)?;
        let n = buf.len().min(state.read_data.len());
        for (slot, byte) in buf.iter_mut().zip(state.read_data.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, MockError> {
        let mut state = self.state.borrow_mut();
        state.calls.push(MockCall::Write {
            data: data.to_vec(),
        });
        state.check_open()?;
        state.take_failure(FailOn::Write)?;
        state.written.extend_from_slice(data);
        Ok(data.len())
    }

    fn close(&mut self) -> Result<(), MockError> {
        let mut state = self.state.borrow_mut();
        state.calls.push(MockCall::Close);
        state.check_open()?;
        state.closed = true;
        state.take_failure(FailOn::Close)
    }
}

fn block_of(data: &[u8]) -> BlockBuffer {
    // Callers clamp to BLOCK_MAX
    BlockBuffer::from_slice(data).unwrap_or_default()
}
