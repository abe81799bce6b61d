//! Command-line arguments

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "smbus", about = "SMBus register access over Linux i2c-dev")]
pub struct Cli {
    /// Device configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Adapter number, as in /dev/i2c-<bus>
    #[arg(short, long, global = true, value_parser = parse_number::<u32>)]
    pub bus: Option<u32>,

    /// Device address
    #[arg(short, long, global = true, value_parser = parse_number::<u8>)]
    pub address: Option<u8>,

    /// Access addresses claimed by a kernel driver
    #[arg(long, global = true)]
    pub force: bool,

    /// More log output (repeat for more)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Read a register
    Get {
        #[arg(value_parser = parse_number::<u8>)]
        register: u8,
        /// Read a 16-bit word instead of a byte
        #[arg(long)]
        word: bool,
    },
    /// Write a register
    Set {
        #[arg(value_parser = parse_number::<u8>)]
        register: u8,
        #[arg(value_parser = parse_number::<u16>)]
        value: u16,
        /// Write a 16-bit word instead of a byte
        #[arg(long)]
        word: bool,
    },
    /// Read a block of up to 32 bytes
    BlockRead {
        #[arg(value_parser = parse_number::<u8>)]
        register: u8,
        /// Bytes to read (I2C block only)
        #[arg(value_parser = parse_number::<usize>)]
        len: Option<usize>,
        /// SMBus block: the device reports the length
        #[arg(long)]
        smbus: bool,
    },
    /// Write a block of up to 32 bytes
    BlockWrite {
        #[arg(value_parser = parse_number::<u8>)]
        register: u8,
        #[arg(required = true, value_parser = parse_number::<u8>)]
        bytes: Vec<u8>,
        /// SMBus block instead of I2C block
        #[arg(long)]
        smbus: bool,
    },
    /// List what the adapter supports
    Funcs,
}

/// Parse a decimal or `0x` hexadecimal number
pub fn parse_number<T: TryFrom<u64>>(s: &str) -> Result<T, String> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse::<u64>(),
    };
    let value = parsed.map_err(|e| format!("invalid number '{}': {}", s, e))?;
    T::try_from(value).map_err(|_| format!("{} is out of range", s))
}
