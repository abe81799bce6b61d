//! smbus - register access over Linux i2c-dev
//!
//! ```text
//! smbus -b 1 -a 0x50 get 0x10
//! smbus -c eeprom.toml set 0x10 0xAB
//! smbus -b 1 -a 0x50 block-read 0x00 16
//! smbus -b 1 funcs
//! ```

use std::process::ExitCode;

use clap::Parser;
use log::debug;
use smbusdev_core::{Connection, Options};
use smbusdev_hal::SmbusAdapter;
use smbusdev_hal_linux::{device_path, open_file_with_options, open_with_options};
use smbusdev_protocol::{Direction, Functionality, SizeClass};

mod cli;
mod config;

use cli::{Cli, Command};
use config::ToolError;

/// Transfer shapes listed by `funcs`, with their display names
const TRANSFERS: [(Direction, SizeClass, &str); 8] = [
    (Direction::Read, SizeClass::ByteData, "read byte"),
    (Direction::Write, SizeClass::ByteData, "write byte"),
    (Direction::Read, SizeClass::WordData, "read word"),
    (Direction::Write, SizeClass::WordData, "write word"),
    (Direction::Read, SizeClass::BlockData, "read smbus block"),
    (Direction::Write, SizeClass::BlockData, "write smbus block"),
    (Direction::Read, SizeClass::I2cBlockData, "read i2c block"),
    (Direction::Write, SizeClass::I2cBlockData, "write i2c block"),
];

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", report(&e));
            ExitCode::FAILURE
        }
    }
}

/// One-line error message for stderr
fn report(e: &ToolError) -> String {
    format!("smbus: {}", e)
}

fn run(cli: &Cli) -> Result<(), ToolError> {
    let file = cli.config.as_deref().map(config::load).transpose()?;
    let device = config::resolve(file, cli)?;

    if cli.cmd == Command::Funcs {
        // Functionality is per adapter; no address or backup involved
        let options = Options::new().with_force(device.force);
        let conn = open_file_with_options(device.bus, &options)?;
        return session(conn, None, &cli.cmd);
    }

    let options = device.options()?;
    let address = device.address.ok_or(ToolError::MissingAddress)?;
    let conn = open_with_options(device.bus, address, &options)?;
    debug!(
        "opened {} device {:#04x} (force: {})",
        device_path(conn.adapter().bus()).display(),
        address,
        conn.force()
    );
    session(conn, Some(address), &cli.cmd)
}

/// Run `cmd`, then close the connection whatever the outcome
///
/// Closing restores backed-up registers. A command error takes precedence
/// over a close error.
fn session<A>(mut conn: Connection<A>, address: Option<u8>, cmd: &Command) -> Result<(), ToolError>
where
    A: SmbusAdapter,
    A::Error: std::error::Error + Send + Sync + 'static,
{
    let result = execute(&mut conn, address, cmd);
    let closed = conn.close();
    result?;
    closed?;
    Ok(())
}

fn execute<A>(conn: &mut Connection<A>, address: Option<u8>, cmd: &Command) -> Result<(), ToolError>
where
    A: SmbusAdapter,
    A::Error: std::error::Error + Send + Sync + 'static,
{
    let device = || address.ok_or(ToolError::MissingAddress);

    match *cmd {
        Command::Get { register, word } => {
            let address = device()?;
            if word {
                println!("{:#06x}", conn.read_word(address, register)?);
            } else {
                println!("{:#04x}", conn.read_reg(address, register)?);
            }
        }
        Command::Set {
            register,
            value,
            word,
        } => {
            let address = device()?;
            if word {
                conn.write_word(address, register, value)?;
            } else {
                let byte = u8::try_from(value).map_err(|_| ToolError::ByteRange(value))?;
                conn.write_reg(address, register, byte)?;
            }
        }
        Command::BlockRead {
            register,
            len,
            smbus,
        } => {
            let address = device()?;
            if smbus {
                let block = conn.read_smbus_block(address, register)?;
                println!("{}", hex_line(&block));
            } else {
                let len = len.ok_or(ToolError::MissingLength)?;
                let mut buf = vec![0u8; len];
                conn.read_block_data(address, register, &mut buf)?;
                println!("{}", hex_line(&buf));
            }
        }
        Command::BlockWrite {
            register,
            ref bytes,
            smbus,
        } => {
            let address = device()?;
            if smbus {
                conn.write_smbus_block(address, register, bytes)?;
            } else {
                conn.write_block_data(address, register, bytes)?;
            }
        }
        Command::Funcs => {
            for line in functionality_lines(conn.functionality()?) {
                println!("{}", line);
            }
        }
    }
    Ok(())
}

fn hex_line(bytes: &[u8]) -> String {
    let bytes: Vec<String> = bytes.iter().map(|b| format!("{:02x}", b)).collect();
    bytes.join(" ")
}

/// Support of each transfer shape, then every raw flag
fn functionality_lines(funcs: Functionality) -> Vec<String> {
    let yes_no = |on: bool| if on { "yes" } else { "no" };

    let transfers = TRANSFERS.iter().map(|&(direction, size, name)| {
        format!("{:<32} {}", name, yes_no(funcs.supports(direction, size)))
    });
    let flags = Functionality::all()
        .iter_names()
        .map(|(name, flag)| format!("{:<32} {}", name, yes_no(funcs.contains(flag))));

    transfers.chain(flags).collect()
}
