//! Device configuration file
//!
//! Loads a [`DeviceConfig`] from TOML and merges command-line overrides.
//!
//! ```toml
//! bus = 1
//! address = 0x50
//! force = false
//! backup_registers = [0x10, 0x11]
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info};
use smbusdev_core::{ConfigError, DeviceConfig};
use thiserror::Error;

use crate::cli::Cli;

/// Tool errors
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("reading {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parsing {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("no bus given (use --bus or a config file)")]
    MissingBus,
    #[error("no device address given (use --address or a config file)")]
    MissingAddress,
    #[error("I2C block reads need a length")]
    MissingLength,
    #[error("value {0:#x} does not fit in a byte")]
    ByteRange(u16),
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Smbus(Box<dyn std::error::Error + Send + Sync>),
}

impl<E> From<smbusdev_core::Error<E>> for ToolError
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(e: smbusdev_core::Error<E>) -> Self {
        ToolError::Smbus(Box::new(e))
    }
}

/// Parse a device configuration from TOML text
pub fn parse_config(text: &str) -> Result<DeviceConfig, toml::de::Error> {
    toml::from_str(text)
}

/// Load a device configuration file
pub fn load(path: &Path) -> Result<DeviceConfig, ToolError> {
    info!("Loading configuration from {}", path.display());

    let text = fs::read_to_string(path).map_err(|source| ToolError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_config(&text).map_err(|source| ToolError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    log_config_summary(&config);
    Ok(config)
}

/// Combine the optional config file with command-line flags
///
/// Flags win over file values; `force` is set if either asks for it.
pub fn resolve(file: Option<DeviceConfig>, cli: &Cli) -> Result<DeviceConfig, ToolError> {
    let from_file = file.is_some();
    let mut config = file.unwrap_or_default();

    match cli.bus {
        Some(bus) => config.bus = bus,
        None if !from_file => return Err(ToolError::MissingBus),
        None => {}
    }
    if cli.address.is_some() {
        config.address = cli.address;
    }
    config.force |= cli.force;

    Ok(config)
}

fn log_config_summary(config: &DeviceConfig) {
    debug!("  bus {}", config.bus);
    match config.address {
        Some(addr) => debug!("  address {:#04x}", addr),
        None => debug!("  no address"),
    }
    debug!("  force: {}", config.force);
    debug!("  {} backup registers", config.backup_registers.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_parse_full_config() {
        let config = parse_config(
            r#"
            # EEPROM on the HAT header
            bus = 1
            address = 0x50
            force = true
            backup_registers = [0x10, 0x11]
            "#,
        )
        .unwrap();

        assert_eq!(config.bus, 1);
        assert_eq!(config.address, Some(0x50));
        assert!(config.force);
        assert_eq!(&config.backup_registers[..], &[0x10, 0x11]);
    }

    #[test]
    fn test_parse_defaults() {
        let config = parse_config("bus = 3").unwrap();

        assert_eq!(config.bus, 3);
        assert_eq!(config.address, None);
        assert!(!config.force);
        assert!(config.backup_registers.is_empty());
    }

    #[test]
    fn test_parse_rejects_wide_address() {
        assert!(parse_config("bus = 1\naddress = 0x1FF").is_err());
    }

    #[test]
    fn test_resolve_flags_override_file() {
        let file = parse_config("bus = 1\naddress = 0x50").unwrap();
        let cli = Cli::parse_from(["smbus", "--bus", "4", "-a", "0x51", "--force", "funcs"]);

        let config = resolve(Some(file), &cli).unwrap();

        assert_eq!(config.bus, 4);
        assert_eq!(config.address, Some(0x51));
        assert!(config.force);
    }

    #[test]
    fn test_resolve_needs_bus() {
        let cli = Cli::parse_from(["smbus", "funcs"]);
        assert!(matches!(resolve(None, &cli), Err(ToolError::MissingBus)));
    }

    #[test]
    fn test_resolve_keeps_file_values() {
        let file = parse_config("bus = 2\naddress = 0x68\nbackup_registers = [0x6B]").unwrap();
        let cli = Cli::parse_from(["smbus", "get", "0x75"]);

        let config = resolve(Some(file), &cli).unwrap();

        assert_eq!(config.bus, 2);
        assert_eq!(config.address, Some(0x68));
        assert_eq!(config.options().unwrap().backup_registers(), &[0x6B]);
    }
}
