//! i2c-dev ioctl request codes
//!
//! Values from `<linux/i2c-dev.h>`. They are fixed by the kernel ABI.

/// Select the slave address for subsequent transfers
pub const I2C_SLAVE: u32 = 0x0703;

/// Select the slave address even if a kernel driver has claimed it
pub const I2C_SLAVE_FORCE: u32 = 0x0706;

/// Query the adapter functionality mask
pub const I2C_FUNCS: u32 = 0x0705;

/// Perform a combined SMBus transfer
pub const I2C_SMBUS: u32 = 0x0720;

/// Address-select request for the given addressing mode
pub const fn select_request(force: bool) -> u32 {
    if force {
        I2C_SLAVE_FORCE
    } else {
        I2C_SLAVE
    }
}
