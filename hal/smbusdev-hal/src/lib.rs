//! smbusdev Hardware Abstraction Layer
//!
//! This crate defines the seam between the SMBus connection logic and the
//! operating system. A platform HAL implements [`SmbusAdapter`] on top of an
//! open bus handle; the connection in `smbusdev-core` only ever talks to
//! the trait.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Connection (smbusdev-core)             │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  smbusdev-hal (this crate - traits)     │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ smbusdev-hal- │       │  MockAdapter  │
//! │    linux      │       │ (feature mock)│
//! └───────────────┘       └───────────────┘
//! ```

#![no_std]
#![deny(unsafe_code)]

#[cfg(feature = "mock")]
extern crate std;

pub mod adapter;
#[cfg(feature = "mock")]
pub mod mock;

pub use adapter::SmbusAdapter;
#[cfg(feature = "mock")]
pub use mock::{MockAdapter, MockCall, MockError};
