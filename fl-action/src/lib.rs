//! # CommFPGA Action Language
//!
//! This crate implements the small command language used to exchange data with an
//! FPGALink device over its CommFPGA channels.
//!
//! ## Overview
//!
//! An *action string* is one or more commands separated by `;`. Each command is
//! parsed and executed immediately against a device implementing [`Channels`]:
//!
//! - `r<chan>[ <len>[ "<file>"]]`: read `len` bytes (default 1) from a channel,
//!   either into the in-memory dump or into a file
//! - `w<chan>[ <hexbytes> | "<file>"]`: write a literal hex byte run or the
//!   contents of a file to a channel
//! - `+<conduit>`: select the active conduit (FIFO mode)
//!
//! All numbers are hexadecimal. Channels range over `0..=7f` and conduits over
//! `0..=ff`. File names may be quoted with either `"` or `'`.
//!
//! ## Basic Usage
//!
//! ```
//! use std::time::Duration;
//! use fl_action::{Channels, error::DeviceError, interpreter::Builder};
//!
//! /// Answers every read with `0x42`.
//! struct Constant;
//!
//! impl Channels for Constant {
//!     fn read_channel(&mut self, _: Duration, _: u8, buf: &mut [u8]) -> Result<(), DeviceError> {
//!         buf.fill(0x42);
//!         Ok(())
//!     }
//!
//!     fn write_channel(&mut self, _: Duration, _: u8, _: &[u8]) -> Result<(), DeviceError> {
//!         Ok(())
//!     }
//!
//!     fn set_conduit(&mut self, _: u8) -> Result<(), DeviceError> {
//!         Ok(())
//!     }
//! }
//!
//! let mut interpreter = Builder::new().build(Constant);
//! let data = interpreter.execute("w0 1a2b;r1 3", &mut std::io::sink()).unwrap();
//! assert_eq!(data, vec![0x42; 3]);
//! ```
//!
//! ## Error Handling
//!
//! The first failing command ends the action string with an [`error::ActionError`]
//! carrying the [`error::ErrorKind`] and the column at which parsing stopped.
//! [`error::ActionError::report`] renders the diagnostic shown to users, and
//! [`error::ErrorKind::code`] the process exit code.
//!
//! ## Logging
//!
//! Executed commands are logged at `debug` level and transferred bytes at
//! `trace` level through the `log` crate.
use std::time::Duration;

use crate::error::DeviceError;

pub mod bench;
pub mod buffer;
pub mod checksum;
pub mod command;
pub mod dump;
pub mod error;
pub mod interpreter;
pub mod scanner;

pub use command::Command;
pub use interpreter::{Builder, Config, Interpreter};

/// Trait that devices must implement to be driven by an [`Interpreter`].
///
/// Every call is blocking and either transfers the complete buffer or fails.
/// There is no partial transfer and no retry.
pub trait Channels {
    /// Read exactly `buf.len()` bytes from `channel`.
    fn read_channel(
        &mut self,
        timeout: Duration,
        channel: u8,
        buf: &mut [u8],
    ) -> Result<(), DeviceError>;

    /// Write all of `data` to `channel`.
    fn write_channel(
        &mut self,
        timeout: Duration,
        channel: u8,
        data: &[u8],
    ) -> Result<(), DeviceError>;

    /// Select the conduit over which channel traffic flows.
    fn set_conduit(&mut self, conduit: u8) -> Result<(), DeviceError>;
}

impl<T: Channels + ?Sized> Channels for &mut T {
    fn read_channel(
        &mut self,
        timeout: Duration,
        channel: u8,
        buf: &mut [u8],
    ) -> Result<(), DeviceError> {
        (**self).read_channel(timeout, channel, buf)
    }

    fn write_channel(
        &mut self,
        timeout: Duration,
        channel: u8,
        data: &[u8],
    ) -> Result<(), DeviceError> {
        (**self).write_channel(timeout, channel, data)
    }

    fn set_conduit(&mut self, conduit: u8) -> Result<(), DeviceError> {
        (**self).set_conduit(conduit)
    }
}

impl<T: Channels + ?Sized> Channels for Box<T> {
    fn read_channel(
        &mut self,
        timeout: Duration,
        channel: u8,
        buf: &mut [u8],
    ) -> Result<(), DeviceError> {
        (**self).read_channel(timeout, channel, buf)
    }

    fn write_channel(
        &mut self,
        timeout: Duration,
        channel: u8,
        data: &[u8],
    ) -> Result<(), DeviceError> {
        (**self).write_channel(timeout, channel, data)
    }

    fn set_conduit(&mut self, conduit: u8) -> Result<(), DeviceError> {
        (**self).set_conduit(conduit)
    }
}
