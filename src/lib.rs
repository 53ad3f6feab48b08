//! An implementation of the [Dynamixel Protocol 1.0](https://emanual.robotis.com/docs/en/dxl/protocol1/).
//!
//! This library aims to provide a easy to use but low level implementation of the Dynamixel Protocol 1.0.
//! That means it allows you to execute arbitrary commands with arbitrary parameters.
//! It does not know the register maps of specific devices, and does not perform unit conversions.
//!
//! All communication goes through a [`Protocol`] engine that owns a [`Bus`].
//! The engine builds each instruction [`Packet`], sends it, and for instructions that expect a reply,
//! decodes the status packet byte by byte until it is complete or the configured timeout expires.
//!
//! The result of a transaction is reported as a [`ResponseState`].
//! Always check [`ResponseState::is_ok()`] before using data read from a device.
//! Only I/O errors of the bus and invalid arguments are reported as an [`Error`].
//!
//! If the `"serial2"` feature is enabled (the default), [`SerialBus`] implements [`Bus`] for a serial port.
//!
//! # Optional features
//!
//! You can enable the `log` feature to have the library use `log::trace!()` to log all sent instructions and received replies.

#[macro_use]
mod log;

pub mod bus;
pub mod config;
pub mod decoder;
pub mod instructions;
pub mod packet;

mod endian;
mod error;
mod protocol;
mod response;

pub use bus::Bus;
#[cfg(feature = "serial2")]
pub use bus::SerialBus;
pub use config::Config;
pub use error::*;
pub use packet::Packet;
pub use protocol::Protocol;
pub use response::{device_error, Response, ResponseState};
