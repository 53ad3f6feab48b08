//! [`Bus`] trait to support different byte transports beneath the protocol.

use core::time::Duration;

#[cfg(feature = "serial2")]
mod serial2;

#[cfg(feature = "serial2")]
pub use self::serial2::SerialBus;

/// A half-duplex byte transport connecting the host to the devices.
///
/// The implementor must configure the line for 8 bit characters, 1 stop bit, no parity and no flow control.
pub trait Bus {
	/// The error type returned by the bus for I/O failures.
	type Error: core::fmt::Debug + core::fmt::Display;

	/// Send all bytes to the bus.
	fn send_data(&mut self, data: &[u8]) -> Result<(), Self::Error>;

	/// Block until all sent data has been transmitted.
	fn flush(&mut self) -> Result<(), Self::Error>;

	/// Discard all data received but not yet read.
	fn clear_input_buffer(&mut self) -> Result<(), Self::Error>;

	/// Wait until at least one byte is available, or until the timeout expires.
	///
	/// Returns true if data is available.
	/// This must be a blocking wait, not a busy loop.
	fn wait_for_data(&mut self, timeout: Duration) -> Result<bool, Self::Error>;

	/// The number of bytes that can be read without blocking.
	fn available(&self) -> usize;

	/// Read available bytes into the buffer without blocking.
	///
	/// Returns the number of bytes read.
	fn read_data(&mut self, buffer: &mut [u8]) -> Result<usize, Self::Error>;
}

impl<B: Bus + ?Sized> Bus for &mut B {
	type Error = B::Error;

	fn send_data(&mut self, data: &[u8]) -> Result<(), Self::Error> {
		(**self).send_data(data)
	}

	fn flush(&mut self) -> Result<(), Self::Error> {
		(**self).flush()
	}

	fn clear_input_buffer(&mut self) -> Result<(), Self::Error> {
		(**self).clear_input_buffer()
	}

	fn wait_for_data(&mut self, timeout: Duration) -> Result<bool, Self::Error> {
		(**self).wait_for_data(timeout)
	}

	fn available(&self) -> usize {
		(**self).available()
	}

	fn read_data(&mut self, buffer: &mut [u8]) -> Result<usize, Self::Error> {
		(**self).read_data(buffer)
	}
}
