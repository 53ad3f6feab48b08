//! [`Bus`] implementation using the `serial2` crate.

use std::collections::VecDeque;
use std::path::Path;
use std::time::Duration;

use super::Bus;

/// A [`Bus`] on top of a [`serial2::SerialPort`].
///
/// The serial port can not report how many bytes are waiting in the kernel,
/// so [`Bus::wait_for_data()`] reads whatever arrives into an internal buffer,
/// which is then drained by [`Bus::read_data()`].
pub struct SerialBus {
	port: serial2::SerialPort,
	pending: VecDeque<u8>,
	read_chunk: Box<[u8]>,
}

impl SerialBus {
	/// Open a serial port with the given baud rate.
	pub fn open(path: impl AsRef<Path>, baud_rate: u32) -> std::io::Result<Self> {
		let port = serial2::SerialPort::open(path, baud_rate)?;
		Ok(Self::new(port))
	}

	/// Create a bus for an open serial port.
	///
	/// The serial port must already be configured in raw mode with the correct baud rate.
	pub fn new(port: serial2::SerialPort) -> Self {
		Self {
			port,
			pending: VecDeque::with_capacity(256),
			read_chunk: vec![0; 256].into_boxed_slice(),
		}
	}

	/// Get a reference to the underlying serial port.
	pub fn serial_port(&self) -> &serial2::SerialPort {
		&self.port
	}

	/// Consume the bus to get ownership of the serial port.
	///
	/// Received bytes that were not yet read are discarded.
	pub fn into_serial_port(self) -> serial2::SerialPort {
		self.port
	}
}

impl core::fmt::Debug for SerialBus {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		#[derive(Debug)]
		#[allow(dead_code)] // Dead code analysis ignores derive debug impls, but that is the whole point of this struct.
		enum Raw {
			#[cfg(unix)]
			Fd(std::os::unix::io::RawFd),
			#[cfg(windows)]
			Handle(std::os::windows::io::RawHandle),
		}

		#[cfg(unix)]
		let raw = {
			use std::os::unix::io::AsRawFd;
			Raw::Fd(self.port.as_raw_fd())
		};
		#[cfg(windows)]
		let raw = {
			use std::os::windows::io::AsRawHandle;
			Raw::Handle(self.port.as_raw_handle())
		};

		f.debug_struct("SerialBus")
			.field("port", &raw)
			.field("pending", &self.pending.len())
			.finish()
	}
}

impl Bus for SerialBus {
	type Error = std::io::Error;

	fn send_data(&mut self, data: &[u8]) -> Result<(), Self::Error> {
		self.port.write_all(data)
	}

	fn flush(&mut self) -> Result<(), Self::Error> {
		self.port.flush()
	}

	fn clear_input_buffer(&mut self) -> Result<(), Self::Error> {
		self.pending.clear();
		self.port.discard_input_buffer()
	}

	fn wait_for_data(&mut self, timeout: Duration) -> Result<bool, Self::Error> {
		if !self.pending.is_empty() {
			return Ok(true);
		}
		if timeout.is_zero() {
			return Ok(false);
		}

		self.port.set_read_timeout(timeout)?;
		match self.port.read(&mut self.read_chunk) {
			Ok(count) => {
				self.pending.extend(&self.read_chunk[..count]);
				Ok(count > 0)
			},
			Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(false),
			Err(e) => Err(e),
		}
	}

	fn available(&self) -> usize {
		self.pending.len()
	}

	fn read_data(&mut self, buffer: &mut [u8]) -> Result<usize, Self::Error> {
		let count = buffer.len().min(self.pending.len());
		for (dest, byte) in buffer.iter_mut().zip(self.pending.drain(..count)) {
			*dest = byte;
		}
		Ok(count)
	}
}
