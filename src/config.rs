//! Timing and firmware parameters of the protocol engine.

use core::time::Duration;

use crate::instructions::{instruction_id, packet_id};

/// Configuration of a [`crate::Protocol`].
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Config {
	/// The maximum time to wait for one complete response, counted from the start of the receive attempt.
	pub timeout: Duration,

	/// The pause after every write that expects no response.
	///
	/// Devices drop instructions that arrive too soon after a write.
	pub wait_after_write: Duration,

	/// The instruction byte used for sync reads.
	pub sync_read_instruction: u8,

	/// The instruction byte used for sync writes that expect an aggregated response.
	pub sync_write_and_check_instruction: u8,

	/// The packet ID that sync operations are addressed to, and that sends the aggregated response.
	pub sync_id: u8,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			timeout: Duration::from_millis(10),
			wait_after_write: Duration::from_micros(500),
			sync_read_instruction: instruction_id::SYNC_READ,
			sync_write_and_check_instruction: instruction_id::SYNC_WRITE_AND_CHECK,
			sync_id: packet_id::BROADCAST,
		}
	}
}

/// The name of a timing parameter that can be set by name.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Parameter {
	/// The `"timeout"` parameter: [`Config::timeout`].
	Timeout,

	/// The `"waitAfterWrite"` parameter: [`Config::wait_after_write`].
	WaitAfterWrite,
}

impl Parameter {
	/// All parameters that can be set by name.
	pub const ALL: [Parameter; 2] = [Parameter::Timeout, Parameter::WaitAfterWrite];

	/// The name of the parameter.
	pub fn name(self) -> &'static str {
		match self {
			Self::Timeout => "timeout",
			Self::WaitAfterWrite => "waitAfterWrite",
		}
	}
}

impl std::str::FromStr for Parameter {
	type Err = crate::UnknownParameter;

	fn from_str(name: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|parameter| parameter.name() == name)
			.ok_or_else(|| crate::UnknownParameter { name: name.into() })
	}
}

impl Config {
	/// Set the receive timeout.
	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;
		self
	}

	/// Set the pause after each write.
	pub fn with_wait_after_write(mut self, wait_after_write: Duration) -> Self {
		self.wait_after_write = wait_after_write;
		self
	}

	/// Get a timing parameter in seconds.
	pub fn parameter(&self, parameter: Parameter) -> f64 {
		match parameter {
			Parameter::Timeout => self.timeout.as_secs_f64(),
			Parameter::WaitAfterWrite => self.wait_after_write.as_secs_f64(),
		}
	}

	/// Set a timing parameter by name, in seconds.
	///
	/// Accepts `"timeout"` and `"waitAfterWrite"`.
	/// Negative values and NaN are clamped to zero.
	/// Values too large for a [`Duration`], including infinity, saturate to [`Duration::MAX`].
	pub fn set_parameter(&mut self, name: &str, seconds: f64) -> Result<(), crate::UnknownParameter> {
		let value = if seconds.is_nan() || seconds <= 0.0 {
			Duration::ZERO
		} else {
			Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX)
		};
		match name.parse()? {
			Parameter::Timeout => self.timeout = value,
			Parameter::WaitAfterWrite => self.wait_after_write = value,
		}
		Ok(())
	}
}
