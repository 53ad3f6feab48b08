//! The outcome of a transaction with a device.

/// Bits of the error byte in a protocol 1.0 status packet.
#[rustfmt::skip]
pub mod device_error {
	pub const VOLTAGE     : u8 = 0x01;
	pub const ANGLE       : u8 = 0x02;
	pub const OVERHEAT    : u8 = 0x04;
	pub const RANGE       : u8 = 0x08;
	pub const CHECKSUM    : u8 = 0x10;
	pub const OVERLOAD    : u8 = 0x20;
	pub const INSTRUCTION : u8 = 0x40;
}

/// The result of a transaction, as a set of flags.
///
/// A successful transaction has the [`Self::OK`] bit set,
/// possibly together with the status bits [`Self::OVERLOAD`], [`Self::OVERHEAT`], [`Self::BAD_VOLTAGE`] and [`Self::ALERT`].
/// The status bits are only meaningful when [`Self::OK`] is set.
///
/// A failed transaction has exactly one of the failure bits set and never [`Self::OK`].
/// Only trust the data of a response if [`Self::is_ok()`] returns true.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct ResponseState(u16);

impl ResponseState {
	/// A valid response was received.
	pub const OK: Self = Self(1 << 0);

	/// The device reports an overload.
	pub const OVERLOAD: Self = Self(1 << 1);

	/// The device reports that it is overheating.
	pub const OVERHEAT: Self = Self(1 << 2);

	/// The device reports an input voltage out of range.
	pub const BAD_VOLTAGE: Self = Self(1 << 3);

	/// The device reports an alert.
	pub const ALERT: Self = Self(1 << 4);

	/// No (complete) response was received before the timeout.
	pub const QUIET: Self = Self(1 << 5);

	/// The response had an invalid checksum.
	pub const BAD_CHECKSUM: Self = Self(1 << 6);

	/// The device rejected the instruction.
	pub const DEVICE_BAD_INSTRUCTION: Self = Self(1 << 7);

	/// The device received the instruction with an invalid checksum.
	pub const DEVICE_BAD_CHECKSUM: Self = Self(1 << 8);

	/// A response from an unexpected device was seen.
	pub const BAD_ID: Self = Self(1 << 9);

	/// A response with an invalid length field was seen.
	pub const BAD_SIZE: Self = Self(1 << 10);

	const STATUS_MASK: u16 = Self::OVERLOAD.0 | Self::OVERHEAT.0 | Self::BAD_VOLTAGE.0 | Self::ALERT.0;

	/// Get the raw bits.
	pub const fn bits(self) -> u16 {
		self.0
	}

	/// Check if the OK bit is set.
	pub const fn is_ok(self) -> bool {
		self.0 & Self::OK.0 != 0
	}

	/// Check if all bits of `other` are set in `self`.
	pub const fn contains(self, other: Self) -> bool {
		self.0 & other.0 == other.0
	}

	/// Check if any of the status bits (overload, overheat, bad voltage, alert) are set.
	pub const fn has_status(self) -> bool {
		self.0 & Self::STATUS_MASK != 0
	}

	/// Map the error byte of a received status packet to a response state.
	///
	/// A checksum or instruction error reported by the device is fatal and the payload must not be used.
	/// Other error bits are reported as status bits next to [`Self::OK`].
	pub fn from_device_error(error: u8) -> Self {
		if error & device_error::CHECKSUM != 0 {
			Self::DEVICE_BAD_CHECKSUM
		} else if error & device_error::INSTRUCTION != 0 {
			Self::DEVICE_BAD_INSTRUCTION
		} else {
			let mut state = Self::OK;
			if error & device_error::VOLTAGE != 0 {
				state |= Self::BAD_VOLTAGE;
			}
			if error & device_error::OVERHEAT != 0 {
				state |= Self::OVERHEAT;
			}
			if error & device_error::OVERLOAD != 0 {
				state |= Self::OVERLOAD;
			}
			state
		}
	}

	fn names(self) -> impl Iterator<Item = &'static str> {
		const NAMES: [(ResponseState, &str); 11] = [
			(ResponseState::OK, "ok"),
			(ResponseState::OVERLOAD, "overload"),
			(ResponseState::OVERHEAT, "overheat"),
			(ResponseState::BAD_VOLTAGE, "bad voltage"),
			(ResponseState::ALERT, "alert"),
			(ResponseState::QUIET, "quiet"),
			(ResponseState::BAD_CHECKSUM, "bad checksum"),
			(ResponseState::DEVICE_BAD_INSTRUCTION, "device reported bad instruction"),
			(ResponseState::DEVICE_BAD_CHECKSUM, "device reported bad checksum"),
			(ResponseState::BAD_ID, "bad id"),
			(ResponseState::BAD_SIZE, "bad size"),
		];
		NAMES
			.into_iter()
			.filter(move |(flag, _)| self.contains(*flag))
			.map(|(_, name)| name)
	}
}

/// A response from a device to a typed read.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Response<T> {
	/// The device that sent the response.
	pub motor_id: u8,

	/// The response state, always with [`ResponseState::OK`] set.
	///
	/// Check the status bits for overload, overheating and voltage problems.
	pub state: ResponseState,

	/// The data from the device.
	pub data: T,
}

impl core::ops::BitOr for ResponseState {
	type Output = Self;

	fn bitor(self, other: Self) -> Self {
		Self(self.0 | other.0)
	}
}

impl core::ops::BitOrAssign for ResponseState {
	fn bitor_assign(&mut self, other: Self) {
		self.0 |= other.0;
	}
}

impl std::fmt::Debug for ResponseState {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "ResponseState({:#05X}: {})", self.0, self)
	}
}

impl std::fmt::Display for ResponseState {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		let mut names = self.names();
		match names.next() {
			None => write!(f, "none"),
			Some(first) => {
				write!(f, "{}", first)?;
				for name in names {
					write!(f, " | {}", name)?;
				}
				Ok(())
			},
		}
	}
}
