//! Byte-by-byte decoding of status packets.

use crate::packet::Packet;
use crate::ResponseState;

/// The position of the decoder in a frame.
#[derive(Debug)]
enum State {
	Sync1,
	Sync2,
	Id,
	Length,
	Error(Packet),
	Body(Packet),
}

/// A decoded status packet together with the state derived from its error byte.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct StatusPacket {
	/// The packet as received.
	pub packet: Packet,

	/// The response state, always with [`ResponseState::OK`] set.
	pub state: ResponseState,
}

/// Decoder for status packets from one expected device.
///
/// Feed received bytes one at a time with [`Self::feed()`].
/// Noise before a frame is skipped.
/// Frames from other devices and frames with an impossible length field are dropped,
/// and the decoder keeps looking for a frame from the expected device.
#[derive(Debug)]
pub struct Decoder {
	expected_id: u8,
	state: State,
	fault: ResponseState,
}

impl Decoder {
	/// Create a decoder that accepts status packets from `expected_id` only.
	pub fn new(expected_id: u8) -> Self {
		Self {
			expected_id,
			state: State::Sync1,
			fault: ResponseState::QUIET,
		}
	}

	/// The last non-fatal fault seen while decoding.
	///
	/// This is [`ResponseState::BAD_ID`] or [`ResponseState::BAD_SIZE`] if a frame was dropped,
	/// or [`ResponseState::QUIET`] otherwise.
	/// It is the outcome of a transaction that times out before a frame is complete.
	pub fn fault(&self) -> ResponseState {
		self.fault
	}

	/// Feed a single byte to the decoder.
	///
	/// Returns `None` while the frame is incomplete.
	/// When a frame is complete, it returns the status packet if the checksum is valid and the device reports no fatal error,
	/// and the failure otherwise.
	pub fn feed(&mut self, byte: u8) -> Option<Result<StatusPacket, ResponseState>> {
		let (next, output) = match std::mem::replace(&mut self.state, State::Sync1) {
			State::Sync1 if byte == 0xFF => (State::Sync2, None),
			State::Sync2 if byte == 0xFF => (State::Id, None),
			State::Sync1 | State::Sync2 => (State::Sync1, None),
			// 0xFF is not a valid ID, so it can only be an extra sync byte.
			State::Id if byte == 0xFF => (State::Id, None),
			State::Id if byte == self.expected_id => (State::Length, None),
			State::Id => {
				debug!("dropping frame from unexpected ID {:#04X}, expected {:#04X}", byte, self.expected_id);
				self.fault = ResponseState::BAD_ID;
				(State::Sync1, None)
			},
			State::Length if byte >= 2 => (State::Error(Packet::status(self.expected_id, usize::from(byte - 2))), None),
			State::Length => {
				debug!("dropping frame with invalid length field {}", byte);
				self.fault = ResponseState::BAD_SIZE;
				(State::Sync1, None)
			},
			State::Error(mut response) => {
				response.set_error(byte);
				(State::Body(response), None)
			},
			State::Body(mut response) => {
				if response.is_full() {
					(State::Sync1, Some(Self::validate(response, byte)))
				} else {
					response.append(byte);
					(State::Body(response), None)
				}
			},
		};
		self.state = next;
		output
	}

	fn validate(response: Packet, checksum: u8) -> Result<StatusPacket, ResponseState> {
		let computed = response.compute_checksum();
		if computed != checksum {
			warn!(
				"invalid checksum in status packet from {:#04X}: message claims {:#04X}, computed {:#04X}",
				response.id(),
				checksum,
				computed
			);
			return Err(ResponseState::BAD_CHECKSUM);
		}

		trace!("read status packet: {:?}, error: {:#04X}", response, response.error());
		let state = ResponseState::from_device_error(response.error());
		if state.is_ok() {
			Ok(StatusPacket { packet: response, state })
		} else {
			Err(state)
		}
	}
}
