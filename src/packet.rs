//! Encoding of a single protocol 1.0 frame.
//!
//! A frame looks like this:
//! ```text
//! [0xFF] [0xFF] [ID] [LENGTH] [INSTRUCTION or ERROR] [PARAMETER...] [CHECKSUM]
//! ```
//!
//! The length field counts the parameters plus two (the instruction/error byte and the checksum).
//! The checksum is the inverted sum of all bytes from the ID up to and including the last parameter.

pub(crate) const HEADER_PREFIX: [u8; 2] = [0xFF, 0xFF];

/// The number of bytes before the parameters: two sync bytes, ID, length and instruction/error.
pub(crate) const HEADER_SIZE: usize = 5;

/// The maximum number of parameters in a frame, limited by the one byte length field.
pub const MAX_PARAMETERS: usize = 0xFF - 2;

const ID_INDEX: usize = 2;
const LENGTH_INDEX: usize = 3;
const INSTRUCTION_INDEX: usize = 4;

/// Compute the checksum over the ID, length, instruction/error and parameter bytes of a frame.
pub fn checksum(data: &[u8]) -> u8 {
	!data.iter().fold(0u8, |sum, &byte| sum.wrapping_add(byte))
}

/// A single frame with a fixed number of parameters.
///
/// The buffer is sized for the whole frame at construction and never grows.
/// Parameters are added with [`Self::append()`] until the packet is full.
/// Call [`Self::prepare()`] once all parameters are added to fill in the sync bytes and checksum.
#[derive(Clone, Eq, PartialEq)]
pub struct Packet {
	buffer: Box<[u8]>,
	position: usize,
}

impl Packet {
	/// Create an instruction packet for a device.
	///
	/// # Panics
	/// Panics if `parameters` exceeds [`MAX_PARAMETERS`].
	pub fn new(id: u8, instruction: u8, parameters: usize) -> Self {
		let mut packet = Self::status(id, parameters);
		packet.buffer[INSTRUCTION_INDEX] = instruction;
		packet
	}

	/// Create an empty status packet, as sent by a device in response to an instruction.
	///
	/// The error byte is zero until set with [`Self::set_error()`].
	///
	/// # Panics
	/// Panics if `parameters` exceeds [`MAX_PARAMETERS`].
	pub fn status(id: u8, parameters: usize) -> Self {
		assert!(parameters <= MAX_PARAMETERS, "too many parameters for a single frame: {}", parameters);
		let mut buffer = vec![0; HEADER_SIZE + parameters + 1].into_boxed_slice();
		buffer[ID_INDEX] = id;
		buffer[LENGTH_INDEX] = parameters as u8 + 2;
		Self { buffer, position: 0 }
	}

	/// The packet ID.
	pub fn id(&self) -> u8 {
		self.buffer[ID_INDEX]
	}

	/// The raw value of the length field.
	pub fn length_byte(&self) -> u8 {
		self.buffer[LENGTH_INDEX]
	}

	/// The instruction of an instruction packet.
	pub fn instruction(&self) -> u8 {
		self.buffer[INSTRUCTION_INDEX]
	}

	/// The error byte of a status packet.
	///
	/// This shares the position of the instruction byte in an instruction packet.
	pub fn error(&self) -> u8 {
		self.buffer[INSTRUCTION_INDEX]
	}

	/// Set the error byte of a status packet.
	pub fn set_error(&mut self, error: u8) {
		self.buffer[INSTRUCTION_INDEX] = error;
	}

	/// The number of parameters the packet was created with.
	pub fn parameter_count(&self) -> usize {
		self.buffer.len() - HEADER_SIZE - 1
	}

	/// The parameters of the packet.
	///
	/// Parameters that were not yet appended are zero.
	pub fn parameters(&self) -> &[u8] {
		&self.buffer[HEADER_SIZE..][..self.parameter_count()]
	}

	/// Check if all parameters have been appended.
	pub fn is_full(&self) -> bool {
		self.position == self.parameter_count()
	}

	/// Append a single parameter byte.
	///
	/// Appending to a full packet is a caller error.
	/// It is caught by a debug assertion, and ignored in release builds.
	pub fn append(&mut self, byte: u8) {
		debug_assert!(!self.is_full(), "append to a full packet");
		if !self.is_full() {
			self.buffer[HEADER_SIZE + self.position] = byte;
			self.position += 1;
		}
	}

	/// Append a slice of parameter bytes.
	///
	/// The slice must fit in the remaining parameter space.
	/// It is caught by a debug assertion, and nothing is appended in release builds.
	pub fn append_slice(&mut self, data: &[u8]) {
		let remaining = self.parameter_count() - self.position;
		debug_assert!(data.len() <= remaining, "append of {} bytes to a packet with room for {}", data.len(), remaining);
		if data.len() <= remaining {
			let start = HEADER_SIZE + self.position;
			self.buffer[start..][..data.len()].copy_from_slice(data);
			self.position += data.len();
		}
	}

	/// Compute the checksum of the packet as it is now.
	pub fn compute_checksum(&self) -> u8 {
		checksum(&self.buffer[ID_INDEX..self.checksum_index()])
	}

	/// The checksum currently stored in the frame.
	pub fn stored_checksum(&self) -> u8 {
		self.buffer[self.checksum_index()]
	}

	/// Stamp the sync bytes and the checksum on the frame.
	///
	/// Must be called after all parameters are appended and before the frame is sent.
	pub fn prepare(&mut self) {
		debug_assert!(self.is_full(), "preparing a packet with missing parameters");
		self.buffer[..2].copy_from_slice(&HEADER_PREFIX);
		let index = self.checksum_index();
		self.buffer[index] = self.compute_checksum();
	}

	/// The total size of the frame in bytes.
	pub fn frame_len(&self) -> usize {
		self.buffer.len()
	}

	/// The raw bytes of the frame.
	///
	/// The sync bytes and checksum are only valid after [`Self::prepare()`].
	pub fn as_bytes(&self) -> &[u8] {
		&self.buffer
	}

	fn checksum_index(&self) -> usize {
		self.buffer.len() - 1
	}
}

impl std::fmt::Debug for Packet {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Packet")
			.field("id", &self.id())
			.field("instruction", &self.instruction())
			.field("parameters", &format_args!("{:02X?}", self.parameters()))
			.finish()
	}
}
