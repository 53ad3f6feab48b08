use crate::ResponseState;

/// A hard failure of a protocol operation.
///
/// Faults of the devices or of the communication (no response, corrupt response, device errors)
/// are not reported through this type, but as a [`ResponseState`].
#[derive(Debug)]
pub enum Error<E> {
	/// The bus failed to perform I/O.
	Io(E),

	/// The lists passed to a sync operation do not have the same length.
	LengthMismatch(LengthMismatch),

	/// A buffer passed to an operation is too small.
	BufferTooSmall(BufferTooSmall),

	/// The instruction does not fit in a single frame.
	FrameTooLarge(FrameTooLarge),

	/// The device did not give a valid response to a read that requires one.
	Response(ResponseState),
}

/// The lists passed to a sync operation do not have the same length.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct LengthMismatch {
	pub ids: usize,
	pub data: usize,
}

/// A buffer is too small for the requested number of bytes.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct BufferTooSmall {
	pub required_size: usize,
	pub total_size: usize,
}

/// The instruction has too many parameters to fit in a single frame.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FrameTooLarge {
	pub parameters: usize,
	pub max: usize,
}

/// The name of a configuration parameter is not known.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct UnknownParameter {
	pub name: String,
}

impl LengthMismatch {
	pub fn check(ids: usize, data: usize) -> Result<(), Self> {
		if ids == data {
			Ok(())
		} else {
			Err(Self { ids, data })
		}
	}
}

impl BufferTooSmall {
	pub fn check(required_size: usize, total_size: usize) -> Result<(), Self> {
		if required_size <= total_size {
			Ok(())
		} else {
			Err(Self {
				required_size,
				total_size,
			})
		}
	}
}

impl FrameTooLarge {
	pub fn check(parameters: usize) -> Result<(), Self> {
		let max = crate::packet::MAX_PARAMETERS;
		if parameters <= max {
			Ok(())
		} else {
			Err(Self { parameters, max })
		}
	}
}

impl<E: std::fmt::Debug + std::fmt::Display> std::error::Error for Error<E> {}
impl std::error::Error for LengthMismatch {}
impl std::error::Error for BufferTooSmall {}
impl std::error::Error for FrameTooLarge {}
impl std::error::Error for UnknownParameter {}

impl<E> From<LengthMismatch> for Error<E> {
	fn from(other: LengthMismatch) -> Self {
		Self::LengthMismatch(other)
	}
}

impl<E> From<BufferTooSmall> for Error<E> {
	fn from(other: BufferTooSmall) -> Self {
		Self::BufferTooSmall(other)
	}
}

impl<E> From<FrameTooLarge> for Error<E> {
	fn from(other: FrameTooLarge) -> Self {
		Self::FrameTooLarge(other)
	}
}

impl<E: std::fmt::Display> std::fmt::Display for Error<E> {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			Self::Io(e) => write!(f, "bus I/O failed: {}", e),
			Self::LengthMismatch(e) => write!(f, "{}", e),
			Self::BufferTooSmall(e) => write!(f, "{}", e),
			Self::FrameTooLarge(e) => write!(f, "{}", e),
			Self::Response(state) => write!(f, "no valid response: {}", state),
		}
	}
}

impl std::fmt::Display for LengthMismatch {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "got {} IDs but data for {} devices", self.ids, self.data)
	}
}

impl std::fmt::Display for BufferTooSmall {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(
			f,
			"buffer is too small: need {} bytes, but the size is {}",
			self.required_size, self.total_size
		)
	}
}

impl std::fmt::Display for FrameTooLarge {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(
			f,
			"instruction has {} parameters, but a frame can hold at most {}",
			self.parameters, self.max
		)
	}
}

impl std::fmt::Display for UnknownParameter {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "unknown parameter: {:?}", self.name)
	}
}
