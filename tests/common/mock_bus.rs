use std::collections::VecDeque;
use std::time::{Duration, Instant};

use dynamixel1::Bus;
use log::trace;

use super::MockDevices;

/// A frame sent by the engine.
#[derive(Debug, Clone)]
pub struct SentFrame {
	pub data: Vec<u8>,
	pub time: Instant,
}

/// A bus that records everything sent and replies from a script or a set of simulated devices.
pub struct MockBus {
	/// All frames sent on the bus, in order.
	pub sent: Vec<SentFrame>,

	/// Simulated devices answering instructions.
	///
	/// If set, scripted replies are ignored.
	pub devices: Option<MockDevices>,

	/// Replies to send, one per sent frame.
	pub replies: VecDeque<Vec<u8>>,

	/// Bytes injected before every reply.
	pub noise: Vec<u8>,

	/// Maximum number of bytes returned by a single read.
	pub chunk_size: usize,

	/// Bytes repeated on the line forever, as if another device keeps talking.
	///
	/// Each repetition is delivered when the previous one has been read.
	pub chatter: Vec<u8>,

	/// Number of times the input buffer was cleared.
	pub clear_count: usize,

	pending: VecDeque<u8>,
}

impl MockBus {
	/// A bus without any devices.
	pub fn silent() -> Self {
		Self {
			sent: Vec::new(),
			devices: None,
			replies: VecDeque::new(),
			noise: Vec::new(),
			chunk_size: usize::MAX,
			chatter: Vec::new(),
			clear_count: 0,
			pending: VecDeque::new(),
		}
	}

	/// A bus that answers each sent frame with the next scripted reply.
	pub fn scripted(replies: impl IntoIterator<Item = Vec<u8>>) -> Self {
		Self {
			replies: replies.into_iter().collect(),
			..Self::silent()
		}
	}

	/// A bus with simulated devices.
	pub fn with_devices(devices: MockDevices) -> Self {
		Self {
			devices: Some(devices),
			..Self::silent()
		}
	}

	/// Get the simulated devices.
	pub fn devices(&self) -> &MockDevices {
		self.devices.as_ref().expect("bus has no simulated devices")
	}

	/// Get the simulated devices for modification.
	pub fn devices_mut(&mut self) -> &mut MockDevices {
		self.devices.as_mut().expect("bus has no simulated devices")
	}

	/// Get the data of all sent frames.
	pub fn sent_data(&self) -> Vec<Vec<u8>> {
		self.sent.iter().map(|frame| frame.data.clone()).collect()
	}
}

impl Bus for MockBus {
	type Error = std::io::Error;

	fn send_data(&mut self, data: &[u8]) -> Result<(), Self::Error> {
		trace!("mock bus received: {:02X?}", data);
		self.sent.push(SentFrame {
			data: data.to_vec(),
			time: Instant::now(),
		});

		let reply = match &mut self.devices {
			Some(devices) => devices.handle(data),
			None => self.replies.pop_front(),
		};
		if let Some(reply) = reply {
			self.pending.extend(&self.noise);
			self.pending.extend(reply);
		}
		Ok(())
	}

	fn flush(&mut self) -> Result<(), Self::Error> {
		Ok(())
	}

	fn clear_input_buffer(&mut self) -> Result<(), Self::Error> {
		self.clear_count += 1;
		self.pending.clear();
		Ok(())
	}

	fn wait_for_data(&mut self, timeout: Duration) -> Result<bool, Self::Error> {
		if self.pending.is_empty() && !self.chatter.is_empty() {
			std::thread::sleep(timeout.min(Duration::from_micros(100)));
			self.pending.extend(&self.chatter);
			Ok(true)
		} else if self.pending.is_empty() {
			std::thread::sleep(timeout);
			Ok(false)
		} else {
			Ok(true)
		}
	}

	fn available(&self) -> usize {
		self.pending.len().min(self.chunk_size)
	}

	fn read_data(&mut self, buffer: &mut [u8]) -> Result<usize, Self::Error> {
		let count = buffer.len().min(self.available());
		for (dest, byte) in buffer.iter_mut().zip(self.pending.drain(..count)) {
			*dest = byte;
		}
		Ok(count)
	}
}
