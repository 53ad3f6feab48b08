//! The protocol 1.0 engine.

use core::time::Duration;
use std::time::Instant;

use crate::decoder::{Decoder, StatusPacket};
use crate::endian::{read_u16_le, write_u16_le};
use crate::error::{BufferTooSmall, FrameTooLarge, LengthMismatch};
use crate::instructions::{instruction_id, packet_id, register};
use crate::packet::Packet;
use crate::{Bus, Config, Error, Response, ResponseState};

/// The outcome of waiting for a single status packet.
type Received = Result<StatusPacket, ResponseState>;

/// The protocol 1.0 engine.
///
/// The engine owns the bus for the whole duration of each transaction:
/// from sending the instruction until the response is decoded or the timeout expires.
/// Callers on multiple threads must share a single engine behind a lock.
///
/// Operations only return an error for I/O failures of the bus and for invalid arguments.
/// Missing or corrupt responses and errors reported by the devices are returned as a [`ResponseState`].
/// No operation is retried automatically.
pub struct Protocol<B> {
	/// The underlying byte transport.
	bus: B,

	/// Timing and firmware parameters.
	config: Config,

	/// Scratch buffer for draining the bus.
	read_buffer: Vec<u8>,
}

impl<B> core::fmt::Debug for Protocol<B>
where
	B: core::fmt::Debug,
{
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("Protocol")
			.field("bus", &self.bus)
			.field("config", &self.config)
			.finish_non_exhaustive()
	}
}

impl<B: Bus> Protocol<B> {
	/// Create a new engine with the default configuration.
	pub fn new(bus: B) -> Self {
		Self::with_config(bus, Config::default())
	}

	/// Create a new engine with a custom configuration.
	pub fn with_config(bus: B, config: Config) -> Self {
		Self {
			bus,
			config,
			read_buffer: Vec::with_capacity(256),
		}
	}

	/// Get the configuration.
	pub fn config(&self) -> &Config {
		&self.config
	}

	/// Replace the configuration.
	pub fn set_config(&mut self, config: Config) {
		self.config = config;
	}

	/// Set the maximum time to wait for a response.
	pub fn set_timeout(&mut self, timeout: Duration) {
		self.config.timeout = timeout;
	}

	/// Set the pause after each write.
	pub fn set_wait_after_write(&mut self, wait_after_write: Duration) {
		self.config.wait_after_write = wait_after_write;
	}

	/// Get a reference to the underlying bus.
	pub fn bus(&self) -> &B {
		&self.bus
	}

	/// Get a mutable reference to the underlying bus.
	///
	/// Reading from or writing to the bus directly in the middle of a transaction will corrupt it.
	pub fn bus_mut(&mut self) -> &mut B {
		&mut self.bus
	}

	/// Consume the engine to get ownership of the bus.
	pub fn into_bus(self) -> B {
		self.bus
	}

	/// Write data to a device without waiting for a response.
	///
	/// Use [`packet_id::BROADCAST`] as `motor_id` to write to all devices at once.
	/// After sending, this function always sleeps for [`Config::wait_after_write`],
	/// since devices ignore instructions that follow a write too closely.
	pub fn write_data(&mut self, motor_id: u8, address: u8, data: &[u8]) -> Result<(), Error<B::Error>> {
		let packet = Self::write_packet(motor_id, instruction_id::WRITE, address, data)?;
		self.send_packet(packet)?;
		self.wait_after_write();
		Ok(())
	}

	/// Write data to a device and wait for the device to acknowledge it.
	///
	/// The instruction is the same as for [`Self::write_data()`],
	/// but the response is awaited and validated in the same way as for [`Self::read_data()`].
	pub fn write_and_check_data(&mut self, motor_id: u8, address: u8, data: &[u8]) -> Result<ResponseState, Error<B::Error>> {
		let packet = Self::write_packet(motor_id, instruction_id::WRITE, address, data)?;
		self.send_packet(packet)?;
		Ok(self.receive_packet(motor_id)?.map_or_else(|state| state, |status| status.state))
	}

	/// Read `data.len()` bytes from a device, starting at `address`.
	///
	/// The buffer is only written to if the returned state has [`ResponseState::OK`] set.
	pub fn read_data(&mut self, motor_id: u8, address: u8, data: &mut [u8]) -> Result<ResponseState, Error<B::Error>> {
		let size = Self::check_size(data.len())?;
		let mut packet = Packet::new(motor_id, instruction_id::READ, 2);
		packet.append(address);
		packet.append(size);
		self.send_packet(packet)?;

		let status = match self.receive_packet(motor_id)? {
			Ok(status) => status,
			Err(state) => return Ok(state),
		};

		let parameters = status.packet.parameters();
		if parameters.len() != data.len() {
			debug!(
				"read from {:#04X} returned {} bytes, expected {}",
				motor_id,
				parameters.len(),
				data.len()
			);
			return Ok(ResponseState::BAD_SIZE);
		}
		data.copy_from_slice(parameters);
		Ok(status.state)
	}

	/// Ping a device.
	///
	/// Returns true if the device sent a valid response.
	pub fn ping(&mut self, motor_id: u8) -> Result<bool, Error<B::Error>> {
		let packet = Packet::new(motor_id, instruction_id::PING, 0);
		self.send_packet(packet)?;
		Ok(self.receive_packet(motor_id)?.is_ok())
	}

	/// Read `size` bytes from multiple devices with a single instruction.
	///
	/// The data for `motor_ids[i]` is written to `buffers[i]`.
	/// One response state is returned per device, in the same order as `motor_ids`.
	/// A buffer is only written to if the state for that device has [`ResponseState::OK`] set.
	///
	/// If the aggregated response is missing or invalid, all devices get the same failure state.
	pub fn sync_read<T>(
		&mut self,
		motor_ids: &[u8],
		address: u8,
		buffers: &mut [T],
		size: usize,
	) -> Result<Vec<ResponseState>, Error<B::Error>>
	where
		T: AsMut<[u8]>,
	{
		LengthMismatch::check(motor_ids.len(), buffers.len())?;
		for buffer in buffers.iter_mut() {
			BufferTooSmall::check(size, buffer.as_mut().len())?;
		}
		let size_byte = Self::check_size(size)?;
		FrameTooLarge::check(2 + motor_ids.len())?;

		let sync_id = self.config.sync_id;
		let mut packet = Packet::new(sync_id, self.config.sync_read_instruction, 2 + motor_ids.len());
		packet.append(address);
		packet.append(size_byte);
		packet.append_slice(motor_ids);
		self.send_packet(packet)?;

		let received = self.receive_packet(sync_id)?;
		Ok(decode_sync_response(received, motor_ids, size, |i, data| {
			buffers[i].as_mut()[..size].copy_from_slice(data)
		}))
	}

	/// Write `size` bytes to multiple devices with a single instruction, without waiting for a response.
	///
	/// The first `size` bytes of `data[i]` are written to `motor_ids[i]`.
	/// After sending, this function always sleeps for [`Config::wait_after_write`].
	pub fn sync_write<T>(&mut self, motor_ids: &[u8], address: u8, data: &[T], size: usize) -> Result<(), Error<B::Error>>
	where
		T: AsRef<[u8]>,
	{
		let packet = Self::sync_write_packet(packet_id::BROADCAST, instruction_id::SYNC_WRITE, motor_ids, address, data, size)?;
		self.send_packet(packet)?;
		self.wait_after_write();
		Ok(())
	}

	/// Write `size` bytes to multiple devices with a single instruction, and wait for the aggregated acknowledgement.
	///
	/// One response state is returned per device, in the same order as `motor_ids`.
	pub fn sync_write_and_check<T>(
		&mut self,
		motor_ids: &[u8],
		address: u8,
		data: &[T],
		size: usize,
	) -> Result<Vec<ResponseState>, Error<B::Error>>
	where
		T: AsRef<[u8]>,
	{
		let sync_id = self.config.sync_id;
		let instruction = self.config.sync_write_and_check_instruction;
		let packet = Self::sync_write_packet(sync_id, instruction, motor_ids, address, data, size)?;
		self.send_packet(packet)?;

		let received = self.receive_packet(sync_id)?;
		Ok(decode_sync_response(received, motor_ids, size, |_, _| ()))
	}

	/// Disable the torque of all devices on the bus, and then set their torque limit to zero.
	///
	/// Both writes are broadcast, so there is no acknowledgement.
	pub fn emergency_stop(&mut self) -> Result<(), Error<B::Error>> {
		warn!("emergency stop: disabling torque of all devices");
		self.write_data(packet_id::BROADCAST, register::TORQUE_ENABLE, &[0])?;
		self.write_data(packet_id::BROADCAST, register::TORQUE_LIMIT, &[0x00, 0x00])?;
		Ok(())
	}

	/// Enable the torque of all devices on the bus, and then restore their torque limit to the maximum.
	///
	/// Both writes are broadcast, so there is no acknowledgement.
	pub fn exit_emergency_state(&mut self) -> Result<(), Error<B::Error>> {
		debug!("leaving emergency state: enabling torque of all devices");
		let mut limit = [0; 2];
		write_u16_le(&mut limit, register::TORQUE_LIMIT_MAX);
		self.write_data(packet_id::BROADCAST, register::TORQUE_ENABLE, &[1])?;
		self.write_data(packet_id::BROADCAST, register::TORQUE_LIMIT, &limit)?;
		Ok(())
	}

	/// Read an 8 bit register from a device.
	///
	/// Unlike [`Self::read_data()`], a missing or failed response is reported as [`Error::Response`].
	pub fn read_u8(&mut self, motor_id: u8, address: u8) -> Result<Response<u8>, Error<B::Error>> {
		let mut buffer = [0; 1];
		let state = self.read_data(motor_id, address, &mut buffer)?;
		Self::typed_response(motor_id, state, buffer[0])
	}

	/// Read a 16 bit little-endian register from a device.
	///
	/// Unlike [`Self::read_data()`], a missing or failed response is reported as [`Error::Response`].
	pub fn read_u16(&mut self, motor_id: u8, address: u8) -> Result<Response<u16>, Error<B::Error>> {
		let mut buffer = [0; 2];
		let state = self.read_data(motor_id, address, &mut buffer)?;
		Self::typed_response(motor_id, state, read_u16_le(&buffer))
	}

	/// Write an 8 bit register of a device.
	pub fn write_u8(&mut self, motor_id: u8, address: u8, value: u8) -> Result<(), Error<B::Error>> {
		self.write_data(motor_id, address, &[value])
	}

	/// Write a 16 bit little-endian register of a device.
	pub fn write_u16(&mut self, motor_id: u8, address: u8, value: u16) -> Result<(), Error<B::Error>> {
		let mut buffer = [0; 2];
		write_u16_le(&mut buffer, value);
		self.write_data(motor_id, address, &buffer)
	}

	fn typed_response<T>(motor_id: u8, state: ResponseState, data: T) -> Result<Response<T>, Error<B::Error>> {
		if state.is_ok() {
			Ok(Response { motor_id, state, data })
		} else {
			Err(Error::Response(state))
		}
	}

	fn check_size(size: usize) -> Result<u8, FrameTooLarge> {
		FrameTooLarge::check(size)?;
		Ok(size as u8)
	}

	fn write_packet(motor_id: u8, instruction: u8, address: u8, data: &[u8]) -> Result<Packet, FrameTooLarge> {
		FrameTooLarge::check(1 + data.len())?;
		let mut packet = Packet::new(motor_id, instruction, 1 + data.len());
		packet.append(address);
		packet.append_slice(data);
		Ok(packet)
	}

	fn sync_write_packet<T>(
		packet_id: u8,
		instruction: u8,
		motor_ids: &[u8],
		address: u8,
		data: &[T],
		size: usize,
	) -> Result<Packet, Error<B::Error>>
	where
		T: AsRef<[u8]>,
	{
		LengthMismatch::check(motor_ids.len(), data.len())?;
		for entry in data {
			BufferTooSmall::check(size, entry.as_ref().len())?;
		}
		let size_byte = Self::check_size(size)?;
		let parameters = 2 + motor_ids.len() * (size + 1);
		FrameTooLarge::check(parameters)?;

		let mut packet = Packet::new(packet_id, instruction, parameters);
		packet.append(address);
		packet.append(size_byte);
		for (&motor_id, entry) in motor_ids.iter().zip(data) {
			packet.append(motor_id);
			packet.append_slice(&entry.as_ref()[..size]);
		}
		Ok(packet)
	}

	/// Send an instruction packet, discarding any unread input first.
	fn send_packet(&mut self, mut packet: Packet) -> Result<(), Error<B::Error>> {
		self.bus.clear_input_buffer().map_err(Error::Io)?;
		packet.prepare();
		trace!("sending instruction: {:02X?}", packet.as_bytes());
		self.bus.send_data(packet.as_bytes()).map_err(Error::Io)?;
		self.bus.flush().map_err(Error::Io)?;
		Ok(())
	}

	/// Wait for a status packet from `motor_id`.
	///
	/// The timeout is counted from the start of this call and is not extended when garbage or frames from other devices are received.
	fn receive_packet(&mut self, motor_id: u8) -> Result<Received, Error<B::Error>> {
		let timeout = self.config.timeout;
		let start = Instant::now();
		let mut decoder = Decoder::new(motor_id);

		loop {
			let elapsed = start.elapsed();
			if elapsed >= timeout {
				break;
			}
			if !self.bus.wait_for_data(timeout - elapsed).map_err(Error::Io)? {
				continue;
			}

			let available = self.bus.available();
			self.read_buffer.resize(available, 0);
			let count = self.bus.read_data(&mut self.read_buffer).map_err(Error::Io)?;
			for &byte in &self.read_buffer[..count] {
				if let Some(received) = decoder.feed(byte) {
					return Ok(received);
				}
			}
		}

		let fault = decoder.fault();
		debug!("no response from {:#04X} within {:?}: {}", motor_id, timeout, fault);
		Ok(Err(fault))
	}

	fn wait_after_write(&self) {
		std::thread::sleep(self.config.wait_after_write);
	}
}

/// Split an aggregated sync response into one state per device.
///
/// Each device has a slot of one error byte followed by `size` data bytes, in request order.
/// An error byte of `0xFF` means the device did not respond.
/// `store` is called with the slot index and data of every slot that has [`ResponseState::OK`] set.
fn decode_sync_response<F>(received: Received, motor_ids: &[u8], size: usize, mut store: F) -> Vec<ResponseState>
where
	F: FnMut(usize, &[u8]),
{
	let status = match received {
		Ok(status) => status,
		Err(state) => return vec![state; motor_ids.len()],
	};

	let stride = size + 1;
	let parameters = status.packet.parameters();
	if parameters.len() < motor_ids.len() * stride {
		debug!(
			"aggregated response has {} bytes, expected {} for {} devices",
			parameters.len(),
			motor_ids.len() * stride,
			motor_ids.len()
		);
		return vec![ResponseState::BAD_SIZE; motor_ids.len()];
	}

	parameters
		.chunks_exact(stride)
		.take(motor_ids.len())
		.enumerate()
		.map(|(i, slot)| {
			let error = slot[0];
			if error == 0xFF {
				debug!("device {:#04X} did not respond to sync instruction", motor_ids[i]);
				return ResponseState::QUIET;
			}
			let state = ResponseState::from_device_error(error);
			if state.is_ok() {
				store(i, &slot[1..]);
			}
			state
		})
		.collect()
}
