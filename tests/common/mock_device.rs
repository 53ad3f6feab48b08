use std::collections::{BTreeMap, BTreeSet};

use dynamixel1::instructions::{instruction_id, packet_id};
use dynamixel1::packet::checksum;
use dynamixel1::Packet;
use log::{trace, warn};

pub struct ControlTable {
	data: Vec<u8>,
}

impl ControlTable {
	pub fn new(size: usize) -> Self {
		Self { data: vec![0; size] }
	}

	pub fn read(&self, address: u8, length: u8) -> Option<&[u8]> {
		let start = address as usize;
		let end = start + length as usize;
		if end > self.data.len() {
			return None;
		}
		trace!("Read {:?} from {:?} in control table", &self.data[start..end], address);
		Some(&self.data[start..end])
	}

	pub fn write(&mut self, address: u8, data: &[u8]) -> bool {
		let start = address as usize;
		let end = start + data.len();
		if end > self.data.len() {
			return false;
		}
		self.data[start..end].copy_from_slice(data);
		trace!("Wrote {:?} to {:?} in control table", &self.data[start..end], address);
		true
	}
}

struct MockDevice {
	control_table: ControlTable,
	error: u8,
	quiet: bool,
}

/// A set of simulated devices sharing one bus.
///
/// Sync reads and sync writes that expect an aggregated response are answered as a single status packet from `sync_id`.
pub struct MockDevices {
	devices: BTreeMap<u8, MockDevice>,
	pub sync_id: u8,
	pub sync_read_instruction: u8,
	pub sync_write_and_check_instruction: u8,
	pub ignored_instructions: BTreeSet<u8>,
}

impl MockDevices {
	pub fn new(ids: &[u8]) -> Self {
		let devices = ids
			.iter()
			.map(|&id| {
				let device = MockDevice {
					control_table: ControlTable::new(0x40),
					error: 0,
					quiet: false,
				};
				(id, device)
			})
			.collect();
		Self {
			devices,
			sync_id: packet_id::BROADCAST,
			sync_read_instruction: instruction_id::SYNC_READ,
			sync_write_and_check_instruction: instruction_id::SYNC_WRITE_AND_CHECK,
			ignored_instructions: BTreeSet::new(),
		}
	}

	/// Read a range from the control table of a device.
	pub fn read(&self, id: u8, address: u8, length: u8) -> Vec<u8> {
		let device = &self.devices[&id];
		device.control_table.read(address, length).expect("read outside control table").to_vec()
	}

	/// Write to the control table of a device directly.
	pub fn write(&mut self, id: u8, address: u8, data: &[u8]) {
		let device = self.devices.get_mut(&id).expect("unknown device");
		assert!(device.control_table.write(address, data));
	}

	/// Set the error byte that a device puts in its status packets.
	pub fn set_error(&mut self, id: u8, error: u8) {
		self.devices.get_mut(&id).expect("unknown device").error = error;
	}

	/// Make a device stop responding.
	pub fn set_quiet(&mut self, id: u8) {
		self.devices.get_mut(&id).expect("unknown device").quiet = true;
	}

	/// Handle an instruction frame and produce the reply, if any.
	pub fn handle(&mut self, frame: &[u8]) -> Option<Vec<u8>> {
		assert!(frame.len() >= 6, "frame too short: {:02X?}", frame);
		assert!(frame[..2] == [0xFF, 0xFF], "invalid sync bytes: {:02X?}", frame);
		assert!(usize::from(frame[3]) + 4 == frame.len(), "invalid length field: {:02X?}", frame);
		assert!(checksum(&frame[2..frame.len() - 1]) == frame[frame.len() - 1], "invalid checksum: {:02X?}", frame);

		let id = frame[2];
		let instruction = frame[4];
		let parameters = &frame[5..frame.len() - 1];
		if self.ignored_instructions.contains(&instruction) {
			return None;
		}

		match instruction {
			instruction_id::PING => self.reply(id, &[]),
			instruction_id::READ => {
				let (address, length) = (parameters[0], parameters[1]);
				let data = self.devices.get(&id)?.control_table.read(address, length)?.to_vec();
				self.reply(id, &data)
			},
			instruction_id::WRITE => {
				let (address, data) = (parameters[0], &parameters[1..]);
				if id == packet_id::BROADCAST {
					for device in self.devices.values_mut() {
						device.control_table.write(address, data);
					}
					None
				} else {
					self.devices.get_mut(&id)?.control_table.write(address, data);
					self.reply(id, &[])
				}
			},
			instruction_id::SYNC_WRITE => {
				assert!(id == packet_id::BROADCAST);
				self.sync_write(parameters);
				None
			},
			x if x == self.sync_read_instruction => {
				assert!(id == self.sync_id);
				let (address, length) = (parameters[0], parameters[1]);
				let mut data = Vec::new();
				for motor_id in &parameters[2..] {
					match self.devices.get(motor_id).filter(|device| !device.quiet) {
						Some(device) => {
							data.push(device.error);
							data.extend_from_slice(device.control_table.read(address, length)?);
						},
						None => {
							data.push(0xFF);
							data.extend(std::iter::repeat(0).take(length.into()));
						},
					}
				}
				Some(status_frame(self.sync_id, 0, &data))
			},
			x if x == self.sync_write_and_check_instruction => {
				assert!(id == self.sync_id);
				let acknowledged = self.sync_write(parameters);
				Some(status_frame(self.sync_id, 0, &acknowledged))
			},
			x => {
				warn!("unknown instruction {:#04X}", x);
				None
			},
		}
	}

	/// Apply a sync write and return the aggregated acknowledgement.
	fn sync_write(&mut self, parameters: &[u8]) -> Vec<u8> {
		let address = parameters[0];
		let length = usize::from(parameters[1]);
		let mut acknowledged = Vec::new();
		for entry in parameters[2..].chunks_exact(length + 1) {
			let (motor_id, data) = (entry[0], &entry[1..]);
			match self.devices.get_mut(&motor_id).filter(|device| !device.quiet) {
				Some(device) => {
					device.control_table.write(address, data);
					acknowledged.push(device.error);
					acknowledged.extend_from_slice(data);
				},
				None => {
					acknowledged.push(0xFF);
					acknowledged.extend(std::iter::repeat(0).take(length));
				},
			}
		}
		acknowledged
	}

	fn reply(&self, id: u8, data: &[u8]) -> Option<Vec<u8>> {
		let device = self.devices.get(&id).filter(|device| !device.quiet)?;
		Some(status_frame(id, device.error, data))
	}
}

/// Encode a status packet.
pub fn status_frame(id: u8, error: u8, data: &[u8]) -> Vec<u8> {
	let mut packet = Packet::status(id, data.len());
	packet.set_error(error);
	packet.append_slice(data);
	packet.prepare();
	packet.as_bytes().to_vec()
}
