use assert2::{assert, let_assert};
use dynamixel1::instructions::{instruction_id, packet_id};
use dynamixel1::{device_error, Error, Protocol, ResponseState};
use test_log::test;

mod common;

use common::{protocol_with_devices, protocol_with_replies, status_frame, test_config, MockBus};

#[test]
fn test_sync_read() {
	let mut protocol = protocol_with_devices(&[1, 2, 3]);
	protocol.bus_mut().devices_mut().write(1, 0x24, &[0x11, 0x01]);
	protocol.bus_mut().devices_mut().write(2, 0x24, &[0x22, 0x02]);
	protocol.bus_mut().devices_mut().write(3, 0x24, &[0x33, 0x03]);
	protocol.bus_mut().devices_mut().set_quiet(2);

	let mut buffers = [[0xAAu8; 2]; 3];
	let_assert!(Ok(states) = protocol.sync_read(&[1, 2, 3], 0x24, &mut buffers, 2));
	assert!(states == [ResponseState::OK, ResponseState::QUIET, ResponseState::OK]);
	assert!(buffers[0] == [0x11, 0x01]);
	assert!(buffers[1] == [0xAA, 0xAA]);
	assert!(buffers[2] == [0x33, 0x03]);
}

#[test]
fn test_sync_read_frame() {
	let mut protocol = protocol_with_devices(&[4, 9]);
	let mut buffers = vec![vec![0u8; 2]; 2];
	let_assert!(Ok(_) = protocol.sync_read(&[4, 9], 0x24, &mut buffers, 2));

	let sent = protocol.bus().sent_data();
	assert!(sent.len() == 1);
	assert!(sent[0][..sent[0].len() - 1] == [0xFF, 0xFF, packet_id::BROADCAST, 6, instruction_id::SYNC_READ, 0x24, 2, 4, 9]);
}

#[test]
fn test_sync_read_larger_buffers() {
	let mut protocol = protocol_with_devices(&[1, 2]);
	protocol.bus_mut().devices_mut().write(1, 0x10, &[5]);
	protocol.bus_mut().devices_mut().write(2, 0x10, &[6]);

	let mut buffers = [[0xAAu8; 3]; 2];
	let_assert!(Ok(states) = protocol.sync_read(&[1, 2], 0x10, &mut buffers, 1));
	assert!(states == [ResponseState::OK; 2]);
	assert!(buffers == [[5, 0xAA, 0xAA], [6, 0xAA, 0xAA]]);
}

#[test]
fn test_sync_read_silent_bus() {
	let mut protocol = Protocol::with_config(MockBus::silent(), test_config());
	let mut buffers = [[0xAAu8; 2]; 3];
	let_assert!(Ok(states) = protocol.sync_read(&[1, 2, 3], 0x24, &mut buffers, 2));
	assert!(states == [ResponseState::QUIET; 3]);
	assert!(buffers == [[0xAA; 2]; 3]);
}

#[test]
fn test_sync_read_bad_checksum() {
	let mut reply = status_frame(packet_id::BROADCAST, 0, &[0, 1, 0, 2]);
	reply[6] ^= 0x01;
	let mut protocol = protocol_with_replies([reply]);

	let mut buffers = [[0xAAu8; 1]; 2];
	let_assert!(Ok(states) = protocol.sync_read(&[1, 2], 0x24, &mut buffers, 1));
	assert!(states == [ResponseState::BAD_CHECKSUM; 2]);
	assert!(buffers == [[0xAA]; 2]);
}

#[test]
fn test_sync_read_device_errors() {
	let mut protocol = protocol_with_devices(&[1, 2, 3]);
	protocol.bus_mut().devices_mut().write(1, 0x24, &[1]);
	protocol.bus_mut().devices_mut().write(2, 0x24, &[2]);
	protocol.bus_mut().devices_mut().write(3, 0x24, &[3]);
	protocol.bus_mut().devices_mut().set_error(1, device_error::OVERHEAT);
	protocol.bus_mut().devices_mut().set_error(2, device_error::CHECKSUM);
	protocol.bus_mut().devices_mut().set_error(3, device_error::INSTRUCTION | device_error::VOLTAGE);

	let mut buffers = [[0xAAu8; 1]; 3];
	let_assert!(Ok(states) = protocol.sync_read(&[1, 2, 3], 0x24, &mut buffers, 1));
	assert!(states[0] == ResponseState::OK | ResponseState::OVERHEAT);
	assert!(states[1] == ResponseState::DEVICE_BAD_CHECKSUM);
	assert!(states[2] == ResponseState::DEVICE_BAD_INSTRUCTION);
	assert!(buffers == [[1], [0xAA], [0xAA]]);
}

#[test]
fn test_sync_read_short_response() {
	// Two slots of one error byte and two data bytes are expected, but only one arrives.
	let mut protocol = protocol_with_replies([status_frame(packet_id::BROADCAST, 0, &[0, 0x12, 0x34])]);

	let mut buffers = [[0xAAu8; 2]; 2];
	let_assert!(Ok(states) = protocol.sync_read(&[1, 2], 0x24, &mut buffers, 2));
	assert!(states == [ResponseState::BAD_SIZE; 2]);
	assert!(buffers == [[0xAA; 2]; 2]);
}

#[test]
fn test_sync_read_custom_sync_id() {
	let mut devices = common::MockDevices::new(&[1, 2]);
	devices.sync_id = 0xFD;
	let mut config = test_config();
	config.sync_id = 0xFD;
	let mut protocol = Protocol::with_config(MockBus::with_devices(devices), config);
	protocol.bus_mut().devices_mut().write(2, 0x24, &[0x7F]);

	let mut buffers = [[0u8; 1]; 2];
	let_assert!(Ok(states) = protocol.sync_read(&[1, 2], 0x24, &mut buffers, 1));
	assert!(states == [ResponseState::OK; 2]);
	assert!(buffers == [[0], [0x7F]]);
	assert!(protocol.bus().sent_data()[0][2] == 0xFD);
}

#[test]
fn test_sync_read_length_mismatch() {
	let mut protocol = protocol_with_devices(&[1, 2]);
	let mut buffers = [[0u8; 2]; 1];
	let_assert!(Err(Error::LengthMismatch(e)) = protocol.sync_read(&[1, 2], 0x24, &mut buffers, 2));
	assert!(e.ids == 2);
	assert!(e.data == 1);
	assert!(protocol.bus().sent.is_empty());
}

#[test]
fn test_sync_read_buffer_too_small() {
	let mut protocol = protocol_with_devices(&[1, 2]);
	let mut buffers = [vec![0u8; 2], vec![0; 1]];
	let_assert!(Err(Error::BufferTooSmall(e)) = protocol.sync_read(&[1, 2], 0x24, &mut buffers, 2));
	assert!(e.required_size == 2);
	assert!(e.total_size == 1);
	assert!(protocol.bus().sent.is_empty());
}

#[test]
fn test_sync_write() {
	let mut protocol = protocol_with_devices(&[1, 2]);
	let wait = protocol.config().wait_after_write;

	let_assert!(Ok(()) = protocol.sync_write(&[1, 2], 0x1E, &[[0x00u8, 0x02], [0xFF, 0x03]], 2));
	let_assert!(Ok(()) = protocol.write_u8(1, 0x18, 1));

	let sent = protocol.bus().sent_data();
	let frame = &sent[0];
	assert!(frame[..frame.len() - 1] == [0xFF, 0xFF, packet_id::BROADCAST, 10, instruction_id::SYNC_WRITE, 0x1E, 2, 1, 0x00, 0x02, 2, 0xFF, 0x03]);
	assert!(protocol.bus().devices().read(1, 0x1E, 2) == [0x00, 0x02]);
	assert!(protocol.bus().devices().read(2, 0x1E, 2) == [0xFF, 0x03]);

	let sent = &protocol.bus().sent;
	assert!(sent[1].time.duration_since(sent[0].time) >= wait);
}

#[test]
fn test_sync_write_length_mismatch() {
	let mut protocol = protocol_with_devices(&[1, 2]);
	let_assert!(Err(Error::LengthMismatch(_)) = protocol.sync_write(&[1, 2, 3], 0x1E, &[[0u8; 2]; 2], 2));
	assert!(protocol.bus().sent.is_empty());
}

#[test]
fn test_sync_write_and_check() {
	let mut protocol = protocol_with_devices(&[1, 2, 3]);
	protocol.bus_mut().devices_mut().set_quiet(2);
	protocol.bus_mut().devices_mut().set_error(3, device_error::OVERLOAD);

	let data = [vec![0x10u8], vec![0x20], vec![0x30]];
	let_assert!(Ok(states) = protocol.sync_write_and_check(&[1, 2, 3], 0x19, &data, 1));
	assert!(states == [ResponseState::OK, ResponseState::QUIET, ResponseState::OK | ResponseState::OVERLOAD]);
	assert!(protocol.bus().devices().read(1, 0x19, 1) == [0x10]);
	assert!(protocol.bus().devices().read(3, 0x19, 1) == [0x30]);

	let sent = protocol.bus().sent_data();
	assert!(sent[0][2] == packet_id::BROADCAST);
	assert!(sent[0][4] == instruction_id::SYNC_WRITE_AND_CHECK);
}

#[test]
fn test_sync_write_and_check_no_response() {
	let mut protocol = protocol_with_devices(&[1, 2]);
	protocol.bus_mut().devices_mut().ignored_instructions.insert(instruction_id::SYNC_WRITE_AND_CHECK);

	let_assert!(Ok(states) = protocol.sync_write_and_check(&[1, 2], 0x19, &[[1u8], [2]], 1));
	assert!(states == [ResponseState::QUIET; 2]);
}
