//! Instruction and packet IDs of the protocol 1.0 wire format.

/// The instruction byte of an instruction packet.
///
/// The sync read and sync write-and-check values are vendor extensions of protocol 1.0.
/// They are the defaults of [`crate::Config`] and can be overridden there if the firmware on the bus uses other values.
#[rustfmt::skip]
pub mod instruction_id {
	pub const PING                 : u8 = 0x01;
	pub const READ                 : u8 = 0x02;
	pub const WRITE                : u8 = 0x03;
	pub const SYNC_WRITE           : u8 = 0x83;
	pub const SYNC_READ            : u8 = 0x84;
	pub const SYNC_WRITE_AND_CHECK : u8 = 0x85;
}

pub mod packet_id {
	/// Address all devices on the bus.
	///
	/// Devices do not reply to broadcast instructions, except with the aggregated response of a sync operation.
	pub const BROADCAST: u8 = 0xFE;
}

/// Control table addresses used by the emergency stop.
///
/// These are shared by the AX, RX, EX and MX (protocol 1.0) series.
#[rustfmt::skip]
pub mod register {
	/// Torque enable (1 byte).
	pub const TORQUE_ENABLE : u8 = 0x18;

	/// Torque limit (2 bytes).
	pub const TORQUE_LIMIT  : u8 = 0x22;

	/// The maximum value of the torque limit register.
	pub const TORQUE_LIMIT_MAX: u16 = 0x03FF;
}
