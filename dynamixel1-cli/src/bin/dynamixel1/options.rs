use std::path::PathBuf;

use dynamixel1::instructions::packet_id;

/// Communicate with Dynamixel protocol 1.0 motors.
///
/// Write commands that take a motor ID can also take the special value "broadcast".
/// Broadcast writes are never acknowledged.
#[derive(clap::Parser)]
pub struct Options {
	/// Print more verbose messages. Can be used multiple times.
	#[clap(long, short)]
	#[clap(global = true)]
	#[clap(action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// The serial port to use.
	#[clap(long, short)]
	#[clap(global = true)]
	#[cfg_attr(target_os = "windows", clap(default_value = "COM1"))]
	#[cfg_attr(not(target_os = "windows"), clap(default_value = "/dev/ttyUSB0"))]
	pub serial_port: PathBuf,

	/// The baud rate of the serial port.
	#[clap(long, short)]
	#[clap(global = true)]
	#[clap(default_value = "1000000")]
	pub baud_rate: u32,

	/// The maximum time to wait for a response, in milliseconds.
	#[clap(long)]
	#[clap(global = true)]
	#[clap(default_value = "10")]
	pub timeout_ms: u64,

	/// The pause after each write, in microseconds.
	#[clap(long)]
	#[clap(global = true)]
	#[clap(default_value = "500")]
	pub wait_after_write_us: u64,

	#[clap(subcommand)]
	pub command: Command,
}

#[derive(clap::Subcommand)]
pub enum Command {
	/// Ping a motor or scan the entire bus.
	Ping {
		/// The motor to ping.
		///
		/// You may specify the broadcast address to scan the bus for connected motors.
		#[clap(value_name = "MOTOR_ID|broadcast")]
		motor_id: MotorId,
	},

	/// Read an arbitrary number of bytes from a motor.
	Read {
		/// The motor to read from (no broadcast ID allowed).
		#[clap(value_name = "MOTOR_ID")]
		motor_id: MotorId,

		/// The address to read from.
		#[clap(value_name = "ADDRESS")]
		address: u8,

		/// The number of bytes to read.
		#[clap(value_name = "COUNT")]
		count: u8,
	},

	/// Read an 8-bit value from a motor.
	Read8 {
		/// The motor to read from (no broadcast ID allowed).
		#[clap(value_name = "MOTOR_ID")]
		motor_id: MotorId,

		/// The address to read from.
		#[clap(value_name = "ADDRESS")]
		address: u8,
	},

	/// Read a 16-bit value from a motor.
	Read16 {
		/// The motor to read from (no broadcast ID allowed).
		#[clap(value_name = "MOTOR_ID")]
		motor_id: MotorId,

		/// The address to read from.
		#[clap(value_name = "ADDRESS")]
		address: u8,
	},

	/// Write arbitrary bytes to a motor.
	Write {
		/// The motor to write to.
		#[clap(value_name = "MOTOR_ID|broadcast")]
		motor_id: MotorId,

		/// The address to write to.
		#[clap(value_name = "ADDRESS")]
		address: u8,

		/// The bytes to write.
		#[clap(value_name = "DATA", required = true)]
		data: Vec<u8>,

		/// Wait for the motor to acknowledge the write.
		#[clap(long)]
		check: bool,
	},

	/// Write an 8-bit value to a motor.
	Write8 {
		/// The motor to write to.
		#[clap(value_name = "MOTOR_ID|broadcast")]
		motor_id: MotorId,

		/// The address to write to.
		#[clap(value_name = "ADDRESS")]
		address: u8,

		/// The value to write.
		#[clap(value_name = "VALUE")]
		value: u8,
	},

	/// Write a 16-bit value to a motor.
	Write16 {
		/// The motor to write to.
		#[clap(value_name = "MOTOR_ID|broadcast")]
		motor_id: MotorId,

		/// The address to write to.
		#[clap(value_name = "ADDRESS")]
		address: u8,

		/// The value to write.
		#[clap(value_name = "VALUE")]
		value: u16,
	},

	/// Read the same registers from multiple motors with a single instruction.
	SyncRead {
		/// The address to read from.
		#[clap(value_name = "ADDRESS")]
		address: u8,

		/// The number of bytes to read from each motor.
		#[clap(value_name = "COUNT")]
		count: u8,

		/// The motors to read from.
		#[clap(value_name = "MOTOR_ID", required = true)]
		motor_ids: Vec<u8>,

		/// The packet ID of the device that answers sync instructions.
		#[clap(long)]
		#[clap(default_value_t = packet_id::BROADCAST)]
		sync_id: u8,
	},

	/// Write the same registers of multiple motors with a single instruction.
	SyncWrite {
		/// The address to write to.
		#[clap(value_name = "ADDRESS")]
		address: u8,

		/// The data for each motor, as MOTOR_ID:BYTE[,BYTE...].
		///
		/// All entries must have the same number of bytes.
		#[clap(value_name = "MOTOR_ID:DATA", required = true)]
		entries: Vec<SyncWriteEntry>,

		/// Wait for the aggregated acknowledgement of all motors.
		#[clap(long)]
		check: bool,

		/// The packet ID of the device that answers sync instructions.
		#[clap(long)]
		#[clap(default_value_t = packet_id::BROADCAST)]
		sync_id: u8,
	},

	/// Disable the torque of all motors on the bus.
	EmergencyStop,

	/// Enable the torque of all motors on the bus and restore the maximum torque limit.
	Resume,

	/// Write shell completions to a file or to standard output.
	ShellCompletion {
		/// The shell for which to generate completions.
		#[clap(long)]
		shell: clap_complete::Shell,

		/// The file to write the generated completion file to.
		#[clap(long, short)]
		output: Option<PathBuf>,
	},
}

#[derive(Copy, Clone)]
pub enum MotorId {
	Id(u8),
	Broadcast,
}

impl MotorId {
	pub fn raw(self) -> u8 {
		match self {
			Self::Id(raw) => raw,
			Self::Broadcast => packet_id::BROADCAST,
		}
	}

	pub fn assume_unicast(self) -> Result<u8, ()> {
		match self {
			Self::Id(raw) => Ok(raw),
			Self::Broadcast => {
				log::error!("Invalid motor ID: this command can not be broadcasted.");
				Err(())
			},
		}
	}
}

impl std::str::FromStr for MotorId {
	type Err = &'static str;

	fn from_str(data: &str) -> Result<Self, Self::Err> {
		if data.eq_ignore_ascii_case("broadcast") {
			Ok(Self::Broadcast)
		} else if let Ok(id) = data.parse() {
			if id == packet_id::BROADCAST {
				Ok(Self::Broadcast)
			} else {
				Ok(Self::Id(id))
			}
		} else {
			Err("invalid motor ID: expected a number in the range 0..254 or the special value \"broadcast\"")
		}
	}
}

#[derive(Clone)]
pub struct SyncWriteEntry {
	pub motor_id: u8,
	pub data: Vec<u8>,
}

impl std::str::FromStr for SyncWriteEntry {
	type Err = String;

	fn from_str(input: &str) -> Result<Self, Self::Err> {
		let (motor_id, data) = input
			.split_once(':')
			.ok_or_else(|| format!("invalid entry {:?}: expected MOTOR_ID:BYTE[,BYTE...]", input))?;
		let motor_id = motor_id
			.trim()
			.parse()
			.map_err(|e| format!("invalid motor ID {:?}: {}", motor_id, e))?;
		let data = data
			.split(',')
			.map(|byte| byte.trim().parse().map_err(|e| format!("invalid byte {:?}: {}", byte, e)))
			.collect::<Result<Vec<u8>, _>>()?;
		Ok(Self { motor_id, data })
	}
}
