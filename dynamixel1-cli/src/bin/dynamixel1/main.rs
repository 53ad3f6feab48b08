use std::path::Path;
use std::time::{Duration, Instant};

use dynamixel1::{Config, Protocol, ResponseState, SerialBus};

mod logging;
mod options;

use options::{Command, MotorId, Options};

type Engine = Protocol<SerialBus>;

fn main() {
	if let Err(()) = do_main(clap::Parser::parse()) {
		std::process::exit(1);
	}
}

fn do_main(options: Options) -> Result<(), ()> {
	logging::init(module_path!(), options.verbose);
	match &options.command {
		Command::Ping { motor_id } => {
			let mut engine = open_engine(&options)?;
			match *motor_id {
				MotorId::Id(motor_id) => {
					log::debug!("Sending ping command to motor {}", motor_id);
					let start = Instant::now();
					if ping(&mut engine, motor_id)? {
						log::info!("{:?}: Ok", start.elapsed());
					} else {
						log::error!("No valid response from motor {}", motor_id);
						return Err(());
					}
				},
				MotorId::Broadcast => {
					log::debug!("Scanning bus for motors");
					let start = Instant::now();
					let mut found = 0;
					for motor_id in 0..dynamixel1::instructions::packet_id::BROADCAST {
						if ping(&mut engine, motor_id)? {
							log::info!("Motor ID: {}", motor_id);
							found += 1;
						}
					}
					log::info!("{:?}: found {} motors", start.elapsed(), found);
				},
			}
		},
		Command::Read { motor_id, address, count } => {
			let mut engine = open_engine(&options)?;
			log::debug!("Reading {} bytes from motor {} at address {}", count, motor_id.raw(), address);
			let start = Instant::now();
			let mut data = vec![0; usize::from(*count)];
			let state = engine
				.read_data(motor_id.assume_unicast()?, *address, &mut data)
				.map_err(|e| log::error!("Command failed: {}", e))?;
			check_state(state)?;
			log::info!("{:?}: {:02X?}", start.elapsed(), data);
		},
		Command::Read8 { motor_id, address } => {
			let mut engine = open_engine(&options)?;
			log::debug!("Reading an 8-bit value from motor {} at address {}", motor_id.raw(), address);
			let start = Instant::now();
			let response = engine
				.read_u8(motor_id.assume_unicast()?, *address)
				.map_err(|e| log::error!("Command failed: {}", e))?;
			log_device_status(response.state);
			log::info!("{:?}: {:?} (0x{:02X})", start.elapsed(), response.data, response.data);
		},
		Command::Read16 { motor_id, address } => {
			let mut engine = open_engine(&options)?;
			log::debug!("Reading a 16-bit value from motor {} at address {}", motor_id.raw(), address);
			let start = Instant::now();
			let response = engine
				.read_u16(motor_id.assume_unicast()?, *address)
				.map_err(|e| log::error!("Command failed: {}", e))?;
			log_device_status(response.state);
			log::info!("{:?}: {:?} (0x{:04X})", start.elapsed(), response.data, response.data);
		},
		Command::Write {
			motor_id,
			address,
			data,
			check,
		} => {
			let mut engine = open_engine(&options)?;
			log::debug!("Writing {} bytes to motor {} at address {}", data.len(), motor_id.raw(), address);
			let start = Instant::now();
			if *check {
				let state = engine
					.write_and_check_data(motor_id.assume_unicast()?, *address, data)
					.map_err(|e| log::error!("Command failed: {}", e))?;
				check_state(state)?;
			} else {
				engine
					.write_data(motor_id.raw(), *address, data)
					.map_err(|e| log::error!("Command failed: {}", e))?;
			}
			log::info!("{:?}: Ok", start.elapsed());
		},
		Command::Write8 { motor_id, address, value } => {
			let mut engine = open_engine(&options)?;
			log::debug!(
				"Writing 8-bit value {} (0x{:02X}) to motor {} at address {}",
				value,
				value,
				motor_id.raw(),
				address
			);
			let start = Instant::now();
			engine
				.write_u8(motor_id.raw(), *address, *value)
				.map_err(|e| log::error!("Command failed: {}", e))?;
			log::info!("{:?}: Ok", start.elapsed());
		},
		Command::Write16 { motor_id, address, value } => {
			let mut engine = open_engine(&options)?;
			log::debug!(
				"Writing 16-bit value {} (0x{:04X}) to motor {} at address {}",
				value,
				value,
				motor_id.raw(),
				address
			);
			let start = Instant::now();
			engine
				.write_u16(motor_id.raw(), *address, *value)
				.map_err(|e| log::error!("Command failed: {}", e))?;
			log::info!("{:?}: Ok", start.elapsed());
		},
		Command::SyncRead {
			address,
			count,
			motor_ids,
			sync_id,
		} => {
			let mut engine = open_engine(&options)?;
			set_sync_id(&mut engine, *sync_id);
			log::debug!("Reading {} bytes from {} motors at address {}", count, motor_ids.len(), address);
			let start = Instant::now();
			let size = usize::from(*count);
			let mut buffers = vec![vec![0; size]; motor_ids.len()];
			let states = engine
				.sync_read(motor_ids, *address, &mut buffers, size)
				.map_err(|e| log::error!("Command failed: {}", e))?;
			log::info!("{:?}:", start.elapsed());
			for ((motor_id, state), data) in motor_ids.iter().zip(&states).zip(&buffers) {
				if state.is_ok() {
					log::info!("Motor {}: {:02X?} ({})", motor_id, data, state);
				} else {
					log::error!("Motor {}: {}", motor_id, state);
				}
			}
		},
		Command::SyncWrite {
			address,
			entries,
			check,
			sync_id,
		} => {
			let size = match entries.first() {
				Some(entry) => entry.data.len(),
				None => {
					log::error!("No motors given");
					return Err(());
				},
			};
			if let Some(entry) = entries.iter().find(|entry| entry.data.len() != size) {
				log::error!(
					"Motor {} has {} bytes of data, but motor {} has {}",
					entry.motor_id,
					entry.data.len(),
					entries[0].motor_id,
					size
				);
				return Err(());
			}
			let motor_ids: Vec<u8> = entries.iter().map(|entry| entry.motor_id).collect();
			let data: Vec<&[u8]> = entries.iter().map(|entry| entry.data.as_slice()).collect();

			let mut engine = open_engine(&options)?;
			set_sync_id(&mut engine, *sync_id);
			log::debug!("Writing {} bytes to {} motors at address {}", size, motor_ids.len(), address);
			let start = Instant::now();
			if *check {
				let states = engine
					.sync_write_and_check(&motor_ids, *address, &data, size)
					.map_err(|e| log::error!("Command failed: {}", e))?;
				log::info!("{:?}:", start.elapsed());
				for (motor_id, state) in motor_ids.iter().zip(&states) {
					if state.is_ok() {
						log::info!("Motor {}: {}", motor_id, state);
					} else {
						log::error!("Motor {}: {}", motor_id, state);
					}
				}
			} else {
				engine
					.sync_write(&motor_ids, *address, &data, size)
					.map_err(|e| log::error!("Command failed: {}", e))?;
				log::info!("{:?}: Ok", start.elapsed());
			}
		},
		Command::EmergencyStop => {
			let mut engine = open_engine(&options)?;
			let start = Instant::now();
			engine.emergency_stop().map_err(|e| log::error!("Command failed: {}", e))?;
			log::info!("{:?}: Ok", start.elapsed());
		},
		Command::Resume => {
			let mut engine = open_engine(&options)?;
			let start = Instant::now();
			engine
				.exit_emergency_state()
				.map_err(|e| log::error!("Command failed: {}", e))?;
			log::info!("{:?}: Ok", start.elapsed());
		},
		Command::ShellCompletion { shell, output } => {
			write_shell_completion(*shell, output.as_deref())?;
		},
	}

	Ok(())
}

fn open_engine(options: &Options) -> Result<Engine, ()> {
	let bus = SerialBus::open(&options.serial_port, options.baud_rate)
		.map_err(|e| log::error!("Failed to open serial port: {}: {}", options.serial_port.display(), e))?;
	log::debug!(
		"Using serial port {} with baud rate {}",
		options.serial_port.display(),
		options.baud_rate
	);
	let config = Config::default()
		.with_timeout(Duration::from_millis(options.timeout_ms))
		.with_wait_after_write(Duration::from_micros(options.wait_after_write_us));
	Ok(Protocol::with_config(bus, config))
}

fn set_sync_id(engine: &mut Engine, sync_id: u8) {
	let mut config = engine.config().clone();
	config.sync_id = sync_id;
	engine.set_config(config);
}

fn ping(engine: &mut Engine, motor_id: u8) -> Result<bool, ()> {
	engine.ping(motor_id).map_err(|e| log::error!("Command failed: {}", e))
}

fn check_state(state: ResponseState) -> Result<(), ()> {
	if state.is_ok() {
		log_device_status(state);
		Ok(())
	} else {
		log::error!("No valid response: {}", state);
		Err(())
	}
}

fn log_device_status(state: ResponseState) {
	if state != ResponseState::OK {
		log::warn!("Motor reported status: {}", state);
	}
}

fn write_shell_completion(shell: clap_complete::Shell, path: Option<&Path>) -> Result<(), ()> {
	use clap::CommandFactory;
	use std::io::Write;

	let mut buffer = Vec::with_capacity(4 * 1024);

	let mut command = Options::command();
	clap_complete::generate(shell, &mut command, env!("CARGO_BIN_NAME"), &mut buffer);
	if !buffer.ends_with(b"\n") {
		buffer.push(b'\n');
	}

	let path = path.unwrap_or_else(|| Path::new("-"));
	if path == Path::new("-") {
		log::debug!("Writing shell completion for {} to stdout", shell);
		let stdout = std::io::stdout();
		stdout
			.lock()
			.write_all(&buffer)
			.map_err(|e| log::error!("Failed to write to stdout: {}", e))?;
	} else {
		log::debug!("Writing shell completion for {} to {}", shell, path.display());
		let mut output = std::fs::File::create(path).map_err(|e| log::error!("Failed to create {}: {}", path.display(), e))?;
		output
			.write_all(&buffer)
			.map_err(|e| log::error!("Failed to write to {}: {}", path.display(), e))?;
	}

	Ok(())
}
