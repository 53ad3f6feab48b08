#![allow(dead_code)]

mod mock_bus;
mod mock_device;

use std::time::Duration;

use dynamixel1::{Config, Protocol};

pub use mock_bus::{MockBus, SentFrame};
pub use mock_device::{status_frame, ControlTable, MockDevices};

/// Configuration with a settling delay long enough to measure reliably.
pub fn test_config() -> Config {
	Config::default()
		.with_timeout(Duration::from_millis(20))
		.with_wait_after_write(Duration::from_millis(5))
}

/// Create an engine talking to simulated devices with the given IDs.
pub fn protocol_with_devices(ids: &[u8]) -> Protocol<MockBus> {
	Protocol::with_config(MockBus::with_devices(MockDevices::new(ids)), test_config())
}

/// Create an engine that receives the given replies, one per sent frame.
pub fn protocol_with_replies(replies: impl IntoIterator<Item = Vec<u8>>) -> Protocol<MockBus> {
	Protocol::with_config(MockBus::scripted(replies), test_config())
}
