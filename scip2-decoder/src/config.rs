use crate::constants::{
    DEFAULT_BASE_OFFSET, DEFAULT_BAUD_RATE, DEFAULT_EXPECTED_SAMPLES, DEFAULT_SERIAL_TIMEOUT_MS,
};
use std::time::Duration;

/// Settings shared by every response decoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Code point that encodes the 6-bit value zero.
    pub base_offset: u8,
    /// Number of steps reserved up front in each scan.
    pub expected_samples: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        DecoderConfig {
            base_offset: DEFAULT_BASE_OFFSET,
            expected_samples: DEFAULT_EXPECTED_SAMPLES,
        }
    }
}

/// Serial port settings.
/// # Arguments
///
/// * `port_name` - Serial port name such as `/dev/ttyACM0`.
/// * `baud_rate` - Ignored by USB-CDC devices but required by RS-232 units.
/// * `timeout` - How long a single read may block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SerialConfig {
    pub port_name: String,
    pub baud_rate: u32,
    pub timeout: Duration,
}

impl SerialConfig {
    pub fn new(port_name: &str) -> SerialConfig {
        SerialConfig {
            port_name: port_name.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            timeout: Duration::from_millis(DEFAULT_SERIAL_TIMEOUT_MS),
        }
    }
}
