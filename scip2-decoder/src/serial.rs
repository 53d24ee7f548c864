use crate::config::SerialConfig;
use crate::constants::N_READ_TRIALS;
use crate::error::DecodeError;
use crate::line_source::{line_from_bytes, LineSource};
use serialport::SerialPort;
use std::io::{self, BufRead, BufReader};

pub fn open_port(config: &SerialConfig) -> Result<Box<dyn SerialPort>, DecodeError> {
    let port = serialport::new(&config.port_name, config.baud_rate)
        .timeout(config.timeout)
        .open()?;
    Ok(port)
}

/// Reads response lines from a serial port.
///
/// A read that times out keeps the bytes received so far, so a line split
/// across several reads is still returned whole.
pub struct SerialLineSource {
    reader: BufReader<Box<dyn SerialPort>>,
    pending: Vec<u8>,
}

impl SerialLineSource {
    pub fn new(port: Box<dyn SerialPort>) -> SerialLineSource {
        SerialLineSource {
            reader: BufReader::new(port),
            pending: Vec::new(),
        }
    }

    pub fn open(config: &SerialConfig) -> Result<SerialLineSource, DecodeError> {
        Ok(SerialLineSource::new(open_port(config)?))
    }

    fn take_line(&mut self) -> String {
        let line = line_from_bytes(&self.pending);
        self.pending.clear();
        line
    }
}

impl LineSource for SerialLineSource {
    fn next_line(&mut self) -> Result<Option<String>, DecodeError> {
        for _ in 0..N_READ_TRIALS {
            match self.reader.read_until(b'\n', &mut self.pending) {
                Ok(0) if self.pending.is_empty() => return Ok(None),
                Ok(_) => return Ok(Some(self.take_line())),
                Err(e) if e.kind() == io::ErrorKind::TimedOut => continue,
                Err(e) => return Err(DecodeError::IoError(e)),
            }
        }
        Err(DecodeError::TimeoutError)
    }
}
