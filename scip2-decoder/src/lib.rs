//! Decoder for the scan responses of SCIP 2.0 laser range finders.
//!
//! Responses arrive as lines of printable characters. Every line ends with a
//! checksum character, and each value is packed into a group of characters
//! carrying 6 bits each. A group may start on one line and finish on the
//! next one.
//!
//! ```text
//! MD0000108001101   echo-back
//! 99b               status + checksum
//! abcdX             timestamp (4 characters) + checksum
//! AAABBBCCC...x     data, 64 characters + checksum
//! ...
//!                   blank line
//! ```
use std::sync::mpsc;

mod config;
mod constants;
mod decode;
mod decoder_threads;
mod dispatcher;
mod error;
mod line_source;
mod response;
mod serial;
mod status;
mod variant;

use crate::constants::SCAN_CHANNEL_CAPACITY;
use crossbeam_channel::bounded;
use log::warn;

pub use crate::config::{DecoderConfig, SerialConfig};
pub use crate::decode::{BitUnpacker, Remainder};
pub use crate::decoder_threads::{join, DecoderThread, ScanEvent};
pub use crate::dispatcher::{DispatchOutcome, ResponseDispatcher};
pub use crate::error::DecodeError;
pub use crate::line_source::LineSource;
pub use crate::response::{FrameOutcome, FrameState, ResponseStream, ScanCallback};
pub use crate::serial::{open_port, SerialLineSource};
pub use crate::status::{read_timestamp, Status};
pub use crate::variant::{ResponseVariant, VariantDecoder};
pub use scip2_data::ScanData;

/// Function to decode scan responses on a dedicated thread.
/// # Arguments
///
/// * `source` - Lines received from the device.
/// * `command_codes` - Commands whose responses are decoded, such as `MD` or `ME`.
/// * `config` - Decoder settings.
///
/// Responses of other commands are skipped. The thread stops at the end of
/// the input or when the returned [`DecoderThread`] is dropped. Dropping it
/// never waits for long: a thread blocked in `source` is detached and ends
/// with its next line.
pub fn run_decoder<S>(
    source: S,
    command_codes: &[&str],
    config: DecoderConfig,
) -> Result<(DecoderThread, mpsc::Receiver<ScanEvent>), DecodeError>
where
    S: LineSource + Send + 'static,
{
    let (scan_tx, scan_rx) = mpsc::sync_channel::<ScanEvent>(SCAN_CHANNEL_CAPACITY);

    let mut dispatcher = ResponseDispatcher::new();
    for code in command_codes {
        let variant = ResponseVariant::from_command_code(code)
            .ok_or_else(|| DecodeError::UnsupportedCommand(code.to_string()))?;
        let scan_tx = scan_tx.clone();
        let forward = move |receive_time, echo_back: &str, status: &str, scan| {
            let event = ScanEvent {
                receive_time,
                echo_back: echo_back.to_string(),
                status: status.to_string(),
                scan,
            };
            if let Err(e) = scan_tx.send(event) {
                warn!("{e}");
            }
        };
        let stream = ResponseStream::new(variant, config, forward);
        dispatcher.register(code, stream);
    }

    let (terminator_tx, terminator_rx) = bounded(10);
    let (finished_tx, finished_rx) = bounded::<()>(1);
    let thread = Some(std::thread::spawn(move || {
        let _finished = finished_tx;
        decoder_threads::decode_responses(source, dispatcher, terminator_rx);
    }));

    let decoder_thread = DecoderThread {
        terminator_tx,
        finished_rx,
        thread,
    };

    Ok((decoder_thread, scan_rx))
}

/// Function to decode scan responses read from a serial port.
pub fn run_serial_decoder(
    serial_config: &SerialConfig,
    command_codes: &[&str],
    config: DecoderConfig,
) -> Result<(DecoderThread, mpsc::Receiver<ScanEvent>), DecodeError> {
    let source = SerialLineSource::open(serial_config)?;
    run_decoder(source, command_codes, config)
}
