use crate::constants::{COMMAND_CODE_LEN, STATUS_CODE_LEN};
use crate::error::DecodeError;
use crate::line_source::{skip_to_end_of_frame, LineSource};
use crate::response::{FrameOutcome, ResponseStream};
use log::{error, warn};
use std::collections::HashMap;
use std::time::SystemTime;

/// What happened to the response read by [`ResponseDispatcher::process`].
#[derive(Debug)]
pub enum DispatchOutcome {
    /// A registered stream decoded the response.
    Handled {
        command: String,
        outcome: FrameOutcome,
    },
    /// No stream is registered for this command. The response was skipped.
    Unhandled(String),
    /// The header could not be read. The response was skipped.
    Malformed(DecodeError),
    /// The source closed before another response started.
    EndOfInput,
}

/// Routes responses to the stream registered for their command code.
#[derive(Default)]
pub struct ResponseDispatcher {
    streams: HashMap<String, ResponseStream>,
}

impl ResponseDispatcher {
    pub fn new() -> ResponseDispatcher {
        ResponseDispatcher::default()
    }

    /// Registers `stream` for `command_code`, returning the stream it replaces.
    pub fn register(
        &mut self,
        command_code: &str,
        stream: ResponseStream,
    ) -> Option<ResponseStream> {
        self.streams.insert(command_code.to_string(), stream)
    }

    pub fn is_registered(&self, command_code: &str) -> bool {
        self.streams.contains_key(command_code)
    }

    /// Reads one response from `source` and hands it to its stream.
    ///
    /// Errors are only returned when the source itself fails; malformed
    /// responses are skipped up to their blank line.
    pub fn process<S: LineSource + ?Sized>(
        &mut self,
        receive_time: SystemTime,
        source: &mut S,
    ) -> Result<DispatchOutcome, DecodeError> {
        let echo_back = match read_echo_back(source)? {
            Some(echo_back) => echo_back,
            None => return Ok(DispatchOutcome::EndOfInput),
        };
        let status_line = source
            .next_line()?
            .ok_or(DecodeError::UnexpectedEndOfInput)?;
        let status = match status_line.get(..STATUS_CODE_LEN) {
            Some(status) if status_line.len() <= STATUS_CODE_LEN + 1 => status,
            _ => {
                let err = DecodeError::InvalidStatusLine(status_line.clone());
                error!("{} skipped: {}", echo_back, err);
                if !status_line.is_empty() {
                    skip_to_end_of_frame(source)?;
                }
                return Ok(DispatchOutcome::Malformed(err));
            }
        };

        let command = echo_back
            .get(..COMMAND_CODE_LEN)
            .unwrap_or(echo_back.as_str());
        let stream = match self.streams.get_mut(command) {
            Some(stream) => stream,
            None => {
                warn!("No stream registered for {}", echo_back);
                skip_to_end_of_frame(source)?;
                return Ok(DispatchOutcome::Unhandled(command.to_string()));
            }
        };

        let outcome = stream.handle_frame(receive_time, &echo_back, status, source);
        match &outcome {
            FrameOutcome::Delivered => (),
            FrameOutcome::Aborted(e) if e.is_source_error() => (),
            _ => {
                skip_to_end_of_frame(source)?;
            }
        }
        Ok(DispatchOutcome::Handled {
            command: command.to_string(),
            outcome,
        })
    }
}

fn read_echo_back<S: LineSource + ?Sized>(source: &mut S) -> Result<Option<String>, DecodeError> {
    while let Some(line) = source.next_line()? {
        if !line.is_empty() {
            return Ok(Some(line));
        }
    }
    Ok(None)
}
