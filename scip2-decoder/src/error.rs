use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Character {character:?} at position {position} is outside of the encoding table.")]
    InvalidCharacter { character: char, position: usize },
    #[error("Timestamp must be at least four characters. Actually {0} characters.")]
    TimestampTooShort(usize),
    #[error("Data line must be at least three characters. Actually {0} characters.")]
    LineTooShort(usize),
    #[error("Response ended before the timestamp line")]
    MissingTimestamp,
    #[error("Response ended before the terminating blank line")]
    UnexpectedEndOfInput,
    #[error("Status line must start with a two character code. Observed = {0:?}.")]
    InvalidStatusLine(String),
    #[error("Group width must be between 1 and 10 characters. Actually {0}.")]
    InvalidGroupWidth(usize),
    #[error("Remainder of {bits} bits does not belong to groups of {group_bits} bits")]
    RemainderMismatch { bits: u32, group_bits: u32 },
    #[error("Command {0:?} does not answer with a scan response")]
    UnsupportedCommand(String),
    #[error("Operation timed out")]
    TimeoutError,
    #[error(transparent)]
    IoError(#[from] io::Error),
    #[error(transparent)]
    SerialError(#[from] serialport::Error),
}

impl DecodeError {
    /// True when the error came from the line source rather than from a
    /// malformed frame, so nothing is left to skip on the stream.
    pub fn is_source_error(&self) -> bool {
        matches!(
            self,
            DecodeError::MissingTimestamp
                | DecodeError::UnexpectedEndOfInput
                | DecodeError::TimeoutError
                | DecodeError::IoError(_)
                | DecodeError::SerialError(_)
        )
    }
}
