use crate::constants::{STATUS_QUIET, STATUS_SUCCESS, TIMESTAMP_GROUP_WIDTH};
use crate::decode::{BitUnpacker, Remainder};
use crate::error::DecodeError;
use crate::line_source::strip_checksum;

/// Status code of a response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Status {
    /// `00`: command accepted, no scan attached yet.
    Quiet,
    /// `99`: scan data follows.
    Success,
    /// Any other code, reported by the device as an error.
    Error(String),
}

impl Status {
    pub fn parse(code: &str) -> Status {
        match code {
            STATUS_QUIET => Status::Quiet,
            STATUS_SUCCESS => Status::Success,
            _ => Status::Error(code.to_string()),
        }
    }
}

/// Decodes the timestamp line of a successful response. The line still
/// carries its checksum character.
pub fn read_timestamp(line: &str, base_offset: u8) -> Result<u32, DecodeError> {
    let stamp = strip_checksum(line).as_bytes();
    if stamp.len() < TIMESTAMP_GROUP_WIDTH {
        return Err(DecodeError::TimestampTooShort(stamp.len()));
    }
    let unpacker = BitUnpacker::fixed(TIMESTAMP_GROUP_WIDTH, base_offset);
    let (values, _) = unpacker.unpack_bytes(Remainder::new(), &stamp[..TIMESTAMP_GROUP_WIDTH])?;
    Ok(values[0] as u32)
}
