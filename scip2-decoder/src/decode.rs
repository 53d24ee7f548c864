use crate::constants::{BITS_PER_CHAR, MAX_GROUP_WIDTH};
use crate::error::DecodeError;

/// Bits of a group that started on a previous line and is not complete yet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Remainder {
    value: u64,
    bits: u32,
}

impl Remainder {
    pub fn new() -> Remainder {
        Remainder::default()
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }
}

/// Unpacks lines of 6-bit characters into integers of `group_width`
/// characters each.
///
/// A group may start on one line and end on the next one. The bits that do
/// not complete a group are returned as a [`Remainder`] and must be handed
/// back when unpacking the following line of the same response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BitUnpacker {
    group_width: usize,
    base_offset: u8,
}

impl BitUnpacker {
    pub fn new(group_width: usize, base_offset: u8) -> Result<BitUnpacker, DecodeError> {
        if group_width == 0 || group_width > MAX_GROUP_WIDTH {
            return Err(DecodeError::InvalidGroupWidth(group_width));
        }
        Ok(BitUnpacker::fixed(group_width, base_offset))
    }

    // Caller guarantees 1 <= group_width <= MAX_GROUP_WIDTH.
    pub(crate) const fn fixed(group_width: usize, base_offset: u8) -> BitUnpacker {
        BitUnpacker {
            group_width,
            base_offset,
        }
    }

    pub fn group_width(&self) -> usize {
        self.group_width
    }

    pub fn group_bits(&self) -> u32 {
        self.group_width as u32 * BITS_PER_CHAR
    }

    pub fn unpack(
        &self,
        remainder: Remainder,
        line: &str,
    ) -> Result<(Vec<u64>, Remainder), DecodeError> {
        self.unpack_bytes(remainder, line.as_bytes())
    }

    pub(crate) fn unpack_bytes(
        &self,
        remainder: Remainder,
        line: &[u8],
    ) -> Result<(Vec<u64>, Remainder), DecodeError> {
        let group_bits = self.group_bits();
        if remainder.bits >= group_bits || remainder.bits % BITS_PER_CHAR != 0 {
            return Err(DecodeError::RemainderMismatch {
                bits: remainder.bits,
                group_bits,
            });
        }

        let carried_chars = (remainder.bits / BITS_PER_CHAR) as usize;
        let mut values = Vec::with_capacity((carried_chars + line.len()) / self.group_width);
        let mut value = remainder.value;
        let mut bits = remainder.bits;
        for (position, &byte) in line.iter().enumerate() {
            let payload = self.char_bits(byte).ok_or(DecodeError::InvalidCharacter {
                character: byte as char,
                position,
            })?;
            value = (value << BITS_PER_CHAR) | u64::from(payload);
            bits += BITS_PER_CHAR;
            if bits == group_bits {
                values.push(value);
                value = 0;
                bits = 0;
            }
        }
        Ok((values, Remainder { value, bits }))
    }

    fn char_bits(&self, byte: u8) -> Option<u8> {
        byte.checked_sub(self.base_offset)
            .filter(|bits| *bits < (1 << BITS_PER_CHAR))
    }
}

/// Inverse of [`BitUnpacker::unpack`] with the default table.
#[cfg(test)]
pub(crate) fn encode(values: &[u64], group_width: usize) -> String {
    let mut encoded = String::with_capacity(values.len() * group_width);
    for value in values {
        for i in (0..group_width).rev() {
            let bits = (value >> (i as u32 * BITS_PER_CHAR)) & 0x3F;
            encoded.push(char::from(bits as u8 + crate::constants::DEFAULT_BASE_OFFSET));
        }
    }
    encoded
}
