use crate::constants::{
    INTENSITY_BITS, INTENSITY_MASK, RANGE_INTENSITY_GROUP_WIDTH, RANGE_ONLY_GROUP_WIDTH,
};
use crate::decode::{BitUnpacker, Remainder};
use crate::error::DecodeError;
use scip2_data::ScanData;

/// Body layout of a scan response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResponseVariant {
    /// One 3-character range per step (`MD`, `GD`).
    RangeOnly,
    /// One 6-character group per step holding a range and an intensity (`ME`, `GE`).
    RangeAndIntensity,
}

impl ResponseVariant {
    pub fn from_command_code(code: &str) -> Option<ResponseVariant> {
        match code {
            "MD" | "GD" => Some(ResponseVariant::RangeOnly),
            "ME" | "GE" => Some(ResponseVariant::RangeAndIntensity),
            _ => None,
        }
    }

    pub fn group_width(self) -> usize {
        match self {
            ResponseVariant::RangeOnly => RANGE_ONLY_GROUP_WIDTH,
            ResponseVariant::RangeAndIntensity => RANGE_INTENSITY_GROUP_WIDTH,
        }
    }

    pub fn has_intensities(self) -> bool {
        self == ResponseVariant::RangeAndIntensity
    }

    /// Splits one unpacked group into a range and, if present, an intensity.
    pub fn split(self, value: u64) -> (u32, Option<u32>) {
        match self {
            ResponseVariant::RangeOnly => (value as u32, None),
            ResponseVariant::RangeAndIntensity => (
                (value >> INTENSITY_BITS) as u32,
                Some((value & INTENSITY_MASK) as u32),
            ),
        }
    }
}

/// Appends the steps of body lines to a scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VariantDecoder {
    variant: ResponseVariant,
    unpacker: BitUnpacker,
}

impl VariantDecoder {
    pub fn new(variant: ResponseVariant, base_offset: u8) -> VariantDecoder {
        VariantDecoder {
            variant,
            unpacker: BitUnpacker::fixed(variant.group_width(), base_offset),
        }
    }

    pub fn variant(&self) -> ResponseVariant {
        self.variant
    }

    /// Decodes one body line with its checksum already removed. Nothing is
    /// appended to `scan` if the line holds an invalid character.
    pub fn decode_line(
        &self,
        remainder: Remainder,
        line: &str,
        scan: &mut ScanData,
    ) -> Result<Remainder, DecodeError> {
        let (values, remainder) = self.unpacker.unpack(remainder, line)?;
        for value in values {
            let (range, intensity) = self.variant.split(value);
            scan.ranges.push(range);
            if let Some(intensity) = intensity {
                scan.intensities.push(intensity);
            }
        }
        Ok(remainder)
    }
}
