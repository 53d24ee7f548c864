#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Struct to hold one decoded scan response.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScanData {
    /// Device clock value when the scan was taken, in device ticks.
    pub timestamp: u32,
    /// Measured distance of each step, in angular order.
    pub ranges: Vec<u32>,
    /// Return strength of each step. Empty when the response carries ranges only.
    pub intensities: Vec<u32>,
}

impl ScanData {
    pub fn new() -> ScanData {
        ScanData::default()
    }

    /// Empty scan with room for `n_steps` samples.
    pub fn with_capacity(n_steps: usize, with_intensities: bool) -> ScanData {
        ScanData {
            timestamp: 0,
            ranges: Vec::with_capacity(n_steps),
            intensities: if with_intensities {
                Vec::with_capacity(n_steps)
            } else {
                Vec::new()
            },
        }
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn has_intensities(&self) -> bool {
        !self.intensities.is_empty()
    }
}
