pub(crate) const STATUS_QUIET: &str = "00";
pub(crate) const STATUS_SUCCESS: &str = "99";
pub(crate) const STATUS_CODE_LEN: usize = 2;
pub(crate) const COMMAND_CODE_LEN: usize = 2;
// Origin of the SCIP 2.0 character encoding table ('0').
pub(crate) const DEFAULT_BASE_OFFSET: u8 = 0x30;
pub(crate) const BITS_PER_CHAR: u32 = 6;
// 6 * 10 bits still fit in the u64 accumulator
pub(crate) const MAX_GROUP_WIDTH: usize = 10;
pub(crate) const TIMESTAMP_GROUP_WIDTH: usize = 4;
pub(crate) const RANGE_ONLY_GROUP_WIDTH: usize = 3;
pub(crate) const RANGE_INTENSITY_GROUP_WIDTH: usize = 6;
pub(crate) const INTENSITY_BITS: u32 = 18;
pub(crate) const INTENSITY_MASK: u64 = 0x3FFFF;
pub(crate) const MIN_BODY_LINE_LEN: usize = 3;
pub(crate) const DEFAULT_EXPECTED_SAMPLES: usize = 512;
pub(crate) const DEFAULT_BAUD_RATE: u32 = 115_200;
pub(crate) const DEFAULT_SERIAL_TIMEOUT_MS: u64 = 100;
pub(crate) const N_READ_TRIALS: usize = 3;
pub(crate) const SCAN_CHANNEL_CAPACITY: usize = 10;
// longer than N_READ_TRIALS reads at the default serial timeout
pub(crate) const JOIN_TIMEOUT_MS: u64 = 500;
