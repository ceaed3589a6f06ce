//! UCSC genome-browser binning scheme.
//!
//! Intervals are assigned to the smallest bin that fully contains them.
//! Ends up to 512Mb use the standard five-level scheme; anything beyond
//! that uses the extended six-level scheme, offset so the two never
//! collide.

use crate::error::ProbeMapError;

const BIN_FIRST_SHIFT: u32 = 17;
const BIN_NEXT_SHIFT: u32 = 3;

const BIN_OFFSETS: [u64; 5] = [512 + 64 + 8 + 1, 64 + 8 + 1, 8 + 1, 1, 0];
const BIN_OFFSETS_EXTENDED: [u64; 6] = [4096 + 512 + 64 + 8 + 1, 512 + 64 + 8 + 1, 64 + 8 + 1, 8 + 1, 1, 0];

/// Largest end coordinate the standard scheme can bin.
pub const BINRANGE_MAXEND_512M: u64 = 512 * 1024 * 1024;

/// Offset added to extended-scheme bins.
pub const BIN_OFFSET_OLD_TO_EXTENDED: u64 = 4681;

/// Compute the bin for the half-open range `[start, end)`.
///
/// Zero-length ranges are binned as the single base at `start`.
pub fn bin_from_range(start: u64, end: u64) -> Result<u32, ProbeMapError> {
    if end < start {
        return Err(ProbeMapError::InvalidRange { start, end });
    }

    let bin = if end <= BINRANGE_MAXEND_512M {
        bin_for_levels(start, end, &BIN_OFFSETS)
    } else {
        bin_for_levels(start, end, &BIN_OFFSETS_EXTENDED).map(|b| b + BIN_OFFSET_OLD_TO_EXTENDED)
    };

    bin.and_then(|b| u32::try_from(b).ok())
        .ok_or_else(|| ProbeMapError::invalid_argument(format!("range {}-{} out of binnable range", start, end)))
}

fn bin_for_levels(start: u64, end: u64, offsets: &[u64]) -> Option<u64> {
    let last = if end > start { end - 1 } else { start };
    let mut start_bin = start >> BIN_FIRST_SHIFT;
    let mut end_bin = last >> BIN_FIRST_SHIFT;

    for offset in offsets {
        if start_bin == end_bin {
            return Some(offset + start_bin);
        }
        start_bin >>= BIN_NEXT_SHIFT;
        end_bin >>= BIN_NEXT_SHIFT;
    }
    None
}
