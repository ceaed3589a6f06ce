//! Interval arithmetic over alignment blocks
//!
//! All coordinates are 0-based, half-open `[start, end)` positions on a
//! chromosome. Block lists arrive from alignment records as
//! comma-delimited text (`"100,300,"`) and are parsed once into `Vec<u64>`.
//!
//! # Examples
//!
//! ```
//! use ferro_probemap::coords::{find_center_base, overlap, parse_block_list};
//!
//! assert_eq!(overlap(100, 200, 150, 250).unwrap(), 50);
//!
//! let starts = parse_block_list("100,300,").unwrap();
//! let sizes = parse_block_list("50,50").unwrap();
//! assert_eq!(find_center_base(&starts, &sizes).unwrap(), 300);
//! ```

pub mod bin;

pub use bin::bin_from_range;

use crate::error::ProbeMapError;

/// Conventional chromosome prefix used by the annotation store.
pub const CHROMOSOME_PREFIX: &str = "chr";

/// Parse a comma-delimited list of non-negative integers.
///
/// Empty input yields an empty list. Trailing commas are ignored; any
/// other empty or non-integer token is a parse error whose position is
/// the token index.
pub fn parse_block_list(text: &str) -> Result<Vec<u64>, ProbeMapError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(Vec::new());
    }

    let mut tokens: Vec<&str> = text.split(',').collect();
    while tokens.last().is_some_and(|t| t.trim().is_empty()) {
        tokens.pop();
    }

    tokens
        .iter()
        .enumerate()
        .map(|(i, token)| {
            token.trim().parse::<u64>().map_err(|_| {
                ProbeMapError::parse(i, format!("invalid block value '{}'", token.trim()))
            })
        })
        .collect()
}

/// Sum of block sizes.
pub fn total_size(sizes: &[u64]) -> u64 {
    sizes.iter().sum()
}

/// Number of bases shared by `[a_start, a_end)` and `[b_start, b_end)`.
///
/// Symmetric, and never larger than the shorter of the two intervals.
pub fn overlap(a_start: u64, a_end: u64, b_start: u64, b_end: u64) -> Result<u64, ProbeMapError> {
    if a_start > a_end {
        return Err(ProbeMapError::InvalidRange {
            start: a_start,
            end: a_end,
        });
    }
    if b_start > b_end {
        return Err(ProbeMapError::InvalidRange {
            start: b_start,
            end: b_end,
        });
    }

    if a_end <= b_start || b_end <= a_start {
        return Ok(0);
    }
    Ok(a_end.min(b_end) - a_start.max(b_start))
}

/// Genomic coordinate of the base at the floor-midpoint of the aligned length.
///
/// Blocks are walked in the order given; the midpoint offset is located in
/// the first block whose half-open span of cumulative positions contains it.
pub fn find_center_base(starts: &[u64], sizes: &[u64]) -> Result<u64, ProbeMapError> {
    check_blocks(starts, sizes)?;

    let total = total_size(sizes);
    if total == 0 {
        return Err(ProbeMapError::invalid_argument(
            "cannot locate the center of a zero-length alignment",
        ));
    }

    let middle = total / 2;
    let mut cumulative = 0u64;
    for (start, size) in starts.iter().zip(sizes) {
        if cumulative + size > middle {
            return Ok(start + (middle - cumulative));
        }
        cumulative += size;
    }

    Err(ProbeMapError::Invariant {
        msg: format!("midpoint {} not found within {} aligned bases", middle, total),
    })
}

/// Check that block starts and sizes pair up.
pub fn check_blocks(starts: &[u64], sizes: &[u64]) -> Result<(), ProbeMapError> {
    if starts.len() != sizes.len() {
        return Err(ProbeMapError::invalid_argument(format!(
            "{} block starts but {} block sizes",
            starts.len(),
            sizes.len()
        )));
    }
    Ok(())
}

/// Add the `chr` prefix if missing.
pub fn to_prefixed(name: &str) -> String {
    if name.starts_with(CHROMOSOME_PREFIX) {
        name.to_string()
    } else {
        format!("{}{}", CHROMOSOME_PREFIX, name)
    }
}

/// Remove the `chr` prefix if present.
pub fn strip_prefix(name: &str) -> &str {
    name.strip_prefix(CHROMOSOME_PREFIX).unwrap_or(name)
}

/// Compare chromosome names, ignoring the `chr` prefix.
pub fn same_chromosome(a: &str, b: &str) -> bool {
    strip_prefix(a) == strip_prefix(b)
}
