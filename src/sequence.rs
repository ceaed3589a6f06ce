//! Merging overlapping reporter sequences.
//!
//! Array designs often tile several short reporters across one target.
//! Collapsing joins them left to right into one sequence, writing each
//! shared stretch only once.

use serde::{Deserialize, Serialize};

use crate::error::ProbeMapError;

/// A short sequence placed on a longer parent sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reporter {
    pub name: String,
    pub sequence: String,
    /// 0-based start of the reporter within its parent
    pub start_in_parent: u64,
}

impl Reporter {
    pub fn new(name: impl Into<String>, sequence: impl Into<String>, start_in_parent: u64) -> Self {
        Self {
            name: name.into(),
            sequence: sequence.into(),
            start_in_parent,
        }
    }
}

/// Length of the longest suffix of `target` that is also a prefix of `query`.
///
/// Suffixes are tried longest first. Comparison is case-sensitive and
/// byte-wise.
pub fn right_hand_overlap(target: &str, query: &str) -> usize {
    let target = target.as_bytes();
    let query = query.as_bytes();
    (0..target.len())
        .map(|i| &target[i..])
        .find(|suffix| query.starts_with(suffix))
        .map_or(0, |suffix| suffix.len())
}

/// Join reporters into one sequence in order of their start in the parent.
///
/// Each reporter contributes only the part not already covered by the
/// right-hand overlap with what has been collapsed so far.
pub fn collapse_reporters(reporters: &[Reporter]) -> Result<String, ProbeMapError> {
    if let Some(bad) = reporters.iter().find(|r| !r.sequence.is_ascii()) {
        return Err(ProbeMapError::invalid_argument(format!(
            "reporter {} has non-ASCII residues",
            bad.name
        )));
    }

    let mut ordered: Vec<&Reporter> = reporters.iter().collect();
    ordered.sort_by_key(|r| r.start_in_parent);

    let mut collapsed = String::new();
    for reporter in ordered {
        let shared = right_hand_overlap(&collapsed, &reporter.sequence);
        collapsed.push_str(&reporter.sequence[shared..]);
    }
    Ok(collapsed)
}
