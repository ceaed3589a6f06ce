use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::interval::{GenomicInterval, Strand};
use super::sequence::QuerySequence;
use crate::coords::{check_blocks, strip_prefix, total_size};
use crate::error::{ErrorCode, ProbeMapError};

/// One placement of a query sequence on the genome.
///
/// Target coordinates are 0-based half-open. Blocks are the gapless
/// aligned segments, given in target coordinates in alignment order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentHit {
    pub query: Arc<QuerySequence>,
    /// Target chromosome, without the `chr` prefix
    pub target_chromosome: String,
    pub target_start: u64,
    pub target_end: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strand: Option<Strand>,
    pub block_starts: Vec<u64>,
    pub block_sizes: Vec<u64>,
    #[serde(default)]
    pub query_starts: Vec<u64>,
    pub query_start: u64,
    pub query_end: u64,
    pub matches: u64,
    pub mismatches: u64,
    #[serde(default)]
    pub rep_matches: u64,
    #[serde(default)]
    pub query_gap_count: u64,
    #[serde(default)]
    pub target_gap_count: u64,
    /// Alignment score, normalized to the query length
    pub score: f64,
    /// Fraction of aligned bases that match
    pub identity: f64,
}

impl AlignmentHit {
    /// Create a hit from its target span and blocks, computing score and
    /// identity as a perfect match over the aligned bases.
    pub fn new(
        query: Arc<QuerySequence>,
        chromosome: &str,
        target_start: u64,
        target_end: u64,
        strand: Option<Strand>,
        block_starts: Vec<u64>,
        block_sizes: Vec<u64>,
    ) -> Self {
        let aligned = total_size(&block_sizes);
        let mut hit = Self {
            query,
            target_chromosome: strip_prefix(chromosome).to_string(),
            target_start,
            target_end,
            strand,
            block_starts,
            block_sizes,
            query_starts: Vec::new(),
            query_start: 0,
            query_end: aligned,
            matches: aligned,
            mismatches: 0,
            rep_matches: 0,
            query_gap_count: 0,
            target_gap_count: 0,
            score: 0.0,
            identity: 0.0,
        };
        hit.rescore();
        hit
    }

    /// Override score and identity.
    pub fn with_scores(mut self, score: f64, identity: f64) -> Self {
        self.score = score;
        self.identity = identity;
        self
    }

    /// Recompute score and identity from the match counts.
    pub fn rescore(&mut self) {
        self.score = self.compute_score();
        self.identity = self.compute_identity();
    }

    /// Matched bases, less mismatches and gap openings, over the query length.
    ///
    /// Floored at 0 and capped at 1.
    pub fn compute_score(&self) -> f64 {
        if self.query.length == 0 {
            return 0.0;
        }
        let positive = self.matches + self.rep_matches;
        let penalty = self.mismatches + self.query_gap_count + self.target_gap_count;
        let raw = positive.saturating_sub(penalty) as f64 / self.query.length as f64;
        raw.min(1.0)
    }

    /// Matching bases over all aligned bases.
    pub fn compute_identity(&self) -> f64 {
        let positive = self.matches + self.rep_matches;
        let aligned = positive + self.mismatches;
        if aligned == 0 {
            0.0
        } else {
            positive as f64 / aligned as f64
        }
    }

    /// Check the structural invariants of the hit.
    pub fn validate(&self) -> Result<(), ProbeMapError> {
        check_blocks(&self.block_starts, &self.block_sizes).map_err(|e| {
            ProbeMapError::parse_with_code(0, e.to_string(), ErrorCode::InvalidAlignment)
        })?;
        if self.target_end < self.target_start {
            return Err(ProbeMapError::parse_with_code(
                0,
                format!(
                    "target end {} precedes target start {}",
                    self.target_end, self.target_start
                ),
                ErrorCode::InvalidAlignment,
            ));
        }
        Ok(())
    }

    /// Number of bases covered by the blocks.
    pub fn total_aligned_length(&self) -> u64 {
        total_size(&self.block_sizes)
    }

    pub fn query_name(&self) -> &str {
        &self.query.name
    }

    /// Target span as an interval.
    pub fn target_interval(&self) -> GenomicInterval {
        GenomicInterval::new(
            &self.target_chromosome,
            self.target_start,
            Some(self.target_end.saturating_sub(self.target_start)),
            self.strand,
        )
    }
}
