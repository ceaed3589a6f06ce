//! Sequence-at-a-time mapping with progress reporting

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::aligner::Aligner;
use crate::annotation::AnnotationStore;
use crate::error::ProbeMapError;
use crate::mapper::{group_hits, HitGroup, ProbeMapper};
use crate::model::{AlignmentHit, Association, QuerySequence};
use crate::provisional::{NoProvisionalRegions, ProvisionalRegionStore};

#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Whether to continue with the next sequence after a failure.
    pub continue_on_error: bool,
    /// Report progress every this many sequences
    pub progress_interval: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            continue_on_error: true,
            progress_interval: 100,
        }
    }
}

impl BatchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = continue_on_error;
        self
    }

    pub fn progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval;
        self
    }
}

/// Snapshot handed to the progress callback
#[derive(Debug, Clone)]
pub struct BatchProgress {
    pub total: usize,
    pub processed: usize,
    pub success: usize,
    pub errors: usize,
    pub elapsed: Duration,
}

impl BatchProgress {
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            (self.processed as f64 / self.total as f64) * 100.0
        }
    }

    /// Sequences per second; 0.0 until time has elapsed
    pub fn items_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs < f64::EPSILON {
            0.0
        } else {
            self.processed as f64 / secs
        }
    }

    pub fn estimated_remaining(&self) -> Option<Duration> {
        let rate = self.items_per_second();
        if rate == 0.0 {
            return None;
        }
        let remaining_items = self.total.saturating_sub(self.processed);
        let remaining_secs = remaining_items as f64 / rate;
        Some(Duration::from_secs_f64(remaining_secs))
    }
}

/// Result for one sequence in a batch.
#[derive(Debug, Clone)]
pub enum ItemResult<T> {
    /// The sequence was processed; it may still have no associations.
    Ok(T),
    /// Processing of the sequence failed.
    Err {
        /// Sequence name or accession
        input: Option<String>,
        error: ProbeMapError,
    },
}

impl<T> ItemResult<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, ItemResult::Ok(_))
    }

    pub fn is_err(&self) -> bool {
        matches!(self, ItemResult::Err { .. })
    }

    pub fn ok(self) -> Option<T> {
        match self {
            ItemResult::Ok(v) => Some(v),
            ItemResult::Err { .. } => None,
        }
    }
}

/// Per-sequence results in input order
#[derive(Debug)]
pub struct BatchResult<T> {
    pub results: Vec<ItemResult<T>>,
    pub duration: Duration,
}

impl<T> BatchResult<T> {
    pub fn new(results: Vec<ItemResult<T>>, duration: Duration) -> Self {
        Self { results, duration }
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_ok()).count()
    }

    pub fn error_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_err()).count()
    }

    pub fn successes(self) -> Vec<T> {
        self.results.into_iter().filter_map(|r| r.ok()).collect()
    }

    pub fn all_ok(&self) -> bool {
        self.results.iter().all(|r| r.is_ok())
    }

    pub fn has_errors(&self) -> bool {
        self.results.iter().any(|r| r.is_err())
    }

    pub fn success_refs(&self) -> Vec<&T> {
        self.results
            .iter()
            .filter_map(|r| match r {
                ItemResult::Ok(v) => Some(v),
                ItemResult::Err { .. } => None,
            })
            .collect()
    }
}

/// Associations found for one sequence.
#[derive(Debug, Clone)]
pub struct SequenceMapping {
    pub name: String,
    pub associations: Vec<Association>,
}

impl SequenceMapping {
    /// Whether any association survived filtering.
    pub fn is_mapped(&self) -> bool {
        !self.associations.is_empty()
    }
}

impl BatchResult<SequenceMapping> {
    /// Number of sequences with at least one association.
    pub fn mapped_count(&self) -> usize {
        self.success_refs().iter().filter(|m| m.is_mapped()).count()
    }

    /// Number of sequences processed without finding any association.
    pub fn unmapped_count(&self) -> usize {
        self.success_count() - self.mapped_count()
    }
}

/// Batch processor for mapping many sequences.
///
/// Wraps a [`ProbeMapper`] with progress reporting and error aggregation.
/// A failed sequence is reported separately from a sequence that simply
/// has no associations.
pub struct BatchProcessor<S: AnnotationStore, P: ProvisionalRegionStore = NoProvisionalRegions> {
    mapper: ProbeMapper<S, P>,
    config: BatchConfig,
}

impl<S: AnnotationStore, P: ProvisionalRegionStore> BatchProcessor<S, P> {
    pub fn new(mapper: ProbeMapper<S, P>) -> Self {
        Self::with_config(mapper, BatchConfig::default())
    }

    pub fn with_config(mapper: ProbeMapper<S, P>, config: BatchConfig) -> Self {
        Self { mapper, config }
    }

    pub fn mapper(&self) -> &ProbeMapper<S, P> {
        &self.mapper
    }

    /// Map precomputed hits, one batch item per query sequence.
    pub fn map_hits(&self, hits: Vec<AlignmentHit>) -> BatchResult<SequenceMapping> {
        self.map_hits_with_progress(hits, |_| {})
    }

    pub fn map_hits_with_progress<F>(
        &self,
        hits: Vec<AlignmentHit>,
        progress_fn: F,
    ) -> BatchResult<SequenceMapping>
    where
        F: FnMut(BatchProgress),
    {
        let groups: Vec<HitGroup> = group_hits(hits);
        self.run(
            &groups,
            |(name, _): &HitGroup| name.clone(),
            |(name, group): &HitGroup| self.mapper.map_sequence(name, group),
            progress_fn,
        )
    }

    /// Map GenBank accessions by their stored alignments.
    pub fn map_accessions<A: AsRef<str>>(&self, accessions: &[A]) -> BatchResult<SequenceMapping> {
        self.map_accessions_with_progress(accessions, |_| {})
    }

    /// Alignments stored under one accession may carry several query
    /// names (versions); their associations are merged into one item.
    pub fn map_accessions_with_progress<A, F>(
        &self,
        accessions: &[A],
        progress_fn: F,
    ) -> BatchResult<SequenceMapping>
    where
        A: AsRef<str>,
        F: FnMut(BatchProgress),
    {
        self.run(
            accessions,
            |a: &A| a.as_ref().to_string(),
            |a: &A| {
                let results = self.mapper.process_accession(a.as_ref())?;
                Ok(results.into_values().flatten().collect())
            },
            progress_fn,
        )
    }

    /// Align and map sequences.
    pub fn map_sequences<L: Aligner>(
        &self,
        aligner: &L,
        sequences: &[QuerySequence],
    ) -> BatchResult<SequenceMapping> {
        self.map_sequences_with_progress(aligner, sequences, |_| {})
    }

    pub fn map_sequences_with_progress<L, F>(
        &self,
        aligner: &L,
        sequences: &[QuerySequence],
        progress_fn: F,
    ) -> BatchResult<SequenceMapping>
    where
        L: Aligner,
        F: FnMut(BatchProgress),
    {
        self.run(
            sequences,
            |s: &QuerySequence| s.name.clone(),
            |s: &QuerySequence| self.mapper.process_sequence(aligner, s),
            progress_fn,
        )
    }

    fn run<I, N, M, F>(
        &self,
        items: &[I],
        name_of: N,
        map: M,
        mut progress_fn: F,
    ) -> BatchResult<SequenceMapping>
    where
        N: Fn(&I) -> String,
        M: Fn(&I) -> Result<Vec<Association>, ProbeMapError>,
        F: FnMut(BatchProgress),
    {
        let start = Instant::now();
        let total = items.len();
        let interval = self.config.progress_interval.max(1);
        let mut results = Vec::with_capacity(total);
        let mut success = 0;
        let mut errors = 0;

        for (i, item) in items.iter().enumerate() {
            let name = name_of(item);
            match map(item) {
                Ok(associations) => {
                    results.push(ItemResult::Ok(SequenceMapping { name, associations }));
                    success += 1;
                }
                Err(error) => {
                    log::warn!("Mapping of {} failed: {}", name, error);
                    results.push(ItemResult::Err {
                        input: Some(name),
                        error,
                    });
                    errors += 1;
                }
            }

            let stop = errors > 0 && !self.config.continue_on_error;
            if (i + 1) % interval == 0 || i + 1 == total || stop {
                progress_fn(BatchProgress {
                    total,
                    processed: i + 1,
                    success,
                    errors,
                    elapsed: start.elapsed(),
                });
            }
            if stop {
                break;
            }
        }

        BatchResult::new(results, start.elapsed())
    }
}

/// Flatten a batch into per-sequence association lists, dropping failures
/// and unmapped sequences.
pub fn into_association_map(
    result: BatchResult<SequenceMapping>,
) -> HashMap<String, Vec<Association>> {
    result
        .successes()
        .into_iter()
        .filter(|m| m.is_mapped())
        .map(|m| (m.name, m.associations))
        .collect()
}
