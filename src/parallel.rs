//! Parallel mapping support for ferro-probemap
//!
//! Sequences are independent of each other once hits are grouped, so
//! mapping fans out one sequence per task using rayon. The region cache
//! and provisional store are shared between tasks. Enable with the
//! `parallel` feature.
//!
//! # Example
//!
//! ```no_run
//! # #[cfg(feature = "parallel")]
//! # fn main() {
//! use ferro_probemap::annotation::MockAnnotationStore;
//! use ferro_probemap::parallel::map_accessions_parallel;
//! use ferro_probemap::{ProbeMapper, ProbeMapperConfig};
//!
//! let store = MockAnnotationStore::with_test_data();
//! let mapper = ProbeMapper::new(store, ProbeMapperConfig::default()).unwrap();
//!
//! let outcome = map_accessions_parallel(&mapper, &["BC000001", "AK000000"]);
//! println!("{} mapped, {} failed", outcome.mapped_count(), outcome.failure_count());
//! # }
//! # #[cfg(not(feature = "parallel"))]
//! # fn main() {}
//! ```

use rayon::prelude::*;

use crate::aligner::Aligner;
use crate::annotation::AnnotationStore;
use crate::error::ProbeMapError;
use crate::mapper::{group_hits, MappingOutcome, ProbeMapper};
use crate::model::{AlignmentHit, QuerySequence};
use crate::provisional::ProvisionalRegionStore;

/// Map hits of many sequences in parallel
///
/// Each sequence is processed independently; a failure is recorded
/// against its own sequence only.
pub fn map_hits_parallel<S, P>(mapper: &ProbeMapper<S, P>, hits: Vec<AlignmentHit>) -> MappingOutcome
where
    S: AnnotationStore + Sync,
    P: ProvisionalRegionStore + Sync,
{
    let groups = group_hits(hits);
    let results: Vec<_> = groups
        .par_iter()
        .map(|(name, group)| (name.clone(), mapper.map_sequence(name, group)))
        .collect();
    MappingOutcome::from_results(results)
}

/// Align and map sequences in parallel
pub fn map_sequences_parallel<S, P, A>(
    mapper: &ProbeMapper<S, P>,
    aligner: &A,
    sequences: &[QuerySequence],
) -> MappingOutcome
where
    S: AnnotationStore + Sync,
    P: ProvisionalRegionStore + Sync,
    A: Aligner + Sync,
{
    let results: Vec<_> = sequences
        .par_iter()
        .map(|seq| (seq.name.clone(), mapper.process_sequence(aligner, seq)))
        .collect();
    MappingOutcome::from_results(results)
}

/// Map GenBank accessions in parallel
pub fn map_accessions_parallel<S, P, T>(mapper: &ProbeMapper<S, P>, accessions: &[T]) -> MappingOutcome
where
    S: AnnotationStore + Sync,
    P: ProvisionalRegionStore + Sync,
    T: AsRef<str> + Sync,
{
    let results: Vec<_> = accessions
        .par_iter()
        .map(|a| {
            let result = mapper
                .process_accession(a.as_ref())
                .map(|found| found.into_values().flatten().collect());
            (a.as_ref().to_string(), result)
        })
        .collect();
    MappingOutcome::from_results(results)
}

/// Configuration for parallel batch processing
#[derive(Debug, Clone, Default)]
pub struct ParallelConfig {
    /// Number of threads (0 = use rayon default)
    pub num_threads: usize,
}

impl ParallelConfig {
    /// Create a new parallel configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of threads
    pub fn with_num_threads(mut self, threads: usize) -> Self {
        self.num_threads = threads;
        self
    }

    /// Run `op` on a pool sized by this configuration.
    pub fn install<R, F>(&self, op: F) -> Result<R, ProbeMapError>
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        if self.num_threads == 0 {
            return Ok(op());
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.num_threads)
            .build()
            .map_err(|e| ProbeMapError::Config {
                msg: format!("cannot build thread pool: {}", e),
            })?;
        Ok(pool.install(op))
    }
}

/// Statistics from parallel processing
#[derive(Debug, Clone, Default)]
pub struct ParallelStats {
    /// Sequences processed
    pub total: usize,
    /// Sequences with associations
    pub mapped: usize,
    /// Sequences processed without associations
    pub unmapped: usize,
    /// Sequences that failed
    pub errors: usize,
}

impl ParallelStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Calculate mapped rate as a percentage
    pub fn mapped_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.mapped as f64 / self.total as f64) * 100.0
        }
    }
}

impl From<&MappingOutcome> for ParallelStats {
    fn from(outcome: &MappingOutcome) -> Self {
        let mapped = outcome.mapped_count();
        let unmapped = outcome.unmapped.len();
        let errors = outcome.failure_count();
        Self {
            total: mapped + unmapped + errors,
            mapped,
            unmapped,
            errors,
        }
    }
}
