//! Aligner trait
//!
//! The aligner itself (BLAT, or a service wrapping it) runs outside this
//! crate. Mapping code only needs something that turns a sequence into
//! genome alignment hits.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::ProbeMapError;
use crate::model::{AlignmentHit, QuerySequence, Taxon};
use crate::psl::PslRecord;

/// Trait for aligning sequences to a genome
pub trait Aligner {
    /// Align a sequence to the genome of `taxon`
    ///
    /// Every returned hit should reference the given sequence. Failures are
    /// reported as [`ProbeMapError::Aligner`].
    fn align(&self, sequence: &QuerySequence, taxon: &Taxon)
        -> Result<Vec<AlignmentHit>, ProbeMapError>;
}

/// Blanket implementation for boxed trait objects
impl Aligner for Box<dyn Aligner + Send + Sync> {
    fn align(
        &self,
        sequence: &QuerySequence,
        taxon: &Taxon,
    ) -> Result<Vec<AlignmentHit>, ProbeMapError> {
        (**self).align(sequence, taxon)
    }
}

/// Aligner that replays previously computed PSL records.
///
/// Records are matched to sequences by query name. Records that cannot be
/// turned into hits are logged and skipped.
#[derive(Debug, Clone, Default)]
pub struct PrecomputedAligner {
    records: HashMap<String, Vec<PslRecord>>,
    failures: HashMap<String, String>,
}

impl PrecomputedAligner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an aligner from records for many sequences
    pub fn from_records(records: impl IntoIterator<Item = PslRecord>) -> Self {
        let mut aligner = Self::new();
        for record in records {
            aligner.add_record(record);
        }
        aligner
    }

    pub fn add_record(&mut self, record: PslRecord) {
        self.records
            .entry(record.q_name.clone())
            .or_default()
            .push(record);
    }

    /// Make alignment of `sequence` fail with `msg`
    pub fn fail_for(&mut self, sequence: impl Into<String>, msg: impl Into<String>) {
        self.failures.insert(sequence.into(), msg.into());
    }
}

impl Aligner for PrecomputedAligner {
    fn align(
        &self,
        sequence: &QuerySequence,
        taxon: &Taxon,
    ) -> Result<Vec<AlignmentHit>, ProbeMapError> {
        if let Some(msg) = self.failures.get(&sequence.name) {
            return Err(ProbeMapError::Aligner {
                sequence: sequence.name.clone(),
                msg: msg.clone(),
            });
        }

        let mut query = sequence.clone();
        if query.taxon.is_none() {
            query.taxon = Some(taxon.clone());
        }
        let query = Arc::new(query);

        let mut hits = Vec::new();
        for record in self.records.get(&sequence.name).into_iter().flatten() {
            match record.to_hit(Arc::clone(&query)) {
                Ok(hit) => hits.push(hit),
                Err(e) => log::warn!("Skipping alignment of {}: {}", sequence.name, e),
            }
        }
        Ok(hits)
    }
}
