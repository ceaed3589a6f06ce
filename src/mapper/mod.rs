//! The mapping pipeline: alignment hits in, gene associations out.
//!
//! Hits are grouped by query sequence. Each sequence then goes through:
//!
//! 1. a repeat gate that skips repetitive sequences landing at many sites
//! 2. per-hit score and identity thresholds
//! 3. hit validation; malformed hits are logged and skipped
//! 4. feature lookup, with strand honored per sequence type
//! 5. provisional fallback when nothing annotated overlaps the hit
//! 6. scoring, collapsing per gene product, and the exon-overlap filter
//!
//! Sequences that end with no associations are left out of the results.
//!
//! # Example
//!
//! ```
//! use ferro_probemap::annotation::MockAnnotationStore;
//! use ferro_probemap::model::{AlignmentHit, QuerySequence, Strand};
//! use ferro_probemap::{ProbeMapper, ProbeMapperConfig};
//! use std::sync::Arc;
//!
//! let mapper = ProbeMapper::new(MockAnnotationStore::with_test_data(), ProbeMapperConfig::default())
//!     .unwrap();
//! let query = Arc::new(QuerySequence::new("probe1", 100));
//! let hit = AlignmentHit::new(query, "chr1", 1000, 1100, Some(Strand::Plus), vec![1000], vec![100]);
//!
//! let results = mapper.process_hits(vec![hit]).unwrap();
//! assert_eq!(results["probe1"][0].gene_product.name, "NM_TEST1");
//! ```

mod strand;

pub use strand::StrandPolicy;

use std::collections::HashMap;
use std::sync::Arc;

use crate::aligner::Aligner;
use crate::annotation::{AnnotationStore, GenomicFeatureLookup, TierPolicy};
use crate::cache::RegionCache;
use crate::config::ProbeMapperConfig;
use crate::error::ProbeMapError;
use crate::model::{AlignmentHit, Association, QuerySequence, Strand};
use crate::overlap::gene_product_exon_overlap;
use crate::provisional::{
    create_provisional, provisional_association, NoProvisionalRegions, ProvisionalRegionStore,
};
use crate::psl::{to_hits, PslRecord};
use crate::scoring::AssociationScorer;

/// Hits of one query sequence.
pub type HitGroup = (String, Vec<Arc<AlignmentHit>>);

/// A sequence whose mapping failed.
#[derive(Debug)]
pub struct SequenceFailure {
    pub sequence: String,
    pub error: ProbeMapError,
}

/// Results of mapping many sequences with per-sequence error isolation.
#[derive(Debug, Default)]
pub struct MappingOutcome {
    /// Associations of every sequence that mapped
    pub associations: HashMap<String, Vec<Association>>,
    /// Sequences whose processing failed
    pub failures: Vec<SequenceFailure>,
    /// Sequences processed without finding any association
    pub unmapped: Vec<String>,
}

impl MappingOutcome {
    /// Collect per-sequence results.
    pub fn from_results(
        results: impl IntoIterator<Item = (String, Result<Vec<Association>, ProbeMapError>)>,
    ) -> Self {
        let mut outcome = Self::default();
        for (sequence, result) in results {
            outcome.record(sequence, result);
        }
        outcome
    }

    fn record(&mut self, sequence: String, result: Result<Vec<Association>, ProbeMapError>) {
        match result {
            Ok(associations) if associations.is_empty() => self.unmapped.push(sequence),
            Ok(associations) => {
                self.associations.insert(sequence, associations);
            }
            Err(error) => {
                log::warn!("Mapping of {} failed: {}", sequence, error);
                self.failures.push(SequenceFailure { sequence, error });
            }
        }
    }

    pub fn mapped_count(&self) -> usize {
        self.associations.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }
}

/// Group hits by query name, keeping the order sequences first appear in.
pub fn group_hits(hits: impl IntoIterator<Item = AlignmentHit>) -> Vec<HitGroup> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<HitGroup> = Vec::new();
    for hit in hits {
        let name = hit.query_name().to_string();
        let slot = *index.entry(name.clone()).or_insert_with(|| {
            groups.push((name, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(Arc::new(hit));
    }
    groups
}

/// Resolves alignment hits to gene products.
pub struct ProbeMapper<S: AnnotationStore, P: ProvisionalRegionStore = NoProvisionalRegions> {
    lookup: GenomicFeatureLookup<S>,
    provisional: P,
    config: ProbeMapperConfig,
    strand_policy: StrandPolicy,
    scorer: AssociationScorer,
}

impl<S: AnnotationStore> ProbeMapper<S, NoProvisionalRegions> {
    /// Create a mapper over an annotation store.
    ///
    /// The configuration is validated; an unsupported 3' method or an
    /// out-of-range threshold is rejected here rather than per hit.
    pub fn new(store: S, config: ProbeMapperConfig) -> Result<Self, ProbeMapError> {
        config.validate()?;
        let policy = if config.allow_predicted {
            TierPolicy::default()
        } else {
            TierPolicy::without_predicted()
        };
        let cache = Arc::new(RegionCache::new(config.region_cache_capacity));
        let lookup = GenomicFeatureLookup::new(store)
            .with_policy(policy)
            .with_cache(cache);
        let scorer = AssociationScorer::new(config.minimum_exon_overlap_fraction);

        Ok(Self {
            lookup,
            provisional: NoProvisionalRegions,
            config,
            strand_policy: StrandPolicy::default(),
            scorer,
        })
    }
}

impl<S: AnnotationStore, P: ProvisionalRegionStore> ProbeMapper<S, P> {
    /// Consult previously created provisional regions before making new ones.
    pub fn with_provisional_store<Q: ProvisionalRegionStore>(self, store: Q) -> ProbeMapper<S, Q> {
        ProbeMapper {
            lookup: self.lookup,
            provisional: store,
            config: self.config,
            strand_policy: self.strand_policy,
            scorer: self.scorer,
        }
    }

    /// Share a region cache between mappers.
    pub fn with_cache(mut self, cache: Arc<RegionCache>) -> Self {
        self.lookup = self.lookup.with_cache(cache);
        self
    }

    pub fn with_strand_policy(mut self, policy: StrandPolicy) -> Self {
        self.strand_policy = policy;
        self
    }

    pub fn config(&self) -> &ProbeMapperConfig {
        &self.config
    }

    pub fn lookup(&self) -> &GenomicFeatureLookup<S> {
        &self.lookup
    }

    pub fn provisional_store(&self) -> &P {
        &self.provisional
    }

    /// Map hits for any number of sequences.
    ///
    /// The first sequence-level failure aborts the call. Use
    /// [`process_hits_isolated`](Self::process_hits_isolated) to keep going.
    pub fn process_hits(
        &self,
        hits: impl IntoIterator<Item = AlignmentHit>,
    ) -> Result<HashMap<String, Vec<Association>>, ProbeMapError> {
        let mut results = HashMap::new();
        for (name, group) in group_hits(hits) {
            let associations = self.map_sequence(&name, &group)?;
            if !associations.is_empty() {
                results.insert(name, associations);
            }
        }
        Ok(results)
    }

    /// Map hits, isolating failures to the sequence they occur in.
    pub fn process_hits_isolated(&self, hits: impl IntoIterator<Item = AlignmentHit>) -> MappingOutcome {
        MappingOutcome::from_results(group_hits(hits).into_iter().map(|(name, group)| {
            let result = self.map_sequence(&name, &group);
            (name, result)
        }))
    }

    /// Map a GenBank accession using its stored genome alignments.
    pub fn process_accession(
        &self,
        accession: &str,
    ) -> Result<HashMap<String, Vec<Association>>, ProbeMapError> {
        let records = self.lookup.store().find_sequence_locations(accession)?;
        if records.is_empty() {
            log::info!("No stored alignments for {}", accession);
            return Ok(HashMap::new());
        }
        self.process_hits(self.hits_from_records(&records))
    }

    /// Map many accessions; a failure affects only its own accession.
    pub fn process_accessions<A: AsRef<str>>(&self, accessions: &[A]) -> MappingOutcome {
        let mut outcome = MappingOutcome::default();
        for accession in accessions {
            let accession = accession.as_ref();
            match self.process_accession(accession) {
                Ok(results) if results.is_empty() => outcome.unmapped.push(accession.to_string()),
                Ok(results) => outcome.associations.extend(results),
                Err(error) => outcome.record(accession.to_string(), Err(error)),
            }
        }
        outcome
    }

    /// Align a sequence and map its hits.
    pub fn process_sequence<A: Aligner>(
        &self,
        aligner: &A,
        sequence: &QuerySequence,
    ) -> Result<Vec<Association>, ProbeMapError> {
        let taxon = sequence
            .taxon
            .as_ref()
            .unwrap_or_else(|| self.lookup.store().taxon());
        let hits = aligner.align(sequence, taxon)?;
        let group: Vec<Arc<AlignmentHit>> = hits.into_iter().map(Arc::new).collect();
        self.map_sequence(&sequence.name, &group)
    }

    /// Align and map many sequences with per-sequence error isolation.
    pub fn process_sequences<A: Aligner>(
        &self,
        aligner: &A,
        sequences: &[QuerySequence],
    ) -> MappingOutcome {
        MappingOutcome::from_results(
            sequences
                .iter()
                .map(|seq| (seq.name.clone(), self.process_sequence(aligner, seq))),
        )
    }

    fn hits_from_records(&self, records: &[PslRecord]) -> Vec<AlignmentHit> {
        let taxon = self.lookup.store().taxon();
        let known: HashMap<String, QuerySequence> = records
            .iter()
            .map(|r| (r.q_name.clone(), r.query_sequence().with_taxon(taxon.clone())))
            .collect();
        to_hits(records, &known)
            .into_iter()
            .filter_map(|result| match result {
                Ok(hit) => Some(hit),
                Err(e) => {
                    log::warn!("Skipping stored alignment: {}", e);
                    None
                }
            })
            .collect()
    }

    /// Run the per-sequence pipeline over the hits of one sequence.
    ///
    /// Returns an empty list when the sequence is gated out or nothing
    /// survives filtering.
    pub fn map_sequence(
        &self,
        name: &str,
        hits: &[Arc<AlignmentHit>],
    ) -> Result<Vec<Association>, ProbeMapError> {
        let Some(first) = hits.first() else {
            return Ok(Vec::new());
        };
        let query = &first.query;

        if let Some(repeats) = query.fraction_repeats {
            if repeats > self.config.maximum_repeat_fraction
                && hits.len() >= self.config.non_specific_site_count_threshold
            {
                log::info!(
                    "Skipping {}: {:.0}% repeats with {} hits",
                    name,
                    repeats * 100.0,
                    hits.len()
                );
                return Ok(Vec::new());
            }
        }

        let use_strand =
            !self.config.ignore_strand && self.strand_policy.uses_strand(query.sequence_type);

        let mut associations = Vec::new();
        for hit in hits {
            check_scores(hit)?;
            if hit.score < self.config.blat_score_threshold
                || hit.identity < self.config.identity_threshold
            {
                log::debug!(
                    "Hit of {} at {} below thresholds (score {:.3}, identity {:.3})",
                    name,
                    hit.target_interval(),
                    hit.score,
                    hit.identity
                );
                continue;
            }

            match self.resolve_hit(hit, use_strand) {
                Ok(found) => associations.extend(found),
                Err(e) if e.is_hit_local() => {
                    log::warn!("Skipping hit of {} at {}: {}", name, hit.target_interval(), e);
                }
                Err(e) => return Err(e),
            }
        }

        if associations.is_empty() {
            return Ok(associations);
        }
        let scored = self.scorer.score_results(associations)?;
        Ok(self.scorer.filter_on_overlap(scored))
    }

    fn resolve_hit(
        &self,
        hit: &Arc<AlignmentHit>,
        use_strand: bool,
    ) -> Result<Vec<Association>, ProbeMapError> {
        hit.validate()?;
        let strand = if use_strand { hit.strand } else { None };

        match self
            .lookup
            .find_associations(hit, strand, self.config.three_prime_method)
        {
            Ok(Some(found)) => return Ok(found),
            Ok(None) => {}
            Err(e) if e.allows_provisional_fallback() => {
                log::warn!(
                    "Feature lookup for {} at {} failed, using provisional regions: {}",
                    hit.query_name(),
                    hit.target_interval(),
                    e
                );
            }
            Err(e) => return Err(e),
        }

        self.provisional_fallback(hit, strand)
    }

    fn provisional_fallback(
        &self,
        hit: &Arc<AlignmentHit>,
        strand: Option<Strand>,
    ) -> Result<Vec<Association>, ProbeMapError> {
        let mut region = hit.target_interval();
        region.strand = strand;
        let mut found = Vec::new();
        for product in self.provisional.find_overlapping(&region)? {
            let overlap =
                gene_product_exon_overlap(&hit.block_starts, &hit.block_sizes, strand, &product)?;
            if overlap > 0 {
                found.push(Association::new(Arc::clone(hit), product, overlap));
            }
        }
        if !found.is_empty() {
            return Ok(found);
        }

        if !self.config.allow_provisional {
            return Ok(Vec::new());
        }
        let region = create_provisional(hit);
        log::debug!("Created provisional region {}", region.product.name);
        Ok(vec![provisional_association(hit, region.into_product())])
    }
}

fn check_scores(hit: &AlignmentHit) -> Result<(), ProbeMapError> {
    if hit.score.is_nan() || hit.score < 0.0 || hit.identity.is_nan() || hit.identity < 0.0 {
        return Err(ProbeMapError::Invariant {
            msg: format!(
                "hit of {} at {} has score {} and identity {}",
                hit.query_name(),
                hit.target_interval(),
                hit.score,
                hit.identity
            ),
        });
    }
    Ok(())
}
