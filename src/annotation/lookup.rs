//! Tiered feature lookup over an annotation store.

use std::collections::HashSet;
use std::sync::Arc;

use crate::cache::{RegionCache, RegionKey};
use crate::error::ProbeMapError;
use crate::model::{AlignmentHit, Association, Gene, GeneProduct, Strand};
use crate::overlap::{gene_exon_overlap, gene_product_exon_overlap};
use crate::three_prime::{locate, ThreePrimeMethod};

use super::rows::{transcript_alignment_gene, RowMapper};
use super::store::{AnnotationStore, RegionQuery};
use super::tier::TierPolicy;

/// Exon-overlap fraction below which transcript alignments are consulted.
pub const RECHECK_OVERLAP_THRESHOLD: f64 = 0.9;

/// Finds annotated features overlapping genomic regions.
pub struct GenomicFeatureLookup<S: AnnotationStore> {
    store: S,
    policy: TierPolicy,
    cache: Arc<RegionCache>,
}

impl<S: AnnotationStore> GenomicFeatureLookup<S> {
    /// Create a lookup with the default tier policy and a fresh cache.
    pub fn new(store: S) -> Self {
        Self {
            store,
            policy: TierPolicy::default(),
            cache: Arc::new(RegionCache::default()),
        }
    }

    pub fn with_policy(mut self, policy: TierPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Use a shared region cache.
    pub fn with_cache(mut self, cache: Arc<RegionCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn policy(&self) -> &TierPolicy {
        &self.policy
    }

    pub fn cache(&self) -> &RegionCache {
        &self.cache
    }

    /// Gene products overlapping `[start, end]` on `chromosome`.
    ///
    /// Tiers are queried in policy order. Returns `None` when no tier has
    /// any feature, so callers can fall back to provisional regions.
    /// Products with the same name from several tiers are reported once.
    pub fn find_features(
        &self,
        chromosome: &str,
        start: u64,
        end: u64,
        strand: Option<Strand>,
    ) -> Result<Option<Vec<GeneProduct>>, ProbeMapError> {
        if end < start {
            return Err(ProbeMapError::invalid_argument(format!(
                "end {} precedes start {} on {}",
                end, start, chromosome
            )));
        }

        let region = RegionQuery::new(chromosome, start, end, strand);
        let taxon = self.store.taxon();
        let mut found: Vec<GeneProduct> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for rule in self.policy.rules() {
            if !TierPolicy::should_query(rule, found.len()) || !rule.tier.applies_to(taxon) {
                continue;
            }
            let rows = self.store.query_features(rule.tier, &region)?;
            if rows.is_empty() {
                continue;
            }
            log::debug!(
                "{} {} rows for {}:{}-{}",
                rows.len(),
                rule.tier,
                region.chromosome,
                start,
                end
            );

            let mapper = RowMapper::new(rule.tier.kind(), taxon.clone());
            for product in mapper.map_rows(&rows)? {
                if seen.insert(product.name.clone()) {
                    found.push(product);
                }
            }
        }

        Ok(if found.is_empty() { None } else { Some(found) })
    }

    /// Spliced mRNA alignments in a region, memoized per region.
    pub fn find_transcript_alignments(
        &self,
        chromosome: &str,
        start: u64,
        end: u64,
    ) -> Result<Arc<Vec<Gene>>, ProbeMapError> {
        let key = RegionKey::new(chromosome, start, end);
        self.cache.get_or_fetch(&key, || {
            let region = RegionQuery::new(chromosome, start, end, None);
            let taxon = self.store.taxon();
            self.store
                .query_transcript_alignments(&region)?
                .iter()
                .map(|record| transcript_alignment_gene(record, taxon))
                .collect()
        })
    }

    /// Improve a poor exon overlap using transcript alignments.
    ///
    /// When `overlap` covers less than [`RECHECK_OVERLAP_THRESHOLD`] of the
    /// aligned bases, the best overlap with any mRNA aligned to the hit's
    /// region is used instead, if larger.
    pub fn refine_overlap(&self, hit: &AlignmentHit, overlap: u64) -> Result<u64, ProbeMapError> {
        let aligned = hit.total_aligned_length();
        if aligned == 0 || (overlap as f64 / aligned as f64) >= RECHECK_OVERLAP_THRESHOLD {
            return Ok(overlap);
        }

        let genes = self.find_transcript_alignments(
            &hit.target_chromosome,
            hit.target_start,
            hit.target_end,
        )?;

        let mut best = overlap;
        for gene in genes.iter() {
            let candidate = gene_exon_overlap(
                &hit.target_chromosome,
                &hit.block_starts,
                &hit.block_sizes,
                None,
                gene,
            )?;
            best = best.max(candidate);
        }
        if best > overlap {
            log::debug!(
                "Refined overlap for {} from {} to {} using transcript alignments",
                hit.query_name(),
                overlap,
                best
            );
        }
        Ok(best)
    }

    /// Associations between a hit and every feature overlapping it.
    ///
    /// Exon overlap is computed without strand restriction, refined when
    /// poor, and the 3' distance is measured with `method`. Returns `None`
    /// when no feature overlaps the hit. Features without a strand are
    /// skipped; if every overlapping feature lacks one the result is an
    /// `InvalidArgument` error.
    pub fn find_associations(
        &self,
        hit: &Arc<AlignmentHit>,
        strand: Option<Strand>,
        method: ThreePrimeMethod,
    ) -> Result<Option<Vec<Association>>, ProbeMapError> {
        let products = match self.find_features(
            &hit.target_chromosome,
            hit.target_start,
            hit.target_end,
            strand,
        )? {
            Some(products) => products,
            None => return Ok(None),
        };

        let mut associations = Vec::with_capacity(products.len());
        let mut strandless = Vec::new();
        for product in products {
            if product.strand().is_none() {
                log::warn!(
                    "Skipping feature {} for {}: no strand",
                    product.name,
                    hit.query_name()
                );
                strandless.push(product.name);
                continue;
            }
            let exon_overlap =
                gene_product_exon_overlap(&hit.block_starts, &hit.block_sizes, None, &product)?;
            let overlap = self.refine_overlap(hit, exon_overlap)?;
            let location = locate(
                method,
                &product.location,
                hit.target_start,
                hit.target_end,
                &hit.block_starts,
                &hit.block_sizes,
                overlap,
            )?;
            associations.push(
                Association::new(Arc::clone(hit), product, location.overlap)
                    .with_three_prime(location.distance, method),
            );
        }
        if associations.is_empty() && !strandless.is_empty() {
            return Err(ProbeMapError::invalid_argument(format!(
                "no usable feature for {}: {} without strand",
                hit.query_name(),
                strandless.join(", ")
            )));
        }
        Ok(Some(associations))
    }
}
