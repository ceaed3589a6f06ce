//! Annotation store trait
//!
//! Defines the interface to the genome annotation database.

use crate::coords::to_prefixed;
use crate::error::ProbeMapError;
use crate::model::{Strand, Taxon};
use crate::psl::PslRecord;

use super::rows::RawFeatureRow;
use super::tier::FeatureTier;

/// A region-overlap query.
///
/// The chromosome is held in the store's `chr`-prefixed form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegionQuery {
    pub chromosome: String,
    pub start: u64,
    pub end: u64,
    pub strand: Option<Strand>,
}

impl RegionQuery {
    pub fn new(chromosome: &str, start: u64, end: u64, strand: Option<Strand>) -> Self {
        Self {
            chromosome: to_prefixed(chromosome),
            start,
            end,
            strand,
        }
    }

    /// Inclusive overlap test used by region queries.
    ///
    /// A feature matches when it lies inside the query, contains it, or
    /// has either endpoint within it.
    pub fn overlaps(&self, feature_start: u64, feature_end: u64) -> bool {
        (feature_start >= self.start && feature_end <= self.end)
            || (feature_start <= self.start && feature_end >= self.end)
            || (feature_start >= self.start && feature_start <= self.end)
            || (feature_end >= self.start && feature_end <= self.end)
    }

    /// Exact strand restriction; unrestricted when the query has no strand.
    pub fn strand_matches(&self, feature_strand: Option<Strand>) -> bool {
        match self.strand {
            None => true,
            Some(strand) => feature_strand == Some(strand),
        }
    }
}

/// Trait for querying genome annotation
///
/// Implementations might include:
/// - MockAnnotationStore for testing
/// - a client for a UCSC Golden Path MySQL mirror
///
/// Results are ordered by feature start. Connectivity failures should be
/// reported as [`ProbeMapError::Lookup`].
pub trait AnnotationStore {
    /// Organism whose genome this store annotates
    fn taxon(&self) -> &Taxon;

    /// Feature rows from one tier overlapping the region
    fn query_features(
        &self,
        tier: FeatureTier,
        region: &RegionQuery,
    ) -> Result<Vec<RawFeatureRow>, ProbeMapError>;

    /// Spliced mRNA alignments overlapping the region
    ///
    /// This is the broad, less-curated source consulted when exon overlap
    /// with annotated features is poor. The default has none.
    fn query_transcript_alignments(
        &self,
        _region: &RegionQuery,
    ) -> Result<Vec<PslRecord>, ProbeMapError> {
        Ok(Vec::new())
    }

    /// Stored genome alignments of a GenBank accession (mRNA or EST)
    fn find_sequence_locations(&self, _accession: &str) -> Result<Vec<PslRecord>, ProbeMapError> {
        Ok(Vec::new())
    }
}

/// Blanket implementation for boxed trait objects
impl AnnotationStore for Box<dyn AnnotationStore + Send + Sync> {
    fn taxon(&self) -> &Taxon {
        (**self).taxon()
    }

    fn query_features(
        &self,
        tier: FeatureTier,
        region: &RegionQuery,
    ) -> Result<Vec<RawFeatureRow>, ProbeMapError> {
        (**self).query_features(tier, region)
    }

    fn query_transcript_alignments(
        &self,
        region: &RegionQuery,
    ) -> Result<Vec<PslRecord>, ProbeMapError> {
        (**self).query_transcript_alignments(region)
    }

    fn find_sequence_locations(&self, accession: &str) -> Result<Vec<PslRecord>, ProbeMapError> {
        (**self).find_sequence_locations(accession)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_prefixes_chromosome() {
        let q = RegionQuery::new("7", 10, 20, None);
        assert_eq!(q.chromosome, "chr7");
    }

    #[test]
    fn test_inclusive_overlap() {
        let q = RegionQuery::new("1", 100, 200, None);
        assert!(q.overlaps(120, 180)); // inside
        assert!(q.overlaps(50, 250)); // contains
        assert!(q.overlaps(150, 300)); // start inside
        assert!(q.overlaps(50, 150)); // end inside
        assert!(q.overlaps(200, 300)); // touches end, inclusive
        assert!(q.overlaps(0, 100)); // touches start, inclusive
        assert!(!q.overlaps(201, 300));
        assert!(!q.overlaps(0, 99));
    }

    #[test]
    fn test_strand_restriction() {
        let any = RegionQuery::new("1", 0, 10, None);
        assert!(any.strand_matches(None));
        assert!(any.strand_matches(Some(Strand::Minus)));

        let plus = RegionQuery::new("1", 0, 10, Some(Strand::Plus));
        assert!(plus.strand_matches(Some(Strand::Plus)));
        assert!(!plus.strand_matches(Some(Strand::Minus)));
        assert!(!plus.strand_matches(None));
    }
}
