//! Mock annotation store for testing

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::coords::same_chromosome;
use crate::error::ProbeMapError;
use crate::model::{Strand, Taxon};
use crate::psl::PslRecord;

use super::rows::RawFeatureRow;
use super::store::{AnnotationStore, RegionQuery};
use super::tier::FeatureTier;

/// Serialized form of a mock store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MockAnnotationData {
    pub taxon: Option<Taxon>,
    #[serde(default)]
    pub features: HashMap<FeatureTier, Vec<RawFeatureRow>>,
    #[serde(default)]
    pub transcript_alignments: Vec<PslRecord>,
    #[serde(default)]
    pub sequence_locations: HashMap<String, Vec<PslRecord>>,
}

/// In-memory annotation store.
///
/// Applies the same inclusive overlap and strand rules as a real store and
/// counts queries so tests can observe caching.
pub struct MockAnnotationStore {
    taxon: Taxon,
    features: HashMap<FeatureTier, Vec<RawFeatureRow>>,
    transcript_alignments: Vec<PslRecord>,
    sequence_locations: HashMap<String, Vec<PslRecord>>,
    failure: Option<String>,
    feature_queries: AtomicUsize,
    transcript_queries: AtomicUsize,
}

impl MockAnnotationStore {
    /// Create an empty store for `taxon`
    pub fn new(taxon: Taxon) -> Self {
        Self {
            taxon,
            features: HashMap::new(),
            transcript_alignments: Vec::new(),
            sequence_locations: HashMap::new(),
            failure: None,
            feature_queries: AtomicUsize::new(0),
            transcript_queries: AtomicUsize::new(0),
        }
    }

    /// Load a store from a JSON file
    pub fn from_json(path: &Path) -> Result<Self, ProbeMapError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Load a store from JSON text
    pub fn from_json_str(content: &str) -> Result<Self, ProbeMapError> {
        let data: MockAnnotationData = serde_json::from_str(content)?;
        Ok(Self::from_data(data))
    }

    pub fn from_data(data: MockAnnotationData) -> Self {
        let mut store = Self::new(data.taxon.unwrap_or_else(Taxon::human));
        store.features = data.features;
        store.transcript_alignments = data.transcript_alignments;
        store.sequence_locations = data.sequence_locations;
        store
    }

    /// Add a feature row to a tier
    pub fn add_feature(&mut self, tier: FeatureTier, row: RawFeatureRow) {
        self.features.entry(tier).or_default().push(row);
    }

    /// Add a spliced mRNA alignment
    pub fn add_transcript_alignment(&mut self, record: PslRecord) {
        self.transcript_alignments.push(record);
    }

    /// Add a stored alignment for an accession
    pub fn add_sequence_location(&mut self, accession: impl Into<String>, record: PslRecord) {
        self.sequence_locations
            .entry(accession.into())
            .or_default()
            .push(record);
    }

    /// Make every query fail as if the store were unreachable
    pub fn fail_with(&mut self, msg: impl Into<String>) {
        self.failure = Some(msg.into());
    }

    /// Number of tier queries answered so far
    pub fn feature_query_count(&self) -> usize {
        self.feature_queries.load(Ordering::Relaxed)
    }

    /// Number of transcript-alignment queries answered so far
    pub fn transcript_query_count(&self) -> usize {
        self.transcript_queries.load(Ordering::Relaxed)
    }

    fn check_available(&self) -> Result<(), ProbeMapError> {
        match &self.failure {
            Some(msg) => Err(ProbeMapError::lookup(msg.clone())),
            None => Ok(()),
        }
    }

    /// Create a store with a few human features on chr1
    ///
    /// - `NM_TEST1` (GENE1, +): exons 1000-1100, 1200-1300, 1400-1500
    /// - `NM_TEST2` (GENE2, -): exons 5000-5200, 5300-5500
    /// - `hsa-mir-test` (small RNA, +): 8000-8080, no exons
    /// - `acembly.g1` (predicted, +): 20000-21000, human only
    /// - `nscan.g1` (predicted, -): 20500-22000
    /// - mRNA `BC000001` aligned at 30000-30100 and 30300-30400, also
    ///   stored as the genome location of accession `BC000001`
    pub fn with_test_data() -> Self {
        let mut store = Self::new(Taxon::human());
        store.add_feature(
            FeatureTier::Curated,
            RawFeatureRow::new("NM_TEST1", "chr1", 1000, 1500, Some("+"))
                .with_symbol("GENE1")
                .with_exons("1000,1200,1400,", "1100,1300,1500,"),
        );
        store.add_feature(
            FeatureTier::KnownGene,
            RawFeatureRow::new("NM_TEST2", "chr1", 5000, 5500, Some("-"))
                .with_symbol("GENE2")
                .with_exons("5000,5300,", "5200,5500,"),
        );
        store.add_feature(
            FeatureTier::SmallRna,
            RawFeatureRow::new("hsa-mir-test", "chr1", 8000, 8080, Some("+")),
        );
        store.add_feature(
            FeatureTier::PredictedSpeciesRestricted,
            RawFeatureRow::new("acembly.g1", "chr1", 20000, 21000, Some("+"))
                .with_exons("20000,", "21000,"),
        );
        store.add_feature(
            FeatureTier::PredictedBroad,
            RawFeatureRow::new("nscan.g1", "chr1", 20500, 22000, Some("-"))
                .with_exons("20500,", "22000,"),
        );
        let mrna = PslRecord {
            matches: 200,
            mis_matches: 0,
            rep_matches: 0,
            n_count: 0,
            q_num_insert: 0,
            q_base_insert: 0,
            t_num_insert: 1,
            t_base_insert: 200,
            strand: "+".to_string(),
            q_name: "BC000001".to_string(),
            q_size: 200,
            q_start: 0,
            q_end: 200,
            t_name: "chr1".to_string(),
            t_size: 248956422,
            t_start: 30000,
            t_end: 30400,
            block_count: 2,
            block_sizes: "100,100,".to_string(),
            q_starts: "0,100,".to_string(),
            t_starts: "30000,30300,".to_string(),
        };
        store.add_sequence_location("BC000001", mrna.clone());
        store.add_transcript_alignment(mrna);
        store
    }
}

impl Default for MockAnnotationStore {
    fn default() -> Self {
        Self::new(Taxon::human())
    }
}

impl AnnotationStore for MockAnnotationStore {
    fn taxon(&self) -> &Taxon {
        &self.taxon
    }

    fn query_features(
        &self,
        tier: FeatureTier,
        region: &RegionQuery,
    ) -> Result<Vec<RawFeatureRow>, ProbeMapError> {
        self.check_available()?;
        self.feature_queries.fetch_add(1, Ordering::Relaxed);

        let mut rows: Vec<RawFeatureRow> = self
            .features
            .get(&tier)
            .map(|rows| {
                rows.iter()
                    .filter(|row| same_chromosome(&row.chromosome, &region.chromosome))
                    .filter(|row| region.overlaps(row.tx_start, row.tx_end))
                    .filter(|row| {
                        let strand = row
                            .strand
                            .as_deref()
                            .and_then(|s| Strand::parse_optional(s).ok().flatten());
                        region.strand_matches(strand)
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        rows.sort_by_key(|row| row.tx_start);
        Ok(rows)
    }

    fn query_transcript_alignments(
        &self,
        region: &RegionQuery,
    ) -> Result<Vec<PslRecord>, ProbeMapError> {
        self.check_available()?;
        self.transcript_queries.fetch_add(1, Ordering::Relaxed);

        let mut records: Vec<PslRecord> = self
            .transcript_alignments
            .iter()
            .filter(|r| same_chromosome(&r.t_name, &region.chromosome))
            .filter(|r| region.overlaps(r.t_start, r.t_end))
            .cloned()
            .collect();
        records.sort_by_key(|r| r.t_start);
        Ok(records)
    }

    fn find_sequence_locations(&self, accession: &str) -> Result<Vec<PslRecord>, ProbeMapError> {
        self.check_available()?;
        Ok(self
            .sequence_locations
            .get(accession)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_orders_by_start() {
        let mut store = MockAnnotationStore::default();
        store.add_feature(FeatureTier::Curated, RawFeatureRow::new("b", "chr1", 500, 600, Some("+")));
        store.add_feature(FeatureTier::Curated, RawFeatureRow::new("a", "chr1", 100, 900, Some("+")));
        let rows = store
            .query_features(FeatureTier::Curated, &RegionQuery::new("1", 550, 560, None))
            .unwrap();
        let names: Vec<_> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_query_respects_strand_and_chromosome() {
        let store = MockAnnotationStore::with_test_data();
        let plus = RegionQuery::new("chr1", 1000, 1100, Some(Strand::Plus));
        let minus = RegionQuery::new("chr1", 1000, 1100, Some(Strand::Minus));
        let other = RegionQuery::new("chr2", 1000, 1100, None);
        assert_eq!(store.query_features(FeatureTier::Curated, &plus).unwrap().len(), 1);
        assert!(store.query_features(FeatureTier::Curated, &minus).unwrap().is_empty());
        assert!(store.query_features(FeatureTier::Curated, &other).unwrap().is_empty());
        assert_eq!(store.feature_query_count(), 3);
    }

    #[test]
    fn test_failure_is_lookup_error() {
        let mut store = MockAnnotationStore::with_test_data();
        store.fail_with("connection refused");
        let err = store
            .query_features(FeatureTier::Curated, &RegionQuery::new("1", 0, 10, None))
            .unwrap_err();
        assert!(matches!(err, ProbeMapError::Lookup { .. }));
    }

    #[test]
    fn test_from_json_str() {
        let json = r#"{
            "taxon": "mouse",
            "features": {
                "curated": [
                    {"name": "NM_1", "chromosome": "chr3", "tx_start": 10, "tx_end": 90, "strand": "+"}
                ]
            }
        }"#;
        let store = MockAnnotationStore::from_json_str(json).unwrap();
        assert!(store.taxon().is("mouse"));
        let rows = store
            .query_features(FeatureTier::Curated, &RegionQuery::new("3", 50, 60, None))
            .unwrap();
        assert_eq!(rows.len(), 1);
    }
}
