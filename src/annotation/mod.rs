//! Genome annotation lookup
//!
//! Features overlapping an alignment are fetched from an
//! [`AnnotationStore`] tier by tier, following a [`TierPolicy`]:
//!
//! 1. curated transcripts, known genes and small RNAs are always queried
//!    and their results unioned;
//! 2. gene predictions are consulted only while nothing has been found,
//!    first a species-restricted source, then a broader one.
//!
//! # Example
//!
//! ```
//! use ferro_probemap::annotation::{GenomicFeatureLookup, MockAnnotationStore};
//!
//! let lookup = GenomicFeatureLookup::new(MockAnnotationStore::with_test_data());
//! let features = lookup.find_features("chr1", 1050, 1250, None).unwrap();
//! assert_eq!(features.map(|f| f.len()), Some(1));
//!
//! // Nothing annotated here
//! assert!(lookup.find_features("chr1", 100_000, 100_100, None).unwrap().is_none());
//! ```

mod lookup;
mod mock;
mod rows;
mod store;
mod tier;

pub use lookup::{GenomicFeatureLookup, RECHECK_OVERLAP_THRESHOLD};
pub use mock::{MockAnnotationData, MockAnnotationStore};
pub use rows::{transcript_alignment_gene, FeatureKind, RawFeatureRow, RowMapper};
pub use store::{AnnotationStore, RegionQuery};
pub use tier::{FeatureTier, TierMode, TierPolicy, TierRule};
