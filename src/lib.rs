// Copyright (c) 2024-2025 Fulcrum Genomics LLC
// SPDX-License-Identifier: MIT

//! ferro-probemap: resolve genome alignments to gene associations
//!
//! Part of the ferro bioinformatics toolkit.
//!
//! Given genome alignment hits of probe, EST or mRNA sequences, the mapper
//! finds the annotated gene products each hit overlaps, measures the exon
//! overlap and distance to the 3' end, falls back to provisional regions
//! for unannotated loci, and keeps the best-scoring association per gene
//! product.
//!
//! # Example
//!
//! ```
//! use ferro_probemap::annotation::MockAnnotationStore;
//! use ferro_probemap::psl::PslRecord;
//! use ferro_probemap::{ProbeMapper, ProbeMapperConfig};
//! use std::sync::Arc;
//!
//! // One BLAT alignment of a 100 bp probe into the first exon of GENE1
//! let line = "100\t0\t0\t0\t0\t0\t0\t0\t+\tprobe1\t100\t0\t100\tchr1\t248956422\t1000\t1100\t1\t100,\t0,\t1000,";
//! let record = PslRecord::parse_line(line).unwrap();
//! let hit = record.to_hit(Arc::new(record.query_sequence())).unwrap();
//!
//! let store = MockAnnotationStore::with_test_data();
//! let mapper = ProbeMapper::new(store, ProbeMapperConfig::default()).unwrap();
//!
//! let results = mapper.process_hits(vec![hit]).unwrap();
//! let association = &results["probe1"][0];
//! assert_eq!(association.gene_product.gene.symbol, "GENE1");
//! println!("probe1 -> {} (score {:?})", association.gene_product.name, association.score);
//! ```

pub mod aligner;
pub mod annotation;
pub mod batch;
pub mod cache;
pub mod cli;
pub mod config;
pub mod coords;
pub mod error;
pub mod mapper;
pub mod model;
pub mod overlap;
#[cfg(feature = "parallel")]
pub mod parallel;
pub mod provisional;
pub mod psl;
pub mod scoring;
pub mod sequence;
pub mod three_prime;

// Re-export commonly used types
pub use aligner::{Aligner, PrecomputedAligner};
pub use annotation::{AnnotationStore, GenomicFeatureLookup, MockAnnotationStore};
pub use config::ProbeMapperConfig;
pub use error::{ErrorCode, ProbeMapError};
pub use mapper::{MappingOutcome, ProbeMapper, StrandPolicy};
pub use model::{AlignmentHit, Association, Gene, GeneProduct, GenomicInterval, QuerySequence, Strand};
pub use provisional::{InMemoryProvisionalRegions, ProvisionalRegionStore};
pub use psl::{PslReader, PslRecord};
pub use scoring::AssociationScorer;
pub use three_prime::ThreePrimeMethod;

/// Result type alias for ferro-probemap operations
pub type Result<T> = std::result::Result<T, ProbeMapError>;
