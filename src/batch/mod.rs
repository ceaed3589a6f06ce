//! Batch mapping of many sequences.
//!
//! This module provides high-level APIs for mapping precomputed hits,
//! GenBank accessions, or raw sequences in bulk, with progress tracking,
//! error aggregation, and statistics.
//!
//! # Examples
//!
//! ## Basic Usage
//!
//! ```
//! use ferro_probemap::annotation::MockAnnotationStore;
//! use ferro_probemap::batch::BatchProcessor;
//! use ferro_probemap::{ProbeMapper, ProbeMapperConfig};
//!
//! let store = MockAnnotationStore::with_test_data();
//! let mapper = ProbeMapper::new(store, ProbeMapperConfig::default()).unwrap();
//! let processor = BatchProcessor::new(mapper);
//!
//! let result = processor.map_accessions(&["BC000001", "AK000000"]);
//! println!(
//!     "Mapped {}/{} accessions ({} failed)",
//!     result.mapped_count(),
//!     result.total(),
//!     result.error_count()
//! );
//! ```
//!
//! ## With Progress Callback
//!
//! ```
//! use ferro_probemap::annotation::MockAnnotationStore;
//! use ferro_probemap::batch::BatchProcessor;
//! use ferro_probemap::{ProbeMapper, ProbeMapperConfig};
//!
//! let store = MockAnnotationStore::with_test_data();
//! let processor = BatchProcessor::new(ProbeMapper::new(store, ProbeMapperConfig::default()).unwrap());
//!
//! let result = processor.map_accessions_with_progress(&["BC000001"], |progress| {
//!     println!("Progress: {:.1}%", progress.percent());
//! });
//! ```

mod processor;

pub use processor::{
    into_association_map, BatchConfig, BatchProcessor, BatchProgress, BatchResult, ItemResult,
    SequenceMapping,
};
