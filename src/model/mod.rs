//! Domain types: intervals, genes, query sequences, alignment hits and
//! the associations that link them.

mod alignment;
mod association;
mod gene;
mod interval;
mod sequence;

pub use alignment::AlignmentHit;
pub use association::Association;
pub use gene::{Gene, GeneInfo, GeneKind, GeneProduct, GeneProductType};
pub use interval::{Exon, GenomicInterval, Strand};
pub use sequence::{QuerySequence, SequenceType, Taxon};
