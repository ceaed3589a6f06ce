//! Provisional regions for unannotated alignments.
//!
//! When nothing annotated overlaps an alignment, the mapper credits the
//! alignment to a placeholder gene named after the query and its genomic
//! span. Names are deterministic, so repeated runs over the same
//! alignment refer to the same placeholder.

use std::sync::{Arc, RwLock};

use crate::error::ProbeMapError;
use crate::model::{
    AlignmentHit, Association, Gene, GeneInfo, GeneKind, GeneProduct, GeneProductType,
    GenomicInterval,
};
use crate::overlap::location_overlap;

const PROVISIONAL_GENE_DESCRIPTION: &str =
    "Based only on alignment to the genome; symbol assigned automatically";
const PROVISIONAL_PRODUCT_DESCRIPTION: &str =
    "Hypothetical RNA product based on alignment of the sequence to the genome";

/// A synthetic gene and its single product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionalRegion {
    pub gene: GeneInfo,
    pub product: GeneProduct,
}

impl ProvisionalRegion {
    /// The region as a gene with its single product.
    pub fn to_gene(&self) -> Gene {
        Gene::new(self.gene.clone(), vec![self.product.clone()])
    }

    pub fn into_product(self) -> GeneProduct {
        self.product
    }
}

/// Deterministic name for the provisional region of a hit.
pub fn provisional_name(hit: &AlignmentHit) -> String {
    format!(
        "{}.par.{}.{}.{}",
        hit.query_name(),
        hit.target_chromosome,
        hit.target_start,
        hit.target_end
    )
}

/// Build the provisional region covering a hit's full target span.
pub fn create_provisional(hit: &AlignmentHit) -> ProvisionalRegion {
    let name = provisional_name(hit);
    let span = hit.target_interval();

    let info = GeneInfo {
        symbol: name.clone(),
        taxon: hit.query.taxon.clone(),
        chromosome: span.chromosome.clone(),
        strand: span.strand,
        kind: GeneKind::Provisional,
        description: Some(PROVISIONAL_GENE_DESCRIPTION.to_string()),
    };
    let product = GeneProduct {
        name,
        product_type: GeneProductType::PredictedRna,
        gene: info.clone(),
        exons: vec![span.clone()],
        location: span,
        description: Some(PROVISIONAL_PRODUCT_DESCRIPTION.to_string()),
    };

    ProvisionalRegion {
        gene: info,
        product,
    }
}

/// Association crediting the whole query to a provisional product.
pub fn provisional_association(hit: &Arc<AlignmentHit>, product: GeneProduct) -> Association {
    let overlap = hit.query.length;
    Association::new(Arc::clone(hit), product, overlap)
}

/// Source of provisional regions created in earlier runs.
pub trait ProvisionalRegionStore {
    /// Provisional gene products whose span overlaps `interval`.
    ///
    /// When `interval` has a strand, products known to be on the other
    /// strand are left out.
    fn find_overlapping(&self, interval: &GenomicInterval) -> Result<Vec<GeneProduct>, ProbeMapError>;
}

/// Blanket implementation for boxed trait objects
impl ProvisionalRegionStore for Box<dyn ProvisionalRegionStore + Send + Sync> {
    fn find_overlapping(&self, interval: &GenomicInterval) -> Result<Vec<GeneProduct>, ProbeMapError> {
        (**self).find_overlapping(interval)
    }
}

/// Thread-safe in-memory provisional region store.
#[derive(Debug, Default)]
pub struct InMemoryProvisionalRegions {
    products: RwLock<Vec<GeneProduct>>,
}

impl InMemoryProvisionalRegions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember a region; a region with the same name replaces the old one.
    pub fn register(&self, region: ProvisionalRegion) {
        let product = region.into_product();
        let mut products = self.products.write().unwrap_or_else(|e| e.into_inner());
        products.retain(|p| p.name != product.name);
        products.push(product);
    }

    pub fn len(&self) -> usize {
        self.products.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ProvisionalRegionStore for InMemoryProvisionalRegions {
    fn find_overlapping(&self, interval: &GenomicInterval) -> Result<Vec<GeneProduct>, ProbeMapError> {
        let products = self.products.read().unwrap_or_else(|e| e.into_inner());
        let mut found = Vec::new();
        for product in products.iter() {
            if let (Some(wanted), Some(actual)) = (interval.strand, product.strand()) {
                if wanted != actual {
                    continue;
                }
            }
            if location_overlap(&product.location, interval)? > 0 {
                found.push(product.clone());
            }
        }
        found.sort_by_key(|p| p.location.start);
        Ok(found)
    }
}

/// A store with no provisional regions.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProvisionalRegions;

impl ProvisionalRegionStore for NoProvisionalRegions {
    fn find_overlapping(&self, _interval: &GenomicInterval) -> Result<Vec<GeneProduct>, ProbeMapError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{QuerySequence, Strand, Taxon};

    fn hit(name: &str, start: u64, end: u64) -> Arc<AlignmentHit> {
        let query = Arc::new(QuerySequence::new(name, 60).with_taxon(Taxon::new("rat")));
        Arc::new(AlignmentHit::new(
            query,
            "chr4",
            start,
            end,
            Some(Strand::Plus),
            vec![start],
            vec![end - start],
        ))
    }

    #[test]
    fn test_deterministic_name() {
        let a = hit("probe_1", 1000, 1060);
        let b = hit("probe_1", 1000, 1060);
        assert_eq!(provisional_name(&a), "probe_1.par.4.1000.1060");
        assert_eq!(provisional_name(&a), provisional_name(&b));
        assert_ne!(provisional_name(&a), provisional_name(&hit("probe_1", 1001, 1060)));
    }

    #[test]
    fn test_create_provisional() {
        let h = hit("probe_1", 1000, 1060);
        let region = create_provisional(&h);
        let product = &region.product;
        assert_eq!(product.product_type, GeneProductType::PredictedRna);
        assert_eq!(product.exons.len(), 1);
        assert_eq!(product.exons[0].start, 1000);
        assert_eq!(product.exons[0].end(), 1060);
        assert!(product.is_provisional());
        assert_eq!(region.gene.taxon, Some(Taxon::new("rat")));
        assert_eq!(region.to_gene().products.len(), 1);
    }

    #[test]
    fn test_association_credits_query_length() {
        let h = hit("probe_1", 1000, 1060);
        let product = create_provisional(&h).into_product();
        let assoc = provisional_association(&h, product);
        assert_eq!(assoc.overlap, 60);
        assert!(assoc.three_prime_distance.is_none());
    }

    #[test]
    fn test_in_memory_store() {
        let store = InMemoryProvisionalRegions::new();
        store.register(create_provisional(&hit("p", 1000, 1060)));
        store.register(create_provisional(&hit("p", 1000, 1060)));
        store.register(create_provisional(&hit("q", 5000, 5060)));
        assert_eq!(store.len(), 2);

        let query = GenomicInterval::span("chr4", 1050, 1100, None).unwrap();
        let found = store.find_overlapping(&query).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "p.par.4.1000.1060");

        let elsewhere = GenomicInterval::span("chr5", 1050, 1100, None).unwrap();
        assert!(store.find_overlapping(&elsewhere).unwrap().is_empty());
    }

    #[test]
    fn test_in_memory_store_respects_strand() {
        let store = InMemoryProvisionalRegions::new();
        store.register(create_provisional(&hit("p", 1000, 1060)));

        let plus = GenomicInterval::span("4", 1010, 1050, Some(Strand::Plus)).unwrap();
        let minus = GenomicInterval::span("4", 1010, 1050, Some(Strand::Minus)).unwrap();
        assert_eq!(store.find_overlapping(&plus).unwrap().len(), 1);
        assert!(store.find_overlapping(&minus).unwrap().is_empty());
    }
}
