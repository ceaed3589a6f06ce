use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::alignment::AlignmentHit;
use super::gene::GeneProduct;
use crate::three_prime::ThreePrimeMethod;

/// Links one alignment hit of a query sequence to one gene product.
///
/// `score` and `specificity` are filled in by the scorer; everything else
/// is set when the association is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Association {
    pub hit: Arc<AlignmentHit>,
    pub gene_product: GeneProduct,
    /// Bases of the alignment that fall within the product's exons
    pub overlap: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub three_prime_distance: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub three_prime_method: Option<ThreePrimeMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specificity: Option<f64>,
}

impl Association {
    pub fn new(hit: Arc<AlignmentHit>, gene_product: GeneProduct, overlap: u64) -> Self {
        Self {
            hit,
            gene_product,
            overlap,
            three_prime_distance: None,
            three_prime_method: None,
            score: None,
            specificity: None,
        }
    }

    pub fn with_three_prime(mut self, distance: u64, method: ThreePrimeMethod) -> Self {
        self.three_prime_distance = Some(distance);
        self.three_prime_method = Some(method);
        self
    }

    pub fn query_name(&self) -> &str {
        self.hit.query_name()
    }

    pub fn gene_product_name(&self) -> &str {
        &self.gene_product.name
    }
}
