//! Scoring and collapsing the associations of one query sequence.
//!
//! A sequence with several alignment hits can reach the same gene product
//! more than once, and can reach several products through one hit. The
//! scorer gives each association a score, measures how specific the
//! sequence is to each locus, and keeps one association per gene product.
//!
//! - **score**: `hit.score * overlap_fraction`
//! - **specificity**: the association's score divided by the sum, over
//!   the sequence's distinct hits, of the best score reached at each hit.
//!   A sequence that lands at a single locus has specificity 1.
//! - **collapse**: per gene product, keep the association with the highest
//!   overlap, then highest score, then smallest 3' distance, then lowest
//!   target coordinate.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::error::ProbeMapError;
use crate::model::Association;

/// Fraction of the hit's aligned bases covered by the association, in `[0, 1]`.
///
/// Provisional associations credit the full query length, which can
/// exceed the aligned length; the fraction is capped at 1.
pub fn compute_overlap_fraction(association: &Association) -> f64 {
    let aligned = association.hit.total_aligned_length();
    if aligned == 0 {
        return 0.0;
    }
    (association.overlap as f64 / aligned as f64).clamp(0.0, 1.0)
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct HitKey {
    chromosome: String,
    target_start: u64,
    target_end: u64,
    query_start: u64,
    query_end: u64,
}

impl HitKey {
    fn of(association: &Association) -> Self {
        let hit = &association.hit;
        Self {
            chromosome: hit.target_chromosome.clone(),
            target_start: hit.target_start,
            target_end: hit.target_end,
            query_start: hit.query_start,
            query_end: hit.query_end,
        }
    }
}

/// Order in which competing associations to one product are preferred.
fn preference(a: &Association, b: &Association) -> Ordering {
    b.overlap
        .cmp(&a.overlap)
        .then_with(|| {
            b.score
                .unwrap_or(0.0)
                .partial_cmp(&a.score.unwrap_or(0.0))
                .unwrap_or(Ordering::Equal)
        })
        .then_with(|| match (a.three_prime_distance, b.three_prime_distance) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.hit.target_chromosome.cmp(&b.hit.target_chromosome))
        .then_with(|| a.hit.target_start.cmp(&b.hit.target_start))
}

/// Scores and collapses associations for one query sequence.
#[derive(Debug, Clone, Default)]
pub struct AssociationScorer {
    minimum_overlap_fraction: f64,
}

impl AssociationScorer {
    pub fn new(minimum_overlap_fraction: f64) -> Self {
        Self {
            minimum_overlap_fraction,
        }
    }

    /// Assign score and specificity, then keep one association per product.
    ///
    /// Output follows the order in which products first appear in the input.
    pub fn score_results(
        &self,
        associations: Vec<Association>,
    ) -> Result<Vec<Association>, ProbeMapError> {
        let mut scored = Vec::with_capacity(associations.len());
        for mut association in associations {
            check_overlap(&association)?;
            let score = association.hit.score * compute_overlap_fraction(&association);
            association.score = Some(score);
            scored.push(association);
        }

        let mut best_per_hit: HashMap<HitKey, f64> = HashMap::new();
        for association in &scored {
            let score = association.score.unwrap_or(0.0);
            best_per_hit
                .entry(HitKey::of(association))
                .and_modify(|best| *best = best.max(score))
                .or_insert(score);
        }
        let total: f64 = best_per_hit.values().sum();
        let loci = best_per_hit.len().max(1) as f64;

        for association in &mut scored {
            let specificity = if total > 0.0 {
                association.score.unwrap_or(0.0) / total
            } else {
                1.0 / loci
            };
            association.specificity = Some(specificity);
        }

        let mut order: Vec<String> = Vec::new();
        let mut best: HashMap<String, Association> = HashMap::new();
        for association in scored {
            let name = association.gene_product.name.clone();
            match best.get(&name) {
                None => {
                    order.push(name.clone());
                    best.insert(name, association);
                }
                Some(current) => {
                    if preference(&association, current) == Ordering::Less {
                        best.insert(name, association);
                    }
                }
            }
        }

        Ok(order
            .into_iter()
            .filter_map(|name| best.remove(&name))
            .collect())
    }

    /// Drop associations covering less than the minimum fraction of their hit.
    ///
    /// A minimum of exactly 0 keeps everything.
    pub fn filter_on_overlap(&self, associations: Vec<Association>) -> Vec<Association> {
        filter_on_overlap(associations, self.minimum_overlap_fraction)
    }
}

/// Drop associations whose overlap fraction is below `minimum`.
///
/// A minimum of exactly 0 keeps everything.
pub fn filter_on_overlap(associations: Vec<Association>, minimum: f64) -> Vec<Association> {
    if minimum == 0.0 {
        return associations;
    }
    associations
        .into_iter()
        .filter(|a| {
            let keep = compute_overlap_fraction(a) >= minimum;
            if !keep {
                log::debug!(
                    "Dropping {} -> {}: overlap fraction {:.3} below {}",
                    a.query_name(),
                    a.gene_product_name(),
                    compute_overlap_fraction(a),
                    minimum
                );
            }
            keep
        })
        .collect()
}

// Annotated overlaps are clamped to the aligned length upstream; a larger
// value here means a computation went wrong.
fn check_overlap(association: &Association) -> Result<(), ProbeMapError> {
    if association.gene_product.is_provisional() {
        return Ok(());
    }
    let aligned = association.hit.total_aligned_length();
    if association.overlap > aligned {
        return Err(ProbeMapError::Invariant {
            msg: format!(
                "overlap {} of {} with {} exceeds aligned length {}",
                association.overlap,
                association.query_name(),
                association.gene_product_name(),
                aligned
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        AlignmentHit, GeneInfo, GeneKind, GeneProduct, GeneProductType, GenomicInterval,
        QuerySequence, Strand,
    };
    use crate::provisional::{create_provisional, provisional_association};
    use std::sync::Arc;

    fn hit(start: u64, size: u64, score: f64) -> Arc<AlignmentHit> {
        let query = Arc::new(QuerySequence::new("probe", size));
        Arc::new(
            AlignmentHit::new(query, "1", start, start + size, Some(Strand::Plus), vec![start], vec![size])
                .with_scores(score, 1.0),
        )
    }

    fn product(name: &str) -> GeneProduct {
        GeneProduct {
            name: name.to_string(),
            product_type: GeneProductType::Mrna,
            gene: GeneInfo {
                symbol: name.to_string(),
                taxon: None,
                chromosome: "1".to_string(),
                strand: Some(Strand::Plus),
                kind: GeneKind::Known,
                description: None,
            },
            exons: Vec::new(),
            location: GenomicInterval::span("1", 0, 100_000, Some(Strand::Plus)).unwrap(),
            description: None,
        }
    }

    #[test]
    fn test_overlap_fraction() {
        let h = hit(1000, 100, 1.0);
        assert_eq!(compute_overlap_fraction(&Association::new(h.clone(), product("A"), 50)), 0.5);
        assert_eq!(compute_overlap_fraction(&Association::new(h, product("A"), 0)), 0.0);
    }

    #[test]
    fn test_provisional_fraction_capped() {
        let query = Arc::new(QuerySequence::new("probe", 120));
        let h = Arc::new(AlignmentHit::new(query, "1", 0, 100, None, vec![0], vec![100]));
        let assoc = provisional_association(&h, create_provisional(&h).into_product());
        assert_eq!(compute_overlap_fraction(&assoc), 1.0);
    }

    #[test]
    fn test_collapse_keeps_highest_overlap() {
        let a = Association::new(hit(1000, 100, 0.9), product("NM_1"), 60);
        let b = Association::new(hit(5000, 100, 0.9), product("NM_1"), 90);
        let out = AssociationScorer::default().score_results(vec![a, b]).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].overlap, 90);
        assert_eq!(out[0].hit.target_start, 5000);
    }

    #[test]
    fn test_collapse_tie_breaks_on_three_prime_distance() {
        let h1 = hit(1000, 100, 0.9);
        let h2 = hit(2000, 100, 0.9);
        let far = Association::new(h1, product("NM_1"), 100)
            .with_three_prime(500, crate::three_prime::ThreePrimeMethod::Right);
        let near = Association::new(h2, product("NM_1"), 100)
            .with_three_prime(50, crate::three_prime::ThreePrimeMethod::Right);
        let out = AssociationScorer::default().score_results(vec![far, near]).unwrap();
        assert_eq!(out[0].three_prime_distance, Some(50));
    }

    #[test]
    fn test_specificity_single_locus() {
        let h = hit(1000, 100, 0.8);
        let a = Association::new(h.clone(), product("NM_1"), 100);
        let b = Association::new(h, product("NM_2"), 50);
        let out = AssociationScorer::default().score_results(vec![a, b]).unwrap();
        assert_eq!(out.len(), 2);
        assert!((out[0].specificity.unwrap() - 1.0).abs() < 1e-9);
        assert!((out[0].score.unwrap() - 0.8).abs() < 1e-9);
        assert!((out[1].specificity.unwrap() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_specificity_split_across_loci() {
        let a = Association::new(hit(1000, 100, 1.0), product("NM_1"), 100);
        let b = Association::new(hit(9000, 100, 1.0), product("NM_2"), 100);
        let out = AssociationScorer::default().score_results(vec![a, b]).unwrap();
        for assoc in &out {
            assert!((assoc.specificity.unwrap() - 0.5).abs() < 1e-9);
        }
    }

    #[test]
    fn test_overlap_beyond_alignment_is_invariant_error() {
        let a = Association::new(hit(1000, 100, 1.0), product("NM_1"), 150);
        assert!(matches!(
            AssociationScorer::default().score_results(vec![a]),
            Err(ProbeMapError::Invariant { .. })
        ));
    }

    #[test]
    fn test_filter_on_overlap() {
        let h = hit(1000, 100, 1.0);
        let keep = Association::new(h.clone(), product("NM_1"), 80);
        let drop = Association::new(h, product("NM_2"), 10);

        let out = filter_on_overlap(vec![keep.clone(), drop.clone()], 0.5);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].gene_product.name, "NM_1");

        // Zero minimum disables filtering, even for zero overlap
        let none = Association::new(hit(1000, 100, 1.0), product("NM_3"), 0);
        assert_eq!(filter_on_overlap(vec![keep, drop, none], 0.0).len(), 3);
    }
}
