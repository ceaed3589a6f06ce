//! Overlap between alignment blocks and annotated exons.

use crate::coords::{check_blocks, overlap, same_chromosome, total_size};
use crate::error::ProbeMapError;
use crate::model::{Gene, GeneProduct, GenomicInterval, Strand};

/// Overlap between two located intervals.
///
/// Intervals on different chromosomes never overlap. When neither interval
/// has a known length, a shared start position counts as one base.
pub fn location_overlap(a: &GenomicInterval, b: &GenomicInterval) -> Result<u64, ProbeMapError> {
    if !same_chromosome(&a.chromosome, &b.chromosome) {
        return Ok(0);
    }
    if a.length.is_none() && b.length.is_none() {
        return Ok(u64::from(a.start == b.start));
    }
    overlap(a.start, a.end(), b.start, b.end())
}

/// Bases of an alignment that fall within a gene product's exons.
///
/// When `strand` is given and the product's strand is known and different,
/// the overlap is 0. Overlapping exons of one transcript can count a base
/// twice; the total is clamped to the aligned length.
pub fn gene_product_exon_overlap(
    starts: &[u64],
    sizes: &[u64],
    strand: Option<Strand>,
    product: &GeneProduct,
) -> Result<u64, ProbeMapError> {
    check_blocks(starts, sizes)?;

    if let (Some(query), Some(feature)) = (strand, product.strand()) {
        if query != feature {
            return Ok(0);
        }
    }

    let exons = product.effective_exons();
    let mut total = 0u64;
    for (start, size) in starts.iter().zip(sizes) {
        for exon in exons.iter() {
            total += overlap(*start, start + size, exon.start, exon.end())?;
        }
    }

    let aligned = total_size(sizes);
    if total > aligned {
        log::warn!(
            "Exon overlap {} for {} exceeds aligned length {}; clamping",
            total,
            product.name,
            aligned
        );
        total = aligned;
    }
    Ok(total)
}

/// Best exon overlap over all products of a gene.
///
/// Returns 0 when the gene is on another chromosome.
pub fn gene_exon_overlap(
    chromosome: &str,
    starts: &[u64],
    sizes: &[u64],
    strand: Option<Strand>,
    gene: &Gene,
) -> Result<u64, ProbeMapError> {
    if !same_chromosome(chromosome, gene.chromosome()) {
        return Ok(0);
    }

    let mut best = 0;
    for product in &gene.products {
        best = best.max(gene_product_exon_overlap(starts, sizes, strand, product)?);
    }
    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GeneInfo, GeneKind, GeneProductType};

    fn product(name: &str, strand: Strand, exons: &[(u64, u64)]) -> GeneProduct {
        let exons: Vec<GenomicInterval> = exons
            .iter()
            .map(|(s, e)| GenomicInterval::span("1", *s, *e, Some(strand)).unwrap())
            .collect();
        let start = exons.iter().map(|e| e.start).min().unwrap_or(0);
        let end = exons.iter().map(|e| e.end()).max().unwrap_or(0);
        GeneProduct {
            name: name.to_string(),
            product_type: GeneProductType::Mrna,
            gene: GeneInfo {
                symbol: "GENE".to_string(),
                taxon: None,
                chromosome: "1".to_string(),
                strand: Some(strand),
                kind: GeneKind::Known,
                description: None,
            },
            exons,
            location: GenomicInterval::span("1", start, end, Some(strand)).unwrap(),
            description: None,
        }
    }

    #[test]
    fn test_location_overlap_point_match() {
        let a = GenomicInterval::new("1", 100, None, None);
        let b = GenomicInterval::new("chr1", 100, None, None);
        let c = GenomicInterval::new("1", 101, None, None);
        assert_eq!(location_overlap(&a, &b).unwrap(), 1);
        assert_eq!(location_overlap(&a, &c).unwrap(), 0);
    }

    #[test]
    fn test_location_overlap_standard() {
        let a = GenomicInterval::span("1", 100, 200, None).unwrap();
        let b = GenomicInterval::span("1", 150, 250, None).unwrap();
        let other = GenomicInterval::span("2", 150, 250, None).unwrap();
        assert_eq!(location_overlap(&a, &b).unwrap(), 50);
        assert_eq!(location_overlap(&a, &other).unwrap(), 0);
    }

    #[test]
    fn test_exon_overlap_sums_blocks() {
        let p = product("NM_1", Strand::Plus, &[(100, 200), (300, 400)]);
        let overlap = gene_product_exon_overlap(&[150, 300], &[50, 50], None, &p).unwrap();
        assert_eq!(overlap, 100);

        let partial = gene_product_exon_overlap(&[180, 390], &[40, 40], None, &p).unwrap();
        assert_eq!(partial, 30);
    }

    #[test]
    fn test_exon_overlap_strand_mismatch() {
        let p = product("NM_1", Strand::Plus, &[(100, 200)]);
        assert_eq!(
            gene_product_exon_overlap(&[100], &[50], Some(Strand::Minus), &p).unwrap(),
            0
        );
        assert_eq!(
            gene_product_exon_overlap(&[100], &[50], Some(Strand::Plus), &p).unwrap(),
            50
        );
    }

    #[test]
    fn test_exon_overlap_clamps_double_count() {
        // Two exons covering the same bases
        let p = product("NM_1", Strand::Plus, &[(100, 200), (100, 200)]);
        assert_eq!(gene_product_exon_overlap(&[100], &[100], None, &p).unwrap(), 100);
    }

    #[test]
    fn test_exon_overlap_mismatched_blocks() {
        let p = product("NM_1", Strand::Plus, &[(100, 200)]);
        assert!(matches!(
            gene_product_exon_overlap(&[100, 150], &[10], None, &p),
            Err(ProbeMapError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_gene_overlap_takes_maximum() {
        let short = product("NM_short", Strand::Plus, &[(100, 130)]);
        let long = product("NM_long", Strand::Plus, &[(100, 200)]);
        let gene = Gene::new(short.gene.clone(), vec![short, long]);

        assert_eq!(gene_exon_overlap("chr1", &[100], &[100], None, &gene).unwrap(), 100);
        assert_eq!(gene_exon_overlap("chr2", &[100], &[100], None, &gene).unwrap(), 0);
    }
}
