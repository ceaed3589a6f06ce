use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

use super::interval::{Exon, GenomicInterval, Strand};
use super::sequence::Taxon;

/// Kind of molecule a gene product represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneProductType {
    Mrna,
    NonCodingRna,
    PredictedRna,
}

impl fmt::Display for GeneProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneProductType::Mrna => write!(f, "mRNA"),
            GeneProductType::NonCodingRna => write!(f, "ncRNA"),
            GeneProductType::PredictedRna => write!(f, "predicted RNA"),
        }
    }
}

/// How a gene came to be known.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GeneKind {
    /// Imported from an annotation track
    Known,
    /// Gene prediction, with the predicting method (e.g. "Acembly")
    Predicted { method: String },
    /// Placeholder synthesized from an unannotated alignment
    Provisional,
}

/// Gene-level summary carried by each gene product.
///
/// The location is coarse: chromosome and strand only. Nucleotide spans
/// are meaningful at the gene product level.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GeneInfo {
    pub symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taxon: Option<Taxon>,
    pub chromosome: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strand: Option<Strand>,
    pub kind: GeneKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A transcript-level feature: accession, type, exons and overall span.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GeneProduct {
    pub name: String,
    pub product_type: GeneProductType,
    pub gene: GeneInfo,
    #[serde(default)]
    pub exons: Vec<Exon>,
    pub location: GenomicInterval,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl GeneProduct {
    /// Exons used for overlap computation.
    ///
    /// Products without exon structure (e.g. microRNAs) count as a single
    /// exon covering their own span.
    pub fn effective_exons(&self) -> Cow<'_, [Exon]> {
        if self.exons.is_empty() {
            Cow::Owned(vec![self.location.clone()])
        } else {
            Cow::Borrowed(&self.exons)
        }
    }

    pub fn strand(&self) -> Option<Strand> {
        self.location.strand
    }

    pub fn is_provisional(&self) -> bool {
        self.gene.kind == GeneKind::Provisional
    }
}

/// A gene and its products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gene {
    pub info: GeneInfo,
    pub products: Vec<GeneProduct>,
}

impl Gene {
    pub fn new(info: GeneInfo, products: Vec<GeneProduct>) -> Self {
        Self { info, products }
    }

    pub fn symbol(&self) -> &str {
        &self.info.symbol
    }

    pub fn chromosome(&self) -> &str {
        &self.info.chromosome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(exons: Vec<Exon>) -> GeneProduct {
        GeneProduct {
            name: "NR_029610".to_string(),
            product_type: GeneProductType::NonCodingRna,
            gene: GeneInfo {
                symbol: "MIR21".to_string(),
                taxon: Some(Taxon::human()),
                chromosome: "17".to_string(),
                strand: Some(Strand::Plus),
                kind: GeneKind::Known,
                description: None,
            },
            exons,
            location: GenomicInterval::span("17", 1000, 1072, Some(Strand::Plus)).unwrap(),
            description: None,
        }
    }

    #[test]
    fn test_effective_exons_synthesized() {
        let p = product(Vec::new());
        let exons = p.effective_exons();
        assert_eq!(exons.len(), 1);
        assert_eq!(exons[0].start, 1000);
        assert_eq!(exons[0].end(), 1072);
    }

    #[test]
    fn test_effective_exons_borrowed() {
        let exon = GenomicInterval::span("17", 1000, 1010, None).unwrap();
        let p = product(vec![exon.clone()]);
        assert_eq!(p.effective_exons().as_ref(), &[exon]);
        assert!(!p.is_provisional());
        assert_eq!(p.strand(), Some(Strand::Plus));
    }

    #[test]
    fn test_gene_kind_serde() {
        let kind = GeneKind::Predicted {
            method: "NScan".to_string(),
        };
        let json = serde_json::to_string(&kind).unwrap();
        assert_eq!(json, r#"{"kind":"predicted","method":"NScan"}"#);
    }
}
