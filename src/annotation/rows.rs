//! Decoding store rows into gene products.
//!
//! Every tier returns the same row shape (name, symbol, span, strand, exon
//! lists, description). One [`RowMapper`], parameterized by
//! [`FeatureKind`], turns those rows into typed records.

use serde::{Deserialize, Serialize};

use crate::coords::{parse_block_list, strip_prefix};
use crate::error::{ErrorCode, ProbeMapError};
use crate::model::{
    Exon, Gene, GeneInfo, GeneKind, GeneProduct, GeneProductType, GenomicInterval, Strand, Taxon,
};
use crate::psl::PslRecord;

const PREDICTED_GENE_DESCRIPTION: &str = "Predicted gene imported from annotation track";

/// A raw feature row, as returned by a region query.
///
/// Exon columns hold comma-delimited coordinates (UCSC genePred style:
/// starts and exclusive ends).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFeatureRow {
    pub name: String,
    #[serde(default)]
    pub symbol: Option<String>,
    pub chromosome: String,
    pub tx_start: u64,
    pub tx_end: u64,
    #[serde(default)]
    pub strand: Option<String>,
    #[serde(default)]
    pub exon_starts: Option<String>,
    #[serde(default)]
    pub exon_ends: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl RawFeatureRow {
    pub fn new(name: &str, chromosome: &str, tx_start: u64, tx_end: u64, strand: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            symbol: None,
            chromosome: chromosome.to_string(),
            tx_start,
            tx_end,
            strand: strand.map(str::to_string),
            exon_starts: None,
            exon_ends: None,
            description: None,
        }
    }

    pub fn with_symbol(mut self, symbol: &str) -> Self {
        self.symbol = Some(symbol.to_string());
        self
    }

    pub fn with_exons(mut self, starts: &str, ends: &str) -> Self {
        self.exon_starts = Some(starts.to_string());
        self.exon_ends = Some(ends.to_string());
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

/// What kind of record a row decodes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureKind {
    /// Annotated gene with the given product type
    Annotated(GeneProductType),
    /// Predicted gene from the named method
    Predicted { method: String },
}

fn row_error(msg: impl Into<String>) -> ProbeMapError {
    ProbeMapError::parse_with_code(0, msg, ErrorCode::InvalidAnnotationRow)
}

/// Decodes feature rows of one kind for one taxon.
#[derive(Debug, Clone)]
pub struct RowMapper {
    kind: FeatureKind,
    taxon: Taxon,
}

impl RowMapper {
    pub fn new(kind: FeatureKind, taxon: Taxon) -> Self {
        Self { kind, taxon }
    }

    /// Decode one row.
    ///
    /// Missing chromosome, bad strand or reversed coordinates are invalid
    /// arguments; malformed exon lists are parse errors. A row without exon
    /// lists yields a product with no exons, which overlap code treats as
    /// a single exon over the whole span.
    pub fn map_row(&self, row: &RawFeatureRow) -> Result<GeneProduct, ProbeMapError> {
        if row.chromosome.trim().is_empty() {
            return Err(ProbeMapError::invalid_argument(format!(
                "feature {} has no chromosome",
                row.name
            )));
        }
        let chromosome = strip_prefix(row.chromosome.trim());

        let strand = match row.strand.as_deref() {
            Some(s) => Strand::parse_optional(s).map_err(|_| {
                ProbeMapError::invalid_argument(format!("feature {} has strand '{}'", row.name, s))
            })?,
            None => None,
        };

        let location = GenomicInterval::span(chromosome, row.tx_start, row.tx_end, strand)
            .map_err(|e| ProbeMapError::invalid_argument(format!("feature {}: {}", row.name, e)))?;

        let exons = self.map_exons(row, chromosome, strand)?;

        let (product_type, kind, gene_description) = match &self.kind {
            FeatureKind::Annotated(product_type) => (*product_type, GeneKind::Known, None),
            FeatureKind::Predicted { method } => (
                GeneProductType::PredictedRna,
                GeneKind::Predicted {
                    method: method.clone(),
                },
                Some(PREDICTED_GENE_DESCRIPTION.to_string()),
            ),
        };

        let symbol = row
            .symbol
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(&row.name)
            .to_string();

        Ok(GeneProduct {
            name: row.name.clone(),
            product_type,
            gene: GeneInfo {
                symbol,
                taxon: Some(self.taxon.clone()),
                chromosome: chromosome.to_string(),
                strand,
                kind,
                description: gene_description,
            },
            exons,
            location,
            description: row.description.clone(),
        })
    }

    fn map_exons(
        &self,
        row: &RawFeatureRow,
        chromosome: &str,
        strand: Option<Strand>,
    ) -> Result<Vec<Exon>, ProbeMapError> {
        let (starts, ends) = match (row.exon_starts.as_deref(), row.exon_ends.as_deref()) {
            (Some(s), Some(e)) => (parse_block_list(s)?, parse_block_list(e)?),
            (None, None) => return Ok(Vec::new()),
            _ => {
                return Err(row_error(format!(
                    "feature {} has exon starts or ends but not both",
                    row.name
                )))
            }
        };

        if starts.len() != ends.len() {
            return Err(row_error(format!(
                "feature {} has {} exon starts but {} exon ends",
                row.name,
                starts.len(),
                ends.len()
            )));
        }

        starts
            .iter()
            .zip(&ends)
            .map(|(s, e)| GenomicInterval::span(chromosome, *s, *e, strand))
            .collect()
    }

    /// Decode every row.
    pub fn map_rows(&self, rows: &[RawFeatureRow]) -> Result<Vec<GeneProduct>, ProbeMapError> {
        rows.iter().map(|row| self.map_row(row)).collect()
    }
}

/// Decode a spliced mRNA alignment as a single-product gene.
///
/// The product's exons are the alignment blocks.
pub fn transcript_alignment_gene(record: &PslRecord, taxon: &Taxon) -> Result<Gene, ProbeMapError> {
    let sizes = parse_block_list(&record.block_sizes)?;
    let starts = parse_block_list(&record.t_starts)?;
    if sizes.len() != starts.len() {
        return Err(row_error(format!(
            "alignment of {} has {} block starts but {} block sizes",
            record.q_name,
            starts.len(),
            sizes.len()
        )));
    }

    let strand = record
        .strand
        .chars()
        .next()
        .map(|c| Strand::parse_optional(&c.to_string()))
        .transpose()
        .map_err(|e| ProbeMapError::invalid_argument(e.to_string()))?
        .flatten();

    let chromosome = strip_prefix(&record.t_name);
    let exons = starts
        .iter()
        .zip(&sizes)
        .map(|(s, size)| GenomicInterval::new(chromosome, *s, Some(*size), strand))
        .collect();

    let info = GeneInfo {
        symbol: record.q_name.clone(),
        taxon: Some(taxon.clone()),
        chromosome: chromosome.to_string(),
        strand,
        kind: GeneKind::Known,
        description: None,
    };
    let product = GeneProduct {
        name: record.q_name.clone(),
        product_type: GeneProductType::Mrna,
        gene: info.clone(),
        exons,
        location: GenomicInterval::span(chromosome, record.t_start, record.t_end, strand)?,
        description: None,
    };
    Ok(Gene::new(info, vec![product]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper(kind: FeatureKind) -> RowMapper {
        RowMapper::new(kind, Taxon::human())
    }

    #[test]
    fn test_map_annotated_row() {
        let row = RawFeatureRow::new("NM_000546", "chr17", 7571719, 7590868, Some("-"))
            .with_symbol("TP53")
            .with_exons("7571719,7590694,", "7573008,7590868,")
            .with_description("tumor protein p53");
        let p = mapper(FeatureKind::Annotated(GeneProductType::Mrna)).map_row(&row).unwrap();

        assert_eq!(p.name, "NM_000546");
        assert_eq!(p.gene.symbol, "TP53");
        assert_eq!(p.gene.chromosome, "17");
        assert_eq!(p.gene.kind, GeneKind::Known);
        assert_eq!(p.exons.len(), 2);
        assert_eq!(p.exons[1].start, 7590694);
        assert_eq!(p.exons[1].end(), 7590868);
        assert_eq!(p.location.strand, Some(Strand::Minus));
        assert_eq!(p.description.as_deref(), Some("tumor protein p53"));
    }

    #[test]
    fn test_map_row_without_exons() {
        let row = RawFeatureRow::new("hsa-mir-21", "chr17", 1000, 1072, Some("+"));
        let p = mapper(FeatureKind::Annotated(GeneProductType::NonCodingRna))
            .map_row(&row)
            .unwrap();
        assert!(p.exons.is_empty());
        assert_eq!(p.effective_exons().len(), 1);
        assert_eq!(p.gene.symbol, "hsa-mir-21");
        assert_eq!(p.product_type, GeneProductType::NonCodingRna);
    }

    #[test]
    fn test_map_predicted_row() {
        let row = RawFeatureRow::new("chr1.g12", "chr1", 100, 200, Some("+"));
        let p = mapper(FeatureKind::Predicted { method: "NScan".to_string() })
            .map_row(&row)
            .unwrap();
        assert_eq!(p.product_type, GeneProductType::PredictedRna);
        assert_eq!(
            p.gene.kind,
            GeneKind::Predicted { method: "NScan".to_string() }
        );
        assert!(p.gene.description.is_some());
    }

    #[test]
    fn test_invalid_rows() {
        let m = mapper(FeatureKind::Annotated(GeneProductType::Mrna));

        let no_chrom = RawFeatureRow::new("x", "", 0, 10, Some("+"));
        assert!(matches!(m.map_row(&no_chrom), Err(ProbeMapError::InvalidArgument { .. })));

        let bad_strand = RawFeatureRow::new("x", "chr1", 0, 10, Some("*"));
        assert!(matches!(m.map_row(&bad_strand), Err(ProbeMapError::InvalidArgument { .. })));

        let reversed = RawFeatureRow::new("x", "chr1", 10, 0, Some("+"));
        assert!(matches!(m.map_row(&reversed), Err(ProbeMapError::InvalidArgument { .. })));

        let uneven = RawFeatureRow::new("x", "chr1", 0, 10, Some("+")).with_exons("0,5,", "4,");
        let err = m.map_row(&uneven).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidAnnotationRow);
    }

    #[test]
    fn test_transcript_alignment_gene() {
        let record = PslRecord::parse_line(
            "100\t0\t0\t0\t0\t0\t1\t100\t+\tBC012345\t100\t0\t100\tchr2\t1000000\t500\t700\t2\t50,50,\t0,50,\t500,650,",
        )
        .unwrap();
        let gene = transcript_alignment_gene(&record, &Taxon::human()).unwrap();
        assert_eq!(gene.chromosome(), "2");
        assert_eq!(gene.products.len(), 1);
        let exons = &gene.products[0].exons;
        assert_eq!(exons.len(), 2);
        assert_eq!((exons[1].start, exons[1].end()), (650, 700));
    }
}
