//! Output formatting utilities for CLI operations

use serde::Serialize;
use std::io::{self, Write};
use std::str::FromStr;

use crate::error::ProbeMapError;
use crate::model::Association;

/// Output format for CLI results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Tab-separated, one association per line (default)
    #[default]
    Tsv,
    /// JSON, one object per line
    Json,
}

impl FromStr for OutputFormat {
    type Err = std::convert::Infallible;

    /// Parse an output format from a string
    ///
    /// # Examples
    ///
    /// ```
    /// use ferro_probemap::cli::OutputFormat;
    /// use std::str::FromStr;
    ///
    /// assert!(matches!(OutputFormat::from_str("json").unwrap(), OutputFormat::Json));
    /// assert!(matches!(OutputFormat::from_str("tsv").unwrap(), OutputFormat::Tsv));
    /// assert!(matches!(OutputFormat::from_str("text").unwrap(), OutputFormat::Tsv));
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Tsv,
        })
    }
}

/// Column names of the TSV output.
pub const TSV_COLUMNS: [&str; 14] = [
    "query",
    "chromosome",
    "target_start",
    "target_end",
    "strand",
    "gene_product",
    "gene_symbol",
    "product_type",
    "overlap",
    "three_prime_distance",
    "score",
    "specificity",
    "blat_score",
    "identity",
];

/// Flat view of an association for output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssociationRecord<'a> {
    pub query: &'a str,
    pub chromosome: &'a str,
    pub target_start: u64,
    pub target_end: u64,
    pub strand: Option<String>,
    pub gene_product: &'a str,
    pub gene_symbol: &'a str,
    pub product_type: String,
    pub provisional: bool,
    pub overlap: u64,
    pub three_prime_distance: Option<u64>,
    pub score: Option<f64>,
    pub specificity: Option<f64>,
    pub blat_score: f64,
    pub identity: f64,
}

impl<'a> From<&'a Association> for AssociationRecord<'a> {
    fn from(a: &'a Association) -> Self {
        Self {
            query: a.query_name(),
            chromosome: &a.hit.target_chromosome,
            target_start: a.hit.target_start,
            target_end: a.hit.target_end,
            strand: a.hit.strand.map(|s| s.to_string()),
            gene_product: &a.gene_product.name,
            gene_symbol: &a.gene_product.gene.symbol,
            product_type: format!("{:?}", a.gene_product.product_type),
            provisional: a.gene_product.is_provisional(),
            overlap: a.overlap,
            three_prime_distance: a.three_prime_distance,
            score: a.score,
            specificity: a.specificity,
            blat_score: a.hit.score,
            identity: a.hit.identity,
        }
    }
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| ".".to_string())
}

fn opt_f64(value: Option<f64>) -> String {
    value.map(|v| format!("{:.4}", v)).unwrap_or_else(|| ".".to_string())
}

/// Write the header line (TSV only)
pub fn output_header<W: Write>(writer: &mut W, format: OutputFormat) -> io::Result<()> {
    match format {
        OutputFormat::Tsv => writeln!(writer, "#{}", TSV_COLUMNS.join("\t")),
        OutputFormat::Json => Ok(()),
    }
}

/// Write one association
///
/// # Examples
///
/// ```
/// use ferro_probemap::cli::{output_association, OutputFormat};
/// use ferro_probemap::model::{AlignmentHit, QuerySequence};
/// use ferro_probemap::provisional::{create_provisional, provisional_association};
/// use std::io::Cursor;
/// use std::sync::Arc;
///
/// let query = Arc::new(QuerySequence::new("probe", 50));
/// let hit = Arc::new(AlignmentHit::new(query, "chr2", 100, 150, None, vec![100], vec![50]));
/// let assoc = provisional_association(&hit, create_provisional(&hit).into_product());
///
/// let mut buffer = Cursor::new(Vec::new());
/// output_association(&mut buffer, &assoc, OutputFormat::Tsv).unwrap();
/// let line = String::from_utf8(buffer.into_inner()).unwrap();
/// assert!(line.starts_with("probe\t2\t100\t150\t.\tprobe.par.2.100.150"));
/// ```
pub fn output_association<W: Write>(
    writer: &mut W,
    association: &Association,
    format: OutputFormat,
) -> io::Result<()> {
    let record = AssociationRecord::from(association);
    match format {
        OutputFormat::Json => {
            serde_json::to_writer(&mut *writer, &record).map_err(io::Error::other)?;
            writeln!(writer)
        }
        OutputFormat::Tsv => writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{:.4}\t{:.4}",
            record.query,
            record.chromosome,
            record.target_start,
            record.target_end,
            opt(record.strand.as_deref()),
            record.gene_product,
            record.gene_symbol,
            record.product_type,
            record.overlap,
            opt(record.three_prime_distance),
            opt_f64(record.score),
            opt_f64(record.specificity),
            record.blat_score,
            record.identity
        ),
    }
}

/// Write all associations of a sequence
pub fn output_associations<W: Write>(
    writer: &mut W,
    associations: &[Association],
    format: OutputFormat,
) -> io::Result<()> {
    for association in associations {
        output_association(writer, association, format)?;
    }
    Ok(())
}

#[derive(Serialize)]
struct ErrorRecord<'a> {
    input: &'a str,
    error: String,
    code: String,
    status: &'static str,
}

/// Write an error to the output
///
/// # Examples
///
/// ```
/// use ferro_probemap::cli::{output_error, OutputFormat};
/// use ferro_probemap::ProbeMapError;
/// use std::io::Cursor;
///
/// let mut buffer = Cursor::new(Vec::new());
/// let error = ProbeMapError::lookup("connection refused");
/// output_error(&mut buffer, "probe1", &error, OutputFormat::Tsv).unwrap();
/// let result = String::from_utf8(buffer.into_inner()).unwrap();
/// assert!(result.contains("ERROR: probe1"));
/// ```
pub fn output_error<W: Write>(
    writer: &mut W,
    input: &str,
    error: &ProbeMapError,
    format: OutputFormat,
) -> io::Result<()> {
    match format {
        OutputFormat::Json => {
            let record = ErrorRecord {
                input,
                error: error.to_string(),
                code: error.code().as_str(),
                status: "error",
            };
            serde_json::to_writer(&mut *writer, &record).map_err(io::Error::other)?;
            writeln!(writer)
        }
        OutputFormat::Tsv => writeln!(writer, "ERROR: {} - {}", input, error.detailed_message()),
    }
}
