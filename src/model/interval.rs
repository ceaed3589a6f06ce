use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::coords::{bin_from_range, strip_prefix};
use crate::error::ProbeMapError;

/// Strand orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strand {
    #[serde(rename = "+")]
    Plus,
    #[serde(rename = "-")]
    Minus,
}

impl Strand {
    /// Parse an optional strand column; empty, `.` and `?` mean unknown.
    pub fn parse_optional(s: &str) -> Result<Option<Strand>, ProbeMapError> {
        match s.trim() {
            "" | "." | "?" => Ok(None),
            other => other.parse().map(Some),
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strand::Plus => write!(f, "+"),
            Strand::Minus => write!(f, "-"),
        }
    }
}

impl FromStr for Strand {
    type Err = ProbeMapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "+" => Ok(Strand::Plus),
            "-" => Ok(Strand::Minus),
            other => Err(ProbeMapError::InvalidStrand {
                msg: format!("unrecognized strand '{}'", other),
            }),
        }
    }
}

/// A located span on a chromosome.
///
/// The chromosome is held without the `chr` prefix. A missing length means
/// only the start position is known.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GenomicInterval {
    pub chromosome: String,
    /// 0-based start
    pub start: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strand: Option<Strand>,
}

/// An exon is a located span owned by one gene product.
pub type Exon = GenomicInterval;

impl GenomicInterval {
    /// Create an interval from a start and length.
    pub fn new(chromosome: &str, start: u64, length: Option<u64>, strand: Option<Strand>) -> Self {
        Self {
            chromosome: strip_prefix(chromosome).to_string(),
            start,
            length,
            strand,
        }
    }

    /// Create an interval from half-open `[start, end)` coordinates.
    pub fn span(
        chromosome: &str,
        start: u64,
        end: u64,
        strand: Option<Strand>,
    ) -> Result<Self, ProbeMapError> {
        if end < start {
            return Err(ProbeMapError::InvalidRange { start, end });
        }
        Ok(Self::new(chromosome, start, Some(end - start), strand))
    }

    /// Exclusive end; equals `start` when the length is unknown.
    pub fn end(&self) -> u64 {
        self.start + self.length.unwrap_or(0)
    }

    /// UCSC bin of this interval.
    pub fn bin(&self) -> Result<u32, ProbeMapError> {
        bin_from_range(self.start, self.end())
    }
}

impl fmt::Display for GenomicInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.chromosome, self.start, self.end())?;
        if let Some(strand) = self.strand {
            write!(f, "({})", strand)?;
        }
        Ok(())
    }
}
