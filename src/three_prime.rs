//! Distance from an alignment to the 3' end of a transcript.
//!
//! Many array platforms target the 3' end of transcripts, so how far an
//! alignment sits from that end is a useful quality signal. The 3' end is
//! the high coordinate on the `+` strand and the low coordinate on `-`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::coords::find_center_base;
use crate::error::ProbeMapError;
use crate::model::{GenomicInterval, Strand};

/// Which point of the alignment is measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreePrimeMethod {
    /// Alignment end furthest from the 3' end (not supported)
    Left,
    /// Alignment end nearest the 3' end
    #[default]
    Right,
    /// Center base of the aligned blocks
    Middle,
}

impl fmt::Display for ThreePrimeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThreePrimeMethod::Left => write!(f, "left"),
            ThreePrimeMethod::Right => write!(f, "right"),
            ThreePrimeMethod::Middle => write!(f, "middle"),
        }
    }
}

impl FromStr for ThreePrimeMethod {
    type Err = ProbeMapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "left" => Ok(ThreePrimeMethod::Left),
            "right" => Ok(ThreePrimeMethod::Right),
            "middle" => Ok(ThreePrimeMethod::Middle),
            other => Err(ProbeMapError::UnsupportedMethod {
                method: other.to_string(),
            }),
        }
    }
}

/// Overlap and 3' distance of one alignment against one transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreePrimeLocation {
    pub overlap: u64,
    pub distance: u64,
}

/// Distance from the alignment to the 3' end of `gene`.
///
/// `overlap` is passed through unchanged.
pub fn locate(
    method: ThreePrimeMethod,
    gene: &GenomicInterval,
    query_start: u64,
    query_end: u64,
    starts: &[u64],
    sizes: &[u64],
    overlap: u64,
) -> Result<ThreePrimeLocation, ProbeMapError> {
    if method == ThreePrimeMethod::Left {
        return Err(ProbeMapError::UnsupportedMethod {
            method: method.to_string(),
        });
    }

    let strand = gene.strand.ok_or_else(|| ProbeMapError::InvalidStrand {
        msg: format!("no strand on {}", gene),
    })?;

    let reference = match (method, strand) {
        (ThreePrimeMethod::Middle, _) => find_center_base(starts, sizes)?,
        (_, Strand::Plus) => query_end,
        (_, Strand::Minus) => query_start,
    };

    let distance = match strand {
        Strand::Plus => gene.end().saturating_sub(reference),
        Strand::Minus => reference.saturating_sub(gene.start),
    };

    Ok(ThreePrimeLocation { overlap, distance })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gene(start: u64, end: u64, strand: Option<Strand>) -> GenomicInterval {
        GenomicInterval::span("1", start, end, strand).unwrap()
    }

    #[test]
    fn test_right_plus() {
        let g = gene(1000, 5000, Some(Strand::Plus));
        let loc = locate(ThreePrimeMethod::Right, &g, 4700, 4800, &[4700], &[100], 100).unwrap();
        assert_eq!(loc.distance, 200);
        assert_eq!(loc.overlap, 100);
    }

    #[test]
    fn test_right_minus() {
        let g = gene(1000, 5000, Some(Strand::Minus));
        let loc = locate(ThreePrimeMethod::Right, &g, 1100, 1200, &[1100], &[100], 100).unwrap();
        assert_eq!(loc.distance, 100);
    }

    #[test]
    fn test_distance_floored_at_zero() {
        let g = gene(1000, 5000, Some(Strand::Plus));
        let loc = locate(ThreePrimeMethod::Right, &g, 4950, 5100, &[4950], &[150], 50).unwrap();
        assert_eq!(loc.distance, 0);

        let g = gene(1000, 5000, Some(Strand::Minus));
        let loc = locate(ThreePrimeMethod::Right, &g, 900, 1000, &[900], &[100], 0).unwrap();
        assert_eq!(loc.distance, 0);
    }

    #[test]
    fn test_middle_uses_center_base() {
        let g = gene(0, 1000, Some(Strand::Plus));
        let loc = locate(ThreePrimeMethod::Middle, &g, 100, 350, &[100, 300], &[50, 50], 100).unwrap();
        assert_eq!(loc.distance, 700);
    }

    #[test]
    fn test_left_unsupported() {
        let g = gene(0, 1000, Some(Strand::Plus));
        assert!(matches!(
            locate(ThreePrimeMethod::Left, &g, 0, 10, &[0], &[10], 10),
            Err(ProbeMapError::UnsupportedMethod { .. })
        ));
    }

    #[test]
    fn test_missing_strand() {
        let g = gene(0, 1000, None);
        assert!(matches!(
            locate(ThreePrimeMethod::Right, &g, 0, 10, &[0], &[10], 10),
            Err(ProbeMapError::InvalidStrand { .. })
        ));
    }

    #[test]
    fn test_method_parse() {
        assert_eq!("MIDDLE".parse::<ThreePrimeMethod>().unwrap(), ThreePrimeMethod::Middle);
        assert!("center".parse::<ThreePrimeMethod>().is_err());
    }
}
