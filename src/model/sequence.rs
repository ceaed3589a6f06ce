use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ProbeMapError;

/// An organism, identified by its common name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Taxon {
    common_name: String,
}

impl Taxon {
    pub fn new(common_name: impl Into<String>) -> Self {
        Self {
            common_name: common_name.into(),
        }
    }

    pub fn human() -> Self {
        Self::new("human")
    }

    pub fn common_name(&self) -> &str {
        &self.common_name
    }

    /// Case-insensitive comparison against a common name.
    pub fn is(&self, common_name: &str) -> bool {
        self.common_name.eq_ignore_ascii_case(common_name)
    }
}

impl fmt::Display for Taxon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.common_name)
    }
}

/// Molecule or preparation type of a query sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceType {
    Est,
    Mrna,
    Oligo,
    AffyCollapsed,
    AffyProbe,
    AffyTarget,
    Dna,
    Other,
}

impl SequenceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SequenceType::Est => "est",
            SequenceType::Mrna => "mrna",
            SequenceType::Oligo => "oligo",
            SequenceType::AffyCollapsed => "affy_collapsed",
            SequenceType::AffyProbe => "affy_probe",
            SequenceType::AffyTarget => "affy_target",
            SequenceType::Dna => "dna",
            SequenceType::Other => "other",
        }
    }
}

impl fmt::Display for SequenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SequenceType {
    type Err = ProbeMapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "est" => Ok(SequenceType::Est),
            "mrna" => Ok(SequenceType::Mrna),
            "oligo" => Ok(SequenceType::Oligo),
            "affy_collapsed" => Ok(SequenceType::AffyCollapsed),
            "affy_probe" => Ok(SequenceType::AffyProbe),
            "affy_target" => Ok(SequenceType::AffyTarget),
            "dna" => Ok(SequenceType::Dna),
            "other" => Ok(SequenceType::Other),
            other => Err(ProbeMapError::invalid_argument(format!(
                "unknown sequence type '{}'",
                other
            ))),
        }
    }
}

/// A biological sequence submitted for mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuerySequence {
    pub name: String,
    /// Length in bases
    pub length: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_type: Option<SequenceType>,
    /// Fraction of the sequence masked as repeats, in `[0, 1]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fraction_repeats: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taxon: Option<Taxon>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub residues: Option<String>,
}

impl QuerySequence {
    pub fn new(name: impl Into<String>, length: u64) -> Self {
        Self {
            name: name.into(),
            length,
            sequence_type: None,
            fraction_repeats: None,
            taxon: None,
            residues: None,
        }
    }

    /// Create a sequence from its residues; the length is taken from them.
    pub fn from_residues(name: impl Into<String>, residues: impl Into<String>) -> Self {
        let residues = residues.into();
        let mut seq = Self::new(name, residues.len() as u64);
        seq.residues = Some(residues);
        seq
    }

    pub fn with_type(mut self, sequence_type: SequenceType) -> Self {
        self.sequence_type = Some(sequence_type);
        self
    }

    pub fn with_fraction_repeats(mut self, fraction: f64) -> Self {
        self.fraction_repeats = Some(fraction);
        self
    }

    pub fn with_taxon(mut self, taxon: Taxon) -> Self {
        self.taxon = Some(taxon);
        self
    }
}
