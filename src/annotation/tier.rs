use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ProbeMapError;
use crate::model::{GeneProductType, Taxon};

use super::rows::FeatureKind;

/// An annotation source, in decreasing order of curation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureTier {
    /// Curated transcripts (RefSeq)
    Curated,
    /// General known-gene annotation
    KnownGene,
    /// Micro/sno-RNA records, often without exon structure
    SmallRna,
    /// Gene predictions available for one species only (Acembly, human)
    PredictedSpeciesRestricted,
    /// Gene predictions available for many species (N-SCAN)
    PredictedBroad,
}

impl FeatureTier {
    /// All tiers in default query order.
    pub const ALL: [FeatureTier; 5] = [
        FeatureTier::Curated,
        FeatureTier::KnownGene,
        FeatureTier::SmallRna,
        FeatureTier::PredictedSpeciesRestricted,
        FeatureTier::PredictedBroad,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureTier::Curated => "curated",
            FeatureTier::KnownGene => "known_gene",
            FeatureTier::SmallRna => "small_rna",
            FeatureTier::PredictedSpeciesRestricted => "predicted_species_restricted",
            FeatureTier::PredictedBroad => "predicted_broad",
        }
    }

    /// How rows from this tier are decoded.
    pub fn kind(&self) -> FeatureKind {
        match self {
            FeatureTier::Curated | FeatureTier::KnownGene => {
                FeatureKind::Annotated(GeneProductType::Mrna)
            }
            FeatureTier::SmallRna => FeatureKind::Annotated(GeneProductType::NonCodingRna),
            FeatureTier::PredictedSpeciesRestricted => FeatureKind::Predicted {
                method: "Acembly".to_string(),
            },
            FeatureTier::PredictedBroad => FeatureKind::Predicted {
                method: "NScan".to_string(),
            },
        }
    }

    /// Whether the tier has data for `taxon`.
    pub fn applies_to(&self, taxon: &Taxon) -> bool {
        match self {
            FeatureTier::PredictedSpeciesRestricted => taxon.is("human"),
            _ => true,
        }
    }

    pub fn is_predicted(&self) -> bool {
        matches!(
            self,
            FeatureTier::PredictedSpeciesRestricted | FeatureTier::PredictedBroad
        )
    }
}

impl fmt::Display for FeatureTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FeatureTier {
    type Err = ProbeMapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "curated" | "refseq" => Ok(FeatureTier::Curated),
            "known_gene" | "knowngene" => Ok(FeatureTier::KnownGene),
            "small_rna" | "microrna" => Ok(FeatureTier::SmallRna),
            "predicted_species_restricted" | "acembly" => Ok(FeatureTier::PredictedSpeciesRestricted),
            "predicted_broad" | "nscan" => Ok(FeatureTier::PredictedBroad),
            other => Err(ProbeMapError::invalid_argument(format!(
                "unknown feature tier '{}'",
                other
            ))),
        }
    }
}

/// When a tier is queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierMode {
    /// Always queried, results unioned
    Always,
    /// Queried only while nothing has been found
    IfEmpty,
}

/// One step of the fallback order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierRule {
    pub tier: FeatureTier,
    pub mode: TierMode,
}

/// Ordered list of tiers to query for a region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierPolicy {
    rules: Vec<TierRule>,
}

impl Default for TierPolicy {
    fn default() -> Self {
        Self::new(vec![
            TierRule { tier: FeatureTier::Curated, mode: TierMode::Always },
            TierRule { tier: FeatureTier::KnownGene, mode: TierMode::Always },
            TierRule { tier: FeatureTier::SmallRna, mode: TierMode::Always },
            TierRule { tier: FeatureTier::PredictedSpeciesRestricted, mode: TierMode::IfEmpty },
            TierRule { tier: FeatureTier::PredictedBroad, mode: TierMode::IfEmpty },
        ])
    }
}

impl TierPolicy {
    pub fn new(rules: Vec<TierRule>) -> Self {
        Self { rules }
    }

    /// The default policy without gene predictions.
    pub fn without_predicted() -> Self {
        let mut policy = Self::default();
        policy.rules.retain(|r| !r.tier.is_predicted());
        policy
    }

    pub fn rules(&self) -> &[TierRule] {
        &self.rules
    }

    /// Whether a rule should run given how many features were found so far.
    pub fn should_query(rule: &TierRule, found_so_far: usize) -> bool {
        match rule.mode {
            TierMode::Always => true,
            TierMode::IfEmpty => found_so_far == 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_order() {
        let policy = TierPolicy::default();
        let tiers: Vec<_> = policy.rules().iter().map(|r| r.tier).collect();
        assert_eq!(tiers, FeatureTier::ALL.to_vec());
        assert_eq!(policy.rules()[2].mode, TierMode::Always);
        assert_eq!(policy.rules()[3].mode, TierMode::IfEmpty);
    }

    #[test]
    fn test_without_predicted() {
        let policy = TierPolicy::without_predicted();
        assert_eq!(policy.rules().len(), 3);
        assert!(policy.rules().iter().all(|r| !r.tier.is_predicted()));
    }

    #[test]
    fn test_species_restriction() {
        assert!(FeatureTier::PredictedSpeciesRestricted.applies_to(&Taxon::new("Human")));
        assert!(!FeatureTier::PredictedSpeciesRestricted.applies_to(&Taxon::new("mouse")));
        assert!(FeatureTier::PredictedBroad.applies_to(&Taxon::new("mouse")));
    }

    #[test]
    fn test_should_query() {
        let rule = TierRule { tier: FeatureTier::PredictedBroad, mode: TierMode::IfEmpty };
        assert!(TierPolicy::should_query(&rule, 0));
        assert!(!TierPolicy::should_query(&rule, 2));
    }

    #[test]
    fn test_tier_from_track_name() {
        assert_eq!("refseq".parse::<FeatureTier>().unwrap(), FeatureTier::Curated);
        assert_eq!("microRNA".parse::<FeatureTier>().unwrap(), FeatureTier::SmallRna);
        assert_eq!("nscan".parse::<FeatureTier>().unwrap(), FeatureTier::PredictedBroad);
        assert!("ensembl".parse::<FeatureTier>().is_err());
    }
}
