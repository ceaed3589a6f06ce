//! Configuration file support for ferro-probemap.
//!
//! Mapping thresholds can be kept in a `.probemap.toml` file rather than
//! passed on every invocation.
//!
//! # Example Configuration
//!
//! ```toml
//! blat_score_threshold = 0.75
//! identity_threshold = 0.80
//! maximum_repeat_fraction = 0.3
//! non_specific_site_count_threshold = 3
//! minimum_exon_overlap_fraction = 0.05
//! three_prime_method = "right"
//! ignore_strand = false
//! allow_provisional = true
//! allow_predicted = true
//! region_cache_capacity = 200
//! ```
//!
//! # Config File Locations
//!
//! Configuration is searched in this order (first found wins):
//! 1. `.probemap.toml` in current directory
//! 2. `~/.config/ferro/probemap.toml`
//!
//! CLI flags take precedence over config file settings.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cache::DEFAULT_REGION_CACHE_CAPACITY;
use crate::error::ProbeMapError;
use crate::three_prime::ThreePrimeMethod;

/// Thresholds and switches for the mapping pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProbeMapperConfig {
    /// Minimum alignment score for a hit to be used
    pub blat_score_threshold: f64,
    /// Minimum alignment identity for a hit to be used
    pub identity_threshold: f64,
    /// Repeat fraction above which a sequence may be skipped
    pub maximum_repeat_fraction: f64,
    /// Hit count at which a repetitive sequence is considered non-specific
    pub non_specific_site_count_threshold: usize,
    /// Minimum fraction of aligned bases within exons (0 disables filtering)
    pub minimum_exon_overlap_fraction: f64,
    /// How the distance to the 3' end is measured
    pub three_prime_method: ThreePrimeMethod,
    /// Ignore hit strand regardless of sequence type
    pub ignore_strand: bool,
    /// Create provisional regions for unannotated alignments
    pub allow_provisional: bool,
    /// Consult gene prediction tracks when nothing else is found
    pub allow_predicted: bool,
    /// Number of regions kept by the transcript-alignment cache
    pub region_cache_capacity: usize,
}

impl Default for ProbeMapperConfig {
    fn default() -> Self {
        Self {
            blat_score_threshold: 0.75,
            identity_threshold: 0.80,
            maximum_repeat_fraction: 0.3,
            non_specific_site_count_threshold: 3,
            minimum_exon_overlap_fraction: 0.05,
            three_prime_method: ThreePrimeMethod::Right,
            ignore_strand: false,
            allow_provisional: true,
            allow_predicted: true,
            region_cache_capacity: DEFAULT_REGION_CACHE_CAPACITY,
        }
    }
}

fn check_fraction(name: &str, value: f64) -> Result<(), ProbeMapError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ProbeMapError::Config {
            msg: format!("{} must be within [0, 1], got {}", name, value),
        });
    }
    Ok(())
}

impl ProbeMapperConfig {
    /// Load configuration from the default locations.
    ///
    /// Searches for config in:
    /// 1. `.probemap.toml` in current directory
    /// 2. `~/.config/ferro/probemap.toml`
    ///
    /// A file that exists but fails to parse is an error; no file at all
    /// yields `None`.
    pub fn load() -> Result<Option<Self>, ProbeMapError> {
        for path in Self::search_paths() {
            if path.exists() {
                log::debug!("Loading configuration from {}", path.display());
                return Self::from_file(&path).map(Some);
            }
        }
        Ok(None)
    }

    /// Candidate config file paths, in search order.
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(".probemap.toml")];
        if let Some(home) = dirs_home() {
            paths.push(home.join(".config").join("ferro").join("probemap.toml"));
        }
        paths
    }

    /// Load configuration from a specific path.
    pub fn from_file(path: &Path) -> Result<Self, ProbeMapError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML content and validate it.
    pub fn parse(content: &str) -> Result<Self, ProbeMapError> {
        let config: ProbeMapperConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration as TOML.
    pub fn to_file(&self, path: &Path) -> Result<(), ProbeMapError> {
        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Render the configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ProbeMapError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check option ranges and reject unsupported methods.
    pub fn validate(&self) -> Result<(), ProbeMapError> {
        check_fraction("blat_score_threshold", self.blat_score_threshold)?;
        check_fraction("identity_threshold", self.identity_threshold)?;
        check_fraction("maximum_repeat_fraction", self.maximum_repeat_fraction)?;
        check_fraction(
            "minimum_exon_overlap_fraction",
            self.minimum_exon_overlap_fraction,
        )?;
        if self.three_prime_method == ThreePrimeMethod::Left {
            return Err(ProbeMapError::UnsupportedMethod {
                method: self.three_prime_method.to_string(),
            });
        }
        Ok(())
    }
}

/// Get the home directory
fn dirs_home() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_are_valid() {
        let config = ProbeMapperConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.region_cache_capacity, 200);
        assert_eq!(config.three_prime_method, ThreePrimeMethod::Right);
    }

    #[test]
    fn test_parse_partial() {
        let config = ProbeMapperConfig::parse(
            r#"
blat_score_threshold = 0.9
three_prime_method = "middle"
ignore_strand = true
"#,
        )
        .unwrap();
        assert_eq!(config.blat_score_threshold, 0.9);
        assert_eq!(config.three_prime_method, ThreePrimeMethod::Middle);
        assert!(config.ignore_strand);
        // Unspecified fields keep their defaults
        assert_eq!(config.identity_threshold, 0.80);
    }

    #[test]
    fn test_parse_rejects_left() {
        let err = ProbeMapperConfig::parse(r#"three_prime_method = "left""#).unwrap_err();
        assert!(matches!(err, ProbeMapError::UnsupportedMethod { .. }));
    }

    #[test]
    fn test_parse_rejects_out_of_range() {
        assert!(ProbeMapperConfig::parse("identity_threshold = 1.5").is_err());
        assert!(ProbeMapperConfig::parse("maximum_repeat_fraction = -0.1").is_err());
    }

    #[test]
    fn test_parse_rejects_unknown_key() {
        let err = ProbeMapperConfig::parse("score = 0.5").unwrap_err();
        assert!(matches!(err, ProbeMapError::Config { .. }));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("probemap.toml");
        let config = ProbeMapperConfig {
            minimum_exon_overlap_fraction: 0.0,
            allow_predicted: false,
            ..Default::default()
        };
        config.to_file(&path).unwrap();
        assert_eq!(ProbeMapperConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_search_paths_start_with_cwd() {
        let paths = ProbeMapperConfig::search_paths();
        assert_eq!(paths[0], PathBuf::from(".probemap.toml"));
    }
}
