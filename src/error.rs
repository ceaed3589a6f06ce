//! Error types for ferro-probemap
//!
//! Every error carries an [`ErrorCode`] so callers (and the CLI) can
//! categorize failures without matching on message text. The mapping
//! pipeline uses the variant to decide whether a failure skips a hit,
//! falls back to a provisional region, or fails the whole sequence.

use std::fmt;
use thiserror::Error;

/// Error codes for categorizing errors
///
/// These codes can be used for programmatic error handling
/// and for documentation lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    // Parse errors (E1xxx)
    /// Malformed comma-delimited block list
    InvalidBlockList = 1001,
    /// Malformed alignment record
    InvalidAlignment = 1002,
    /// Malformed annotation row
    InvalidAnnotationRow = 1003,

    // Lookup errors (E2xxx)
    /// Annotation store query failed
    LookupFailed = 2001,
    /// External aligner failed
    AlignerFailed = 2002,

    // Validation errors (E3xxx)
    /// Invalid coordinate range
    InvalidRange = 3001,
    /// Invalid argument passed to an operation
    InvalidArgument = 3002,
    /// Internal invariant violated
    InvariantViolation = 3003,

    // Method errors (E4xxx)
    /// Strand missing or not recognized
    InvalidStrand = 4001,
    /// Unsupported 3' location method
    UnsupportedMethod = 4002,

    // IO errors (E9xxx)
    /// File IO error
    IoError = 9001,
    /// JSON parsing error
    JsonError = 9002,
    /// Configuration error
    ConfigError = 9003,
}

impl ErrorCode {
    /// Get the error code as a string (e.g., "E1001")
    pub fn as_str(&self) -> String {
        format!("E{:04}", *self as u16)
    }

    /// Get a brief description of this error code
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::InvalidBlockList => "invalid block list",
            ErrorCode::InvalidAlignment => "invalid alignment record",
            ErrorCode::InvalidAnnotationRow => "invalid annotation row",
            ErrorCode::LookupFailed => "annotation lookup failed",
            ErrorCode::AlignerFailed => "aligner failed",
            ErrorCode::InvalidRange => "invalid coordinate range",
            ErrorCode::InvalidArgument => "invalid argument",
            ErrorCode::InvariantViolation => "internal invariant violated",
            ErrorCode::InvalidStrand => "invalid or missing strand",
            ErrorCode::UnsupportedMethod => "unsupported 3' location method",
            ErrorCode::IoError => "file I/O error",
            ErrorCode::JsonError => "JSON parsing error",
            ErrorCode::ConfigError => "configuration error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors raised while resolving alignments to genes
#[derive(Error, Debug, Clone)]
pub enum ProbeMapError {
    /// Parse error with position and message
    #[error("Parse error at position {pos}: {msg}")]
    Parse {
        pos: usize,
        msg: String,
        code: ErrorCode,
    },

    /// An interval whose start lies after its end
    #[error("Invalid range: start {start} > end {end}")]
    InvalidRange { start: u64, end: u64 },

    /// Invalid argument to an operation
    #[error("Invalid argument: {msg}")]
    InvalidArgument { msg: String },

    /// Strand required but missing or unrecognized
    #[error("Invalid strand: {msg}")]
    InvalidStrand { msg: String },

    /// 3' location method that is not implemented
    #[error("Unsupported 3' location method: {method}")]
    UnsupportedMethod { method: String },

    /// The annotation store failed to answer a query
    #[error("Annotation lookup failed: {msg}")]
    Lookup { msg: String },

    /// The aligner failed to produce hits
    #[error("Aligner failed for {sequence}: {msg}")]
    Aligner { sequence: String, msg: String },

    /// A value outside its documented domain reached the pipeline
    #[error("Invariant violated: {msg}")]
    Invariant { msg: String },

    /// Invalid configuration
    #[error("Configuration error: {msg}")]
    Config { msg: String },

    /// IO error (for file operations)
    #[error("IO error: {msg}")]
    Io { msg: String },

    /// JSON parsing error
    #[error("JSON error: {msg}")]
    Json { msg: String },
}

impl ProbeMapError {
    /// Create a block-list parse error
    pub fn parse(pos: usize, msg: impl Into<String>) -> Self {
        ProbeMapError::Parse {
            pos,
            msg: msg.into(),
            code: ErrorCode::InvalidBlockList,
        }
    }

    /// Create a parse error with an explicit code
    pub fn parse_with_code(pos: usize, msg: impl Into<String>, code: ErrorCode) -> Self {
        ProbeMapError::Parse {
            pos,
            msg: msg.into(),
            code,
        }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        ProbeMapError::InvalidArgument { msg: msg.into() }
    }

    /// Create a lookup error
    pub fn lookup(msg: impl Into<String>) -> Self {
        ProbeMapError::Lookup { msg: msg.into() }
    }

    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            ProbeMapError::Parse { code, .. } => *code,
            ProbeMapError::InvalidRange { .. } => ErrorCode::InvalidRange,
            ProbeMapError::InvalidArgument { .. } => ErrorCode::InvalidArgument,
            ProbeMapError::InvalidStrand { .. } => ErrorCode::InvalidStrand,
            ProbeMapError::UnsupportedMethod { .. } => ErrorCode::UnsupportedMethod,
            ProbeMapError::Lookup { .. } => ErrorCode::LookupFailed,
            ProbeMapError::Aligner { .. } => ErrorCode::AlignerFailed,
            ProbeMapError::Invariant { .. } => ErrorCode::InvariantViolation,
            ProbeMapError::Config { .. } => ErrorCode::ConfigError,
            ProbeMapError::Io { .. } => ErrorCode::IoError,
            ProbeMapError::Json { .. } => ErrorCode::JsonError,
        }
    }

    /// Whether this error only invalidates the hit being processed.
    pub fn is_hit_local(&self) -> bool {
        matches!(self, ProbeMapError::Parse { .. })
    }

    /// Whether the mapper may fall back to a provisional region.
    pub fn allows_provisional_fallback(&self) -> bool {
        matches!(
            self,
            ProbeMapError::InvalidArgument { .. } | ProbeMapError::InvalidRange { .. }
        )
    }

    /// Format the error with its code prefix, e.g. `[E3001] Invalid range: ...`
    pub fn detailed_message(&self) -> String {
        format!("[{}] {}", self.code(), self)
    }
}

impl From<std::io::Error> for ProbeMapError {
    fn from(err: std::io::Error) -> Self {
        ProbeMapError::Io {
            msg: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ProbeMapError {
    fn from(err: serde_json::Error) -> Self {
        ProbeMapError::Json {
            msg: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for ProbeMapError {
    fn from(err: toml::de::Error) -> Self {
        ProbeMapError::Config {
            msg: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for ProbeMapError {
    fn from(err: toml::ser::Error) -> Self {
        ProbeMapError::Config {
            msg: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_format() {
        assert_eq!(ErrorCode::InvalidBlockList.as_str(), "E1001");
        assert_eq!(ErrorCode::LookupFailed.as_str(), "E2001");
        assert_eq!(ErrorCode::InvalidRange.to_string(), "E3001");
        assert_eq!(ErrorCode::ConfigError.as_str(), "E9003");
    }

    #[test]
    fn test_error_code_descriptions() {
        assert_eq!(
            ErrorCode::UnsupportedMethod.description(),
            "unsupported 3' location method"
        );
        assert_eq!(ErrorCode::IoError.description(), "file I/O error");
    }

    #[test]
    fn test_code_for_variants() {
        let err = ProbeMapError::InvalidRange { start: 10, end: 5 };
        assert_eq!(err.code(), ErrorCode::InvalidRange);
        assert_eq!(err.to_string(), "Invalid range: start 10 > end 5");

        let err = ProbeMapError::parse(2, "bad token");
        assert_eq!(err.code(), ErrorCode::InvalidBlockList);
        assert!(err.is_hit_local());

        let err = ProbeMapError::parse_with_code(0, "short row", ErrorCode::InvalidAlignment);
        assert_eq!(err.code(), ErrorCode::InvalidAlignment);
    }

    #[test]
    fn test_fallback_classification() {
        assert!(ProbeMapError::invalid_argument("end < start").allows_provisional_fallback());
        assert!(!ProbeMapError::lookup("timeout").allows_provisional_fallback());
        assert!(!ProbeMapError::InvalidStrand { msg: "?".into() }.allows_provisional_fallback());
    }

    #[test]
    fn test_detailed_message() {
        let err = ProbeMapError::lookup("connection refused");
        assert_eq!(
            err.detailed_message(),
            "[E2001] Annotation lookup failed: connection refused"
        );
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.psl");
        let err: ProbeMapError = io.into();
        assert_eq!(err.code(), ErrorCode::IoError);
    }
}
