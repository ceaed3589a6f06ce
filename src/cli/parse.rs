//! Parsing utilities for CLI operations

use crate::error::ProbeMapError;
use crate::model::{QuerySequence, SequenceType};
use crate::sequence::Reporter;

const HEADER_KEYS: [&str; 4] = ["name", "accession", "query", "reporter"];

/// Select the content of one line of a tab-separated input table.
///
/// Blank lines, `#` comment lines and a header row whose first column is
/// `name`, `accession`, `query` or `reporter` yield `None`. A UTF-8 BOM is
/// removed from the first line only.
///
/// # Examples
///
/// ```
/// use ferro_probemap::cli::table_line;
///
/// assert_eq!(table_line("\u{feff}name\tlength", true), None);
/// assert_eq!(table_line("BC000001\t1200\n", false), Some("BC000001\t1200"));
/// assert_eq!(table_line("# exported 2024", false), None);
/// ```
pub fn table_line(line: &str, first: bool) -> Option<&str> {
    let line = if first {
        line.strip_prefix('\u{feff}').unwrap_or(line)
    } else {
        line
    };
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let head = line.split('\t').next().unwrap_or_default().trim();
    if HEADER_KEYS.iter().any(|key| head.eq_ignore_ascii_case(key)) {
        return None;
    }
    Some(line)
}

fn field<'a>(fields: &[&'a str], index: usize, name: &str, line: &str) -> Result<&'a str, ProbeMapError> {
    fields
        .get(index)
        .map(|f| f.trim())
        .filter(|f| !f.is_empty())
        .ok_or_else(|| ProbeMapError::parse(0, format!("missing {} in line: {}", name, line)))
}

/// Parse a reporter line: `name <TAB> sequence <TAB> start_in_parent`
///
/// # Examples
///
/// ```
/// use ferro_probemap::cli::parse_reporter_line;
///
/// let reporter = parse_reporter_line("probe_1\tACGTACGT\t25").unwrap();
/// assert_eq!(reporter.name, "probe_1");
/// assert_eq!(reporter.start_in_parent, 25);
/// assert!(parse_reporter_line("probe_1\tACGT").is_err());
/// ```
pub fn parse_reporter_line(line: &str) -> Result<Reporter, ProbeMapError> {
    let fields: Vec<&str> = line.split('\t').collect();
    let name = field(&fields, 0, "reporter name", line)?;
    let sequence = field(&fields, 1, "reporter sequence", line)?;
    let start = field(&fields, 2, "start in parent", line)?;
    let start = start.parse::<u64>().map_err(|_| {
        ProbeMapError::parse(0, format!("invalid start in parent '{}'", start))
    })?;
    Ok(Reporter::new(name, sequence, start))
}

/// Parse a sequence table line:
/// `name <TAB> length [<TAB> type [<TAB> fraction_repeats]]`
///
/// Empty or `.` optional columns are left unset.
///
/// # Examples
///
/// ```
/// use ferro_probemap::cli::parse_sequence_line;
/// use ferro_probemap::model::SequenceType;
///
/// let seq = parse_sequence_line("1007_s_at\t25\taffy_probe\t0.1").unwrap();
/// assert_eq!(seq.length, 25);
/// assert_eq!(seq.sequence_type, Some(SequenceType::AffyProbe));
/// assert_eq!(seq.fraction_repeats, Some(0.1));
///
/// let bare = parse_sequence_line("BC000001\t1200").unwrap();
/// assert!(bare.sequence_type.is_none());
/// ```
pub fn parse_sequence_line(line: &str) -> Result<QuerySequence, ProbeMapError> {
    let fields: Vec<&str> = line.split('\t').collect();
    let name = field(&fields, 0, "sequence name", line)?;
    let length = field(&fields, 1, "sequence length", line)?;
    let length = length.parse::<u64>().map_err(|_| {
        ProbeMapError::parse(0, format!("invalid sequence length '{}'", length))
    })?;
    let mut sequence = QuerySequence::new(name, length);

    if let Some(kind) = optional(&fields, 2) {
        sequence = sequence.with_type(kind.parse::<SequenceType>()?);
    }
    if let Some(fraction) = optional(&fields, 3) {
        let fraction = fraction.parse::<f64>().map_err(|_| {
            ProbeMapError::parse(0, format!("invalid repeat fraction '{}'", fraction))
        })?;
        if !(0.0..=1.0).contains(&fraction) {
            return Err(ProbeMapError::parse(
                0,
                format!("repeat fraction {} outside [0, 1]", fraction),
            ));
        }
        sequence = sequence.with_fraction_repeats(fraction);
    }
    Ok(sequence)
}

fn optional<'a>(fields: &[&'a str], index: usize) -> Option<&'a str> {
    fields
        .get(index)
        .map(|f| f.trim())
        .filter(|f| !f.is_empty() && *f != ".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_line_skips_headers_and_comments() {
        assert_eq!(table_line("Accession", true), None);
        assert_eq!(table_line("QUERY\tlength\ttype", false), None);
        assert_eq!(table_line("   ", false), None);
        assert_eq!(table_line("#name\tsequence", false), None);
        assert_eq!(table_line("\u{feff}probe_1\tACGT\t0", true), Some("probe_1\tACGT\t0"));
        // a BOM past the first line is left for the parser to reject
        assert_eq!(table_line("\u{feff}x\t60", false), Some("\u{feff}x\t60"));
        assert_eq!(table_line("named_gene\t60", false), Some("named_gene\t60"));
    }

    #[test]
    fn test_reporter_line_errors() {
        assert!(parse_reporter_line("").is_err());
        assert!(parse_reporter_line("p\tACGT\tten").is_err());
        assert!(parse_reporter_line("p\t\t3").is_err());
    }

    #[test]
    fn test_sequence_line_placeholders() {
        let seq = parse_sequence_line("x\t60\t.\t0.5").unwrap();
        assert!(seq.sequence_type.is_none());
        assert_eq!(seq.fraction_repeats, Some(0.5));
    }

    #[test]
    fn test_sequence_line_errors() {
        assert!(parse_sequence_line("x").is_err());
        assert!(parse_sequence_line("x\tlong").is_err());
        assert!(parse_sequence_line("x\t60\tbogus").is_err());
        assert!(parse_sequence_line("x\t60\toligo\t1.5").is_err());
    }
}
