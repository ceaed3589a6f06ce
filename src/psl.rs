//! BLAT PSL alignment records.
//!
//! PSL is the tab-separated 21-column format written by BLAT and used by
//! the UCSC `all_mrna` / `all_est` tables. Block columns stay as raw text
//! until a record is turned into an [`AlignmentHit`], so a malformed block
//! list only invalidates that one hit.
//!
//! Files may be plain or gzip-compressed (`.gz`); header lines written by
//! `psLayout` are skipped.

use flate2::read::MultiGzDecoder;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use crate::coords::parse_block_list;
use crate::error::{ErrorCode, ProbeMapError};
use crate::model::{AlignmentHit, QuerySequence, Strand};

const PSL_COLUMNS: usize = 21;

/// One PSL row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PslRecord {
    pub matches: u64,
    #[serde(default)]
    pub mis_matches: u64,
    #[serde(default)]
    pub rep_matches: u64,
    #[serde(default)]
    pub n_count: u64,
    #[serde(default)]
    pub q_num_insert: u64,
    #[serde(default)]
    pub q_base_insert: u64,
    #[serde(default)]
    pub t_num_insert: u64,
    #[serde(default)]
    pub t_base_insert: u64,
    pub strand: String,
    pub q_name: String,
    pub q_size: u64,
    pub q_start: u64,
    pub q_end: u64,
    pub t_name: String,
    #[serde(default)]
    pub t_size: u64,
    pub t_start: u64,
    pub t_end: u64,
    #[serde(default)]
    pub block_count: u64,
    pub block_sizes: String,
    #[serde(default)]
    pub q_starts: String,
    pub t_starts: String,
}

fn record_error(pos: usize, msg: impl Into<String>) -> ProbeMapError {
    ProbeMapError::parse_with_code(pos, msg, ErrorCode::InvalidAlignment)
}

impl PslRecord {
    /// Parse one tab-separated PSL line.
    pub fn parse_line(line: &str) -> Result<Self, ProbeMapError> {
        let fields: Vec<&str> = line.trim_end_matches(|c: char| c == '\r' || c == '\n').split('\t').collect();
        if fields.len() < PSL_COLUMNS {
            return Err(record_error(
                fields.len(),
                format!("expected {} columns, found {}", PSL_COLUMNS, fields.len()),
            ));
        }

        let num = |i: usize| -> Result<u64, ProbeMapError> {
            fields[i]
                .trim()
                .parse::<u64>()
                .map_err(|_| record_error(i, format!("column {} is not an integer: '{}'", i + 1, fields[i])))
        };

        Ok(Self {
            matches: num(0)?,
            mis_matches: num(1)?,
            rep_matches: num(2)?,
            n_count: num(3)?,
            q_num_insert: num(4)?,
            q_base_insert: num(5)?,
            t_num_insert: num(6)?,
            t_base_insert: num(7)?,
            strand: fields[8].trim().to_string(),
            q_name: fields[9].trim().to_string(),
            q_size: num(10)?,
            q_start: num(11)?,
            q_end: num(12)?,
            t_name: fields[13].trim().to_string(),
            t_size: num(14)?,
            t_start: num(15)?,
            t_end: num(16)?,
            block_count: num(17)?,
            block_sizes: fields[18].to_string(),
            q_starts: fields[19].to_string(),
            t_starts: fields[20].to_string(),
        })
    }

    /// The query sequence as described by this record.
    pub fn query_sequence(&self) -> QuerySequence {
        QuerySequence::new(self.q_name.clone(), self.q_size)
    }

    /// Genomic strand of the alignment.
    ///
    /// For translated alignments (`"+-"`) the second character is the target
    /// strand; the hit is on the minus strand when the two differ.
    fn genomic_strand(&self) -> Result<Option<Strand>, ProbeMapError> {
        let mut chars = self.strand.chars();
        let query = match chars.next() {
            Some(c) => Strand::parse_optional(&c.to_string())?,
            None => return Ok(None),
        };
        let target = match chars.next() {
            Some(c) => Strand::parse_optional(&c.to_string())?,
            None => return Ok(query),
        };
        Ok(match (query, target) {
            (Some(q), Some(t)) if q != t => Some(Strand::Minus),
            (Some(_), Some(_)) => Some(Strand::Plus),
            (q, None) => q,
            (None, t) => t,
        })
    }

    /// Build an alignment hit for `query`.
    ///
    /// Fails with a parse error when the block columns are malformed or
    /// disagree with the block count.
    pub fn to_hit(&self, query: Arc<QuerySequence>) -> Result<AlignmentHit, ProbeMapError> {
        let block_sizes = parse_block_list(&self.block_sizes)?;
        let block_starts = parse_block_list(&self.t_starts)?;
        let query_starts = parse_block_list(&self.q_starts)?;

        if self.block_count != 0 && self.block_count as usize != block_sizes.len() {
            return Err(record_error(
                17,
                format!(
                    "block count {} but {} block sizes",
                    self.block_count,
                    block_sizes.len()
                ),
            ));
        }

        let strand = self
            .genomic_strand()
            .map_err(|e| record_error(8, e.to_string()))?;

        let mut hit = AlignmentHit::new(
            query,
            &self.t_name,
            self.t_start,
            self.t_end,
            strand,
            block_starts,
            block_sizes,
        );
        hit.query_starts = query_starts;
        hit.query_start = self.q_start;
        hit.query_end = self.q_end;
        hit.matches = self.matches;
        hit.mismatches = self.mis_matches;
        hit.rep_matches = self.rep_matches;
        hit.query_gap_count = self.q_num_insert;
        hit.target_gap_count = self.t_num_insert;
        hit.rescore();
        hit.validate()?;
        Ok(hit)
    }
}

/// Convert records to hits, sharing one query sequence per name.
///
/// Sequences found in `known` are used as given (type, repeat fraction,
/// taxon); others are built from the record. Each record converts
/// independently.
pub fn to_hits(
    records: &[PslRecord],
    known: &HashMap<String, QuerySequence>,
) -> Vec<Result<AlignmentHit, ProbeMapError>> {
    let mut queries: HashMap<&str, Arc<QuerySequence>> = HashMap::new();
    records
        .iter()
        .map(|record| {
            let query = queries
                .entry(record.q_name.as_str())
                .or_insert_with(|| {
                    Arc::new(
                        known
                            .get(&record.q_name)
                            .cloned()
                            .unwrap_or_else(|| record.query_sequence()),
                    )
                })
                .clone();
            record.to_hit(query)
        })
        .collect()
}

fn is_header(line: &str) -> bool {
    let trimmed = line.trim_start();
    !trimmed.starts_with(|c: char| c.is_ascii_digit())
}

/// Streaming PSL reader.
///
/// Yields one result per data line; errors carry the 1-based line number
/// as their position so callers can report and continue.
pub struct PslReader<R: BufRead> {
    reader: R,
    line_no: usize,
    buf: String,
}

impl PslReader<Box<dyn BufRead>> {
    /// Open a PSL file, decompressing `.gz` input.
    pub fn open(path: &Path) -> Result<Self, ProbeMapError> {
        let file = File::open(path)?;
        let reader: Box<dyn BufRead> = if path.extension().is_some_and(|e| e == "gz") {
            Box::new(BufReader::new(MultiGzDecoder::new(file)))
        } else {
            Box::new(BufReader::new(file))
        };
        Ok(Self::new(reader))
    }
}

impl<R: BufRead> PslReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_no: 0,
            buf: String::new(),
        }
    }
}

impl<R: BufRead> Iterator for PslReader<R> {
    type Item = Result<PslRecord, ProbeMapError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {
                    self.line_no += 1;
                    if self.buf.trim().is_empty() || is_header(&self.buf) {
                        continue;
                    }
                    let line_no = self.line_no;
                    return Some(PslRecord::parse_line(&self.buf).map_err(|e| {
                        record_error(line_no, format!("line {}: {}", line_no, e))
                    }));
                }
                Err(e) => return Some(Err(e.into())),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const LINE: &str = "95\t3\t0\t0\t1\t2\t1\t150\t+\tprobe1\t100\t0\t100\tchr7\t159138663\t1000\t1250\t2\t50,50,\t0,50,\t1000,1200,";

    #[test]
    fn test_parse_line() {
        let rec = PslRecord::parse_line(LINE).unwrap();
        assert_eq!(rec.matches, 95);
        assert_eq!(rec.q_name, "probe1");
        assert_eq!(rec.t_name, "chr7");
        assert_eq!(rec.block_count, 2);
        assert_eq!(rec.t_starts, "1000,1200,");
    }

    #[test]
    fn test_to_hit() {
        let rec = PslRecord::parse_line(LINE).unwrap();
        let hit = rec.to_hit(Arc::new(rec.query_sequence())).unwrap();
        assert_eq!(hit.target_chromosome, "7");
        assert_eq!(hit.block_starts, vec![1000, 1200]);
        assert_eq!(hit.block_sizes, vec![50, 50]);
        assert_eq!(hit.strand, Some(Strand::Plus));
        // (95 - 3 - 1 - 1) / 100
        assert!((hit.score - 0.90).abs() < 1e-9);
        assert!((hit.identity - 95.0 / 98.0).abs() < 1e-9);
    }

    #[test]
    fn test_malformed_blocks_fail_hit() {
        let mut rec = PslRecord::parse_line(LINE).unwrap();
        rec.t_starts = "1000,abc,".to_string();
        let err = rec.to_hit(Arc::new(rec.query_sequence())).unwrap_err();
        assert!(err.is_hit_local());
    }

    #[test]
    fn test_block_count_mismatch() {
        let mut rec = PslRecord::parse_line(LINE).unwrap();
        rec.block_count = 3;
        assert!(rec.to_hit(Arc::new(rec.query_sequence())).is_err());
    }

    #[test]
    fn test_translated_strand() {
        let mut rec = PslRecord::parse_line(LINE).unwrap();
        rec.strand = "+-".to_string();
        let hit = rec.to_hit(Arc::new(rec.query_sequence())).unwrap();
        assert_eq!(hit.strand, Some(Strand::Minus));
    }

    #[test]
    fn test_short_line() {
        assert!(PslRecord::parse_line("1\t2\t3").is_err());
    }

    #[test]
    fn test_reader_skips_header() {
        let text = format!(
            "psLayout version 3\n\nmatch\tmis-\trep.\n     \tmatch\tmatch\n---------------\n{}\n",
            LINE
        );
        let records: Vec<_> = PslReader::new(Cursor::new(text)).collect();
        assert_eq!(records.len(), 1);
        assert!(records[0].is_ok());
    }

    #[test]
    fn test_reader_reports_line_number() {
        let text = format!("{}\n7\tbad\n", LINE);
        let records: Vec<_> = PslReader::new(Cursor::new(text)).collect();
        assert_eq!(records.len(), 2);
        assert!(matches!(records[1], Err(ProbeMapError::Parse { pos: 2, .. })));
    }

    #[test]
    fn test_to_hits_shares_query() {
        let rec = PslRecord::parse_line(LINE).unwrap();
        let mut known = HashMap::new();
        known.insert(
            "probe1".to_string(),
            QuerySequence::new("probe1", 100).with_fraction_repeats(0.5),
        );
        let hits = to_hits(&[rec.clone(), rec], &known);
        let a = hits[0].as_ref().unwrap();
        let b = hits[1].as_ref().unwrap();
        assert!(Arc::ptr_eq(&a.query, &b.query));
        assert_eq!(a.query.fraction_repeats, Some(0.5));
    }
}
