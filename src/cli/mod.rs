//! Input tables and output formatting for the `probemap` binary

pub mod format;
pub mod parse;

pub use format::{
    output_association, output_associations, output_error, output_header, AssociationRecord,
    OutputFormat, TSV_COLUMNS,
};
pub use parse::{parse_reporter_line, parse_sequence_line, table_line};
