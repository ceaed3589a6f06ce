//! Fuzz target for PSL line parsing and hit conversion
//!
//! Arbitrary text goes through the record parser and, when that succeeds,
//! through block decoding into an alignment hit.

#![no_main]

use ferro_probemap::psl::PslRecord;
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        if input.len() > 2000 {
            return;
        }

        // Neither step should panic on any input
        if let Ok(record) = PslRecord::parse_line(input) {
            let _ = record.to_hit(Arc::new(record.query_sequence()));
        }
    }
});
