//! Fuzz target for comma-separated block lists and center-base lookup

#![no_main]

use ferro_probemap::coords::{find_center_base, parse_block_list};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        let Some((starts, sizes)) = input.split_once('|') else {
            return;
        };
        if let (Ok(starts), Ok(sizes)) = (parse_block_list(starts), parse_block_list(sizes)) {
            let _ = find_center_base(&starts, &sizes);
        }
    }
});
