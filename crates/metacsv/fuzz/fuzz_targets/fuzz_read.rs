//! Fuzz target for full reads: decode, parse and coordinate reconciliation.

#![no_main]

use libfuzzer_sys::fuzz_target;
use metacsv::{read_csv_from_str, ReadOptions};

fuzz_target!(|data: &[u8]| {
    if data.len() > 100_000 {
        return;
    }

    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(container) = read_csv_from_str(text, &ReadOptions::default()) {
            let _ = container.to_xarray();
        }
    }
});
