//! Fuzz target for the metadata block decoder.
//!
//! The decoder must never panic, and any block it accepts must split into
//! metadata without panicking either.

#![no_main]

use libfuzzer_sys::fuzz_target;
use metacsv::{header, Metadata};

fuzz_target!(|data: &[u8]| {
    if data.len() > 100_000 {
        return;
    }

    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(decoded) = header::decode(text) {
        if let Some(mapping) = decoded.header {
            let _ = Metadata::from_header(mapping);
        }
    }
});
