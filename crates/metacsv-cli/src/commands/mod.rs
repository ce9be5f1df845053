//! CLI command implementations.

pub mod convert;
pub mod header;
pub mod info;
pub mod version;

use std::path::PathBuf;

use metacsv::ReadOptions;

/// Read options for a command's input, with an optional header file.
pub(crate) fn read_options(header: Option<PathBuf>) -> ReadOptions {
    ReadOptions {
        header_file: header,
        ..Default::default()
    }
}
