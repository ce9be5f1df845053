//! MetaCSV: documentation-aware tabular data.
//!
//! A MetaCSV file is a CSV body preceded by a YAML metadata block holding
//! free-form attributes, per-field variable descriptions and a coordinate
//! dependency graph describing how index fields relate to one another.
//!
//! # Core Principles
//!
//! - **Validated coordinates**: declared coordinates and index levels are kept
//!   in bijection; cycles and dangling dependencies are rejected eagerly
//! - **Exact round trips**: a written file reads back to equal metadata
//! - **Explicit restructuring**: assigning coordinates may move columns into
//!   the index, and says so
//!
//! # Example
//!
//! ```no_run
//! use metacsv::{read_csv, ReadOptions};
//!
//! let container = read_csv("population.csv", &ReadOptions::default()).unwrap();
//!
//! println!("{}", container);
//! let dataset = container.to_dataset().unwrap();
//! println!("Dimensions: {:?}", dataset.dims());
//! ```

pub mod assertions;
pub mod coords;
pub mod error;
pub mod header;
pub mod io;
pub mod materialize;
pub mod metadata;
pub mod table;

pub use assertions::{Assertions, Expectation};
pub use coords::{CoordinateDeclaration, CoordinateGraph, Dependency};
pub use error::{MetaCsvError, Result};
pub use io::{
    read_csv, read_csv_from_reader, read_csv_from_str, read_header, read_series, to_csv_string,
    write_csv, write_csv_to, write_header, ReadOptions, WriteOptions,
};
pub use materialize::{DataArray, Dataset, Materialized, Variable};
pub use metadata::{Attributes, Metadata, MetadataContainer, Variables};
pub use table::{DataFrame, Index, IndexLevel, Series, Tabular, Value};
