//! Tabular collaborator: cells, row index, frames, parsing and writing.

mod frame;
mod index;
mod parser;
mod value;
mod writer;

pub use frame::{DataFrame, Series, Tabular};
pub use index::{Index, IndexLevel};
pub use parser::{detect_delimiter, Parser, ParserConfig};
pub use value::Value;
pub use writer::{Writer, WriterConfig};
