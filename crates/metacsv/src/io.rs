//! Reading and writing headered CSV files.

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use serde_yaml::Mapping;

use crate::assertions::Assertions;
use crate::coords::CoordinateDeclaration;
use crate::error::{MetaCsvError, Result};
use crate::header;
use crate::metadata::{Metadata, MetadataContainer};
use crate::table::{DataFrame, Parser, ParserConfig, Series, Tabular, Writer, WriterConfig};

/// Options for reading a headered CSV.
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    /// Table parser settings.
    pub parser: ParserConfig,
    /// A metadata-only file merged under the inline block.
    pub header_file: Option<PathBuf>,
    /// Expand `"description [unit]"` variable shorthand.
    pub parse_vars: bool,
    /// Coordinates merged over the decoded ones.
    pub coords: Option<CoordinateDeclaration>,
    /// Checks run against the decoded metadata.
    pub assertions: Option<Assertions>,
}

/// Options for writing a headered CSV.
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    /// Table writer settings.
    pub writer: WriterConfig,
    /// Write the metadata block here instead of before the table body.
    pub header_file: Option<PathBuf>,
}

/// Read a headered CSV file.
pub fn read_csv(path: impl AsRef<Path>, options: &ReadOptions) -> Result<MetadataContainer<DataFrame>> {
    let path = path.as_ref();
    log::info!("reading {}", path.display());
    let text = fs::read_to_string(path).map_err(|e| MetaCsvError::io(path, e))?;
    read_csv_from_str(&text, options)
}

/// Read a headered CSV from any reader.
pub fn read_csv_from_reader<R: Read>(
    mut reader: R,
    options: &ReadOptions,
) -> Result<MetadataContainer<DataFrame>> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    read_csv_from_str(&text, options)
}

/// Read headered CSV text.
pub fn read_csv_from_str(text: &str, options: &ReadOptions) -> Result<MetadataContainer<DataFrame>> {
    let decoded = header::decode(text)?;

    let mut mapping = match &options.header_file {
        Some(path) => read_header_mapping(path)?,
        None => Mapping::new(),
    };
    // Inline keys win over the external file
    if let Some(inline) = decoded.header {
        mapping.extend(inline);
    }

    let mut metadata = Metadata::from_header(mapping)?;
    if options.parse_vars {
        metadata.variables.expand_shorthand();
    }

    if let Some(explicit) = &options.coords {
        let merged = match metadata.coords() {
            Some(graph) => graph.merged(explicit),
            None => explicit.clone(),
        };
        metadata.set_coords(&merged)?;
    }

    if let Some(assertions) = &options.assertions {
        assertions.verify(&metadata)?;
    }

    let table = Parser::with_config(options.parser.clone()).parse_str(decoded.body)?;
    let derive = metadata.coords().is_none() && !table.index().is_positional();

    let mut container = MetadataContainer::with_metadata(table, metadata)?;
    if derive {
        container.derive_coordinates()?;
    }
    Ok(container)
}

/// Read a headered CSV with a single data column as a series.
pub fn read_series(path: impl AsRef<Path>, options: &ReadOptions) -> Result<MetadataContainer<Series>> {
    read_csv(path, options)?.squeeze()
}

/// Write a container to a file.
pub fn write_csv<T: Tabular>(
    container: &MetadataContainer<T>,
    path: impl AsRef<Path>,
    options: &WriteOptions,
) -> Result<()> {
    let path = path.as_ref();
    log::info!("writing {}", path.display());
    let file = fs::File::create(path).map_err(|e| MetaCsvError::io(path, e))?;
    let mut out = std::io::BufWriter::new(file);
    write_csv_to(container, &mut out, options)?;
    out.flush().map_err(|e| MetaCsvError::io(path, e))
}

/// Write a container to any writer.
///
/// The metadata block precedes the table body unless `options.header_file`
/// routes it elsewhere.
pub fn write_csv_to<T: Tabular, W: Write>(
    container: &MetadataContainer<T>,
    mut out: W,
    options: &WriteOptions,
) -> Result<()> {
    match &options.header_file {
        Some(path) => write_header(path, container.metadata())?,
        None => {
            if let Some(block) = header::encode(container.metadata())? {
                out.write_all(block.as_bytes())?;
            }
        }
    }
    Writer::with_config(options.writer.clone()).write(container.table(), out)
}

/// Render a container as headered CSV text.
pub fn to_csv_string<T: Tabular>(container: &MetadataContainer<T>, config: &WriterConfig) -> Result<String> {
    let mut buf = Vec::new();
    let options = WriteOptions {
        writer: config.clone(),
        header_file: None,
    };
    write_csv_to(container, &mut buf, &options)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Write only the metadata block to a file.
///
/// Empty metadata writes an empty file.
pub fn write_header(path: impl AsRef<Path>, metadata: &Metadata) -> Result<()> {
    let path = path.as_ref();
    log::info!("writing header {}", path.display());
    let block = header::encode(metadata)?.unwrap_or_default();
    fs::write(path, block).map_err(|e| MetaCsvError::io(path, e))
}

/// Read a metadata-only file, delimited or bare YAML.
pub fn read_header(path: impl AsRef<Path>) -> Result<Metadata> {
    Metadata::from_header(read_header_mapping(path.as_ref())?)
}

fn read_header_mapping(path: &Path) -> Result<Mapping> {
    log::info!("reading header {}", path.display());
    let text = fs::read_to_string(path).map_err(|e| MetaCsvError::io(path, e))?;
    header::decode_header_only(&text)
}
