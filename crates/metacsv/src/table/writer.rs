//! Delimited text writer for tables.

use std::io::Write;

use crate::error::Result;

use super::frame::Tabular;

/// Writer configuration.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Field delimiter.
    pub delimiter: u8,
    /// Digits after the decimal point for floats (None = shortest exact form).
    pub float_precision: Option<usize>,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            delimiter: b',',
            float_precision: None,
        }
    }
}

/// Writes a table body: index levels first, then data columns.
///
/// A positional index is not written.
#[derive(Debug, Clone, Default)]
pub struct Writer {
    config: WriterConfig,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: WriterConfig) -> Self {
        Self { config }
    }

    pub fn write<T: Tabular + ?Sized, W: Write>(&self, table: &T, out: W) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.config.delimiter)
            .from_writer(out);

        let index = table.index();
        let write_index = !index.is_positional();
        let columns = table.column_names();

        let mut header: Vec<String> = Vec::new();
        if write_index {
            header.extend(
                index
                    .names()
                    .into_iter()
                    .map(|n| n.unwrap_or_default().to_string()),
            );
        }
        header.extend(columns.iter().map(|c| c.to_string()));
        writer.write_record(&header)?;

        let column_values: Vec<_> = columns.iter().filter_map(|c| table.column(c)).collect();
        let precision = self.config.float_precision;

        for row in 0..table.len() {
            let mut record: Vec<String> = Vec::with_capacity(header.len());
            if write_index {
                record.extend(
                    index
                        .levels()
                        .iter()
                        .map(|l| l.values[row].to_field(precision)),
                );
            }
            record.extend(column_values.iter().map(|v| v[row].to_field(precision)));
            writer.write_record(&record)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Render a table body to a string.
    pub fn write_to_string<T: Tabular + ?Sized>(&self, table: &T) -> Result<String> {
        let mut buf = Vec::new();
        self.write(table, &mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}
