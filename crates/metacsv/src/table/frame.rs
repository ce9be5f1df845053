//! Two- and one-axis tables behind the narrow `Tabular` interface.

use indexmap::IndexMap;

use crate::error::{MetaCsvError, Result};

use super::index::{Index, IndexLevel};
use super::value::Value;

/// The surface the metadata layer uses to read and reshape a table.
///
/// Coordinate validation reads index level names and column names; column
/// promotion calls [`Tabular::set_index`]; synthetic naming writes through
/// [`Tabular::index_mut`].
pub trait Tabular {
    /// Number of axes: 1 for a series, 2 for a frame.
    fn ndim(&self) -> usize;

    /// Number of rows.
    fn len(&self) -> usize {
        self.index().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn index(&self) -> &Index;

    fn index_mut(&mut self) -> &mut Index;

    /// Names of the data columns, in order.
    fn column_names(&self) -> Vec<&str>;

    /// Values of a data column.
    fn column(&self, name: &str) -> Option<&[Value]>;

    /// Move the named columns into the index, in the order given.
    ///
    /// Appends to an existing labeled index and replaces a positional one.
    fn set_index(&mut self, names: &[String]) -> Result<()>;

    /// Name of the column axis, if any.
    fn columns_name(&self) -> Option<&str> {
        None
    }
}

impl<T: Tabular + ?Sized> Tabular for &mut T {
    fn ndim(&self) -> usize {
        (**self).ndim()
    }

    fn len(&self) -> usize {
        (**self).len()
    }

    fn index(&self) -> &Index {
        (**self).index()
    }

    fn index_mut(&mut self) -> &mut Index {
        (**self).index_mut()
    }

    fn column_names(&self) -> Vec<&str> {
        (**self).column_names()
    }

    fn column(&self, name: &str) -> Option<&[Value]> {
        (**self).column(name)
    }

    fn set_index(&mut self, names: &[String]) -> Result<()> {
        (**self).set_index(names)
    }

    fn columns_name(&self) -> Option<&str> {
        (**self).columns_name()
    }
}

/// A table of named columns over a shared row index.
#[derive(Debug, Clone, PartialEq)]
pub struct DataFrame {
    index: Index,
    columns: IndexMap<String, Vec<Value>>,
    /// Name of the column axis, used when columns are stacked into a dimension.
    pub columns_name: Option<String>,
}

impl DataFrame {
    /// Create a frame with a positional index.
    pub fn new(columns: Vec<(String, Vec<Value>)>) -> Result<Self> {
        let len = columns.first().map(|(_, v)| v.len()).unwrap_or(0);
        Self::with_index(Index::range(len), columns)
    }

    /// Create a frame over an explicit index.
    pub fn with_index(index: Index, columns: Vec<(String, Vec<Value>)>) -> Result<Self> {
        let mut map = IndexMap::with_capacity(columns.len());
        for (name, values) in columns {
            if values.len() != index.len() {
                return Err(MetaCsvError::Shape(format!(
                    "column '{}' has {} values, expected {}",
                    name,
                    values.len(),
                    index.len()
                )));
            }
            if map.insert(name.clone(), values).is_some() {
                return Err(MetaCsvError::Shape(format!("duplicate column '{}'", name)));
            }
        }
        Ok(Self {
            index,
            columns: map,
            columns_name: None,
        })
    }

    /// Build a frame from header names and rows of raw cell text.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        let mut columns: Vec<(String, Vec<Value>)> = headers
            .into_iter()
            .map(|h| (h, Vec::with_capacity(rows.len())))
            .collect();
        for row in &rows {
            for (col, (_, values)) in columns.iter_mut().enumerate() {
                let cell = row.get(col).map(|s| s.as_str()).unwrap_or("");
                values.push(Value::parse(cell));
            }
        }
        Self::new(columns)
    }

    /// Get the number of data columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Iterate over `(name, values)` pairs.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &[Value])> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Insert or replace a column.
    pub fn insert_column(&mut self, name: impl Into<String>, values: Vec<Value>) -> Result<()> {
        let name = name.into();
        if values.len() != self.index.len() {
            return Err(MetaCsvError::Shape(format!(
                "column '{}' has {} values, expected {}",
                name,
                values.len(),
                self.index.len()
            )));
        }
        self.columns.insert(name, values);
        Ok(())
    }

    /// Remove a column, returning its values.
    pub fn remove_column(&mut self, name: &str) -> Option<Vec<Value>> {
        self.columns.shift_remove(name)
    }

    /// Move named index levels back into (leading) data columns.
    pub fn reset_index(&mut self, names: &[String]) -> Result<()> {
        if let Some(missing) = names.iter().find(|n| self.index.position(n).is_none()) {
            return Err(MetaCsvError::ColumnNotFound(missing.clone()));
        }
        let mut restored = Vec::with_capacity(names.len());
        for name in names {
            let level = self
                .index
                .remove_level(name)
                .ok_or_else(|| MetaCsvError::ColumnNotFound(name.clone()))?;
            restored.push((name.clone(), level.values));
        }
        let rest = std::mem::take(&mut self.columns);
        self.columns = restored.into_iter().chain(rest).collect();
        Ok(())
    }

    /// Take a single column as a series sharing this frame's index.
    pub fn into_series(mut self, name: &str) -> Result<Series> {
        let values = self
            .columns
            .shift_remove(name)
            .ok_or_else(|| MetaCsvError::ColumnNotFound(name.to_string()))?;
        Ok(Series {
            index: self.index,
            name: Some(name.to_string()),
            values,
        })
    }
}

impl Tabular for DataFrame {
    fn ndim(&self) -> usize {
        2
    }

    fn index(&self) -> &Index {
        &self.index
    }

    fn index_mut(&mut self) -> &mut Index {
        &mut self.index
    }

    fn column_names(&self) -> Vec<&str> {
        self.columns.keys().map(|k| k.as_str()).collect()
    }

    fn column(&self, name: &str) -> Option<&[Value]> {
        self.columns.get(name).map(|v| v.as_slice())
    }

    fn set_index(&mut self, names: &[String]) -> Result<()> {
        if let Some(missing) = names.iter().find(|n| !self.columns.contains_key(n.as_str())) {
            return Err(MetaCsvError::ColumnNotFound(missing.clone()));
        }
        for name in names {
            if let Some(values) = self.columns.shift_remove(name.as_str()) {
                self.index.push_level(IndexLevel::new(Some(name.clone()), values))?;
            }
        }
        Ok(())
    }

    fn columns_name(&self) -> Option<&str> {
        self.columns_name.as_deref()
    }
}

/// A single named column over a row index.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    index: Index,
    /// Series name (None when unnamed).
    pub name: Option<String>,
    values: Vec<Value>,
}

impl Series {
    pub fn new(name: Option<String>, index: Index, values: Vec<Value>) -> Result<Self> {
        if values.len() != index.len() {
            return Err(MetaCsvError::Shape(format!(
                "series has {} values, index has {} rows",
                values.len(),
                index.len()
            )));
        }
        Ok(Self {
            index,
            name,
            values,
        })
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Name used for the data field when materialized.
    pub fn field_name(&self) -> &str {
        self.name.as_deref().unwrap_or("data")
    }
}

impl Tabular for Series {
    fn ndim(&self) -> usize {
        1
    }

    fn index(&self) -> &Index {
        &self.index
    }

    fn index_mut(&mut self) -> &mut Index {
        &mut self.index
    }

    fn column_names(&self) -> Vec<&str> {
        vec![self.field_name()]
    }

    fn column(&self, name: &str) -> Option<&[Value]> {
        (name == self.field_name()).then_some(self.values.as_slice())
    }

    fn set_index(&mut self, names: &[String]) -> Result<()> {
        match names.first() {
            None => Ok(()),
            Some(name) => Err(MetaCsvError::Shape(format!(
                "cannot move the values of series '{}' into its own index",
                name
            ))),
        }
    }
}
