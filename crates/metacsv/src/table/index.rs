//! Row index with named levels.

use crate::error::{MetaCsvError, Result};

use super::value::Value;

/// One level of a row index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexLevel {
    /// Level name (None for unlabeled levels).
    pub name: Option<String>,
    /// One label per row.
    pub values: Vec<Value>,
}

impl IndexLevel {
    pub fn new(name: Option<String>, values: Vec<Value>) -> Self {
        Self { name, values }
    }
}

/// A (possibly multi-level) row index.
///
/// A freshly parsed table carries a positional index: a single unnamed level
/// holding `0..n`. It is replaced rather than extended when columns are
/// promoted, and is not written back out.
#[derive(Debug, Clone, PartialEq)]
pub struct Index {
    levels: Vec<IndexLevel>,
    positional: bool,
}

impl Index {
    /// Create the default positional index for `len` rows.
    pub fn range(len: usize) -> Self {
        let values = (0..len as i64).map(Value::Int).collect();
        Self {
            levels: vec![IndexLevel::new(None, values)],
            positional: true,
        }
    }

    /// Create an index from explicit levels.
    pub fn from_levels(levels: Vec<IndexLevel>) -> Result<Self> {
        if levels.is_empty() {
            return Err(MetaCsvError::Shape("an index needs at least one level".to_string()));
        }
        let len = levels[0].values.len();
        if let Some(bad) = levels.iter().find(|l| l.values.len() != len) {
            return Err(MetaCsvError::Shape(format!(
                "index level {:?} has {} labels, expected {}",
                bad.name,
                bad.values.len(),
                len
            )));
        }
        Ok(Self {
            levels,
            positional: false,
        })
    }

    /// Whether this is the default positional index.
    pub fn is_positional(&self) -> bool {
        self.positional
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.levels.first().map(|l| l.values.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of levels.
    pub fn nlevels(&self) -> usize {
        self.levels.len()
    }

    pub fn levels(&self) -> &[IndexLevel] {
        &self.levels
    }

    /// Level names in order, None for unlabeled levels.
    pub fn names(&self) -> Vec<Option<&str>> {
        self.levels.iter().map(|l| l.name.as_deref()).collect()
    }

    /// Names of the labeled levels only.
    pub fn named_levels(&self) -> Vec<&str> {
        self.levels.iter().filter_map(|l| l.name.as_deref()).collect()
    }

    /// Rename every level.
    ///
    /// Naming a positional index makes it a real level that is written out.
    pub fn set_names(&mut self, names: Vec<Option<String>>) -> Result<()> {
        if names.len() != self.levels.len() {
            return Err(MetaCsvError::Shape(format!(
                "got {} names for an index with {} levels",
                names.len(),
                self.levels.len()
            )));
        }
        for (level, name) in self.levels.iter_mut().zip(names) {
            level.name = name;
        }
        if self.levels.iter().any(|l| l.name.is_some()) {
            self.positional = false;
        }
        Ok(())
    }

    /// Position of a named level.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.levels.iter().position(|l| l.name.as_deref() == Some(name))
    }

    /// Labels of a named level.
    pub fn level_values(&self, name: &str) -> Option<&[Value]> {
        self.position(name).map(|i| self.levels[i].values.as_slice())
    }

    /// Append a level, replacing a positional index.
    pub fn push_level(&mut self, level: IndexLevel) -> Result<()> {
        if level.values.len() != self.len() {
            return Err(MetaCsvError::Shape(format!(
                "level {:?} has {} labels, expected {}",
                level.name,
                level.values.len(),
                self.len()
            )));
        }
        if self.positional {
            self.levels.clear();
            self.positional = false;
        }
        self.levels.push(level);
        Ok(())
    }

    /// Remove a named level. Removing the last level leaves a positional index.
    pub fn remove_level(&mut self, name: &str) -> Option<IndexLevel> {
        let pos = self.position(name)?;
        let len = self.len();
        let level = self.levels.remove(pos);
        if self.levels.is_empty() {
            *self = Index::range(len);
        }
        Some(level)
    }
}
