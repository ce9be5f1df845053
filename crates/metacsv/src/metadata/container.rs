//! Metadata bound to a table, with coordinate reconciliation.

use std::collections::HashSet;
use std::fmt;

use serde_yaml::{Mapping, Value as YamlValue};

use crate::coords::{CoordinateDeclaration, CoordinateGraph};
use crate::error::{MetaCsvError, Result};
use crate::table::{DataFrame, Series, Tabular, Value};

use super::facets::{Attributes, Variables};

/// Header key holding the coordinate declaration.
pub const COORDS_KEY: &str = "coords";
/// Header key holding per-field documentation.
pub const VARIABLES_KEY: &str = "variables";

/// Attributes, variables and coordinates that are not bound to a table.
///
/// Coordinates set here are parsed and checked for cycles, but not reconciled
/// against any index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    pub attrs: Attributes,
    pub variables: Variables,
    coords: Option<CoordinateGraph>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Split a decoded header mapping into its facets.
    ///
    /// `coords` and `variables` are removed; everything else becomes an attribute.
    pub fn from_header(mut mapping: Mapping) -> Result<Self> {
        let coords = mapping.remove(COORDS_KEY);
        let variables = mapping.remove(VARIABLES_KEY);

        let mut metadata = Metadata::new();
        metadata.attrs = mapping_to_facet(mapping, "attributes")?.into_iter().collect();

        if let Some(value) = variables {
            let entries = match value {
                YamlValue::Null => Mapping::new(),
                YamlValue::Mapping(m) => m,
                other => {
                    return Err(MetaCsvError::MalformedHeader(format!(
                        "'variables' must be a mapping, got {:?}",
                        other
                    )));
                }
            };
            metadata.variables = mapping_to_facet(entries, "variables")?.into_iter().collect();
        }

        if let Some(value) = coords {
            metadata.set_coords(&CoordinateDeclaration::from_yaml(&value)?)?;
        }

        Ok(metadata)
    }

    /// The header mapping: attributes, then `coords`, then `variables`.
    ///
    /// Empty facets are omitted. Attributes may not use the reserved
    /// `coords` and `variables` keys, since they would read back as facets.
    pub fn to_header(&self) -> Result<Mapping> {
        if let Some(key) = [COORDS_KEY, VARIABLES_KEY]
            .into_iter()
            .find(|k| self.attrs.contains_key(k))
        {
            return Err(MetaCsvError::MalformedHeader(format!(
                "attribute key '{}' is reserved for the metadata block",
                key
            )));
        }

        let mut mapping = self.attrs.to_yaml();
        if let Some(graph) = self.coords.as_ref().filter(|g| !g.is_empty()) {
            mapping.insert(COORDS_KEY.into(), graph.to_declaration().to_yaml());
        }
        if !self.variables.is_empty() {
            mapping.insert(
                VARIABLES_KEY.into(),
                YamlValue::Mapping(self.variables.to_yaml()),
            );
        }
        Ok(mapping)
    }

    pub fn coords(&self) -> Option<&CoordinateGraph> {
        self.coords.as_ref()
    }

    /// Parse and store coordinates. An empty declaration clears them.
    pub fn set_coords(&mut self, declaration: &CoordinateDeclaration) -> Result<()> {
        self.coords = if declaration.is_empty() {
            None
        } else {
            Some(CoordinateGraph::parse(declaration)?)
        };
        Ok(())
    }

    pub fn clear_coords(&mut self) {
        self.coords = None;
    }

    /// True when attributes, coordinates and variables are all empty.
    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty() && self.coords.as_ref().is_none_or(|g| g.is_empty()) && self.variables.is_empty()
    }
}

fn mapping_to_facet(mapping: Mapping, what: &str) -> Result<Vec<(String, YamlValue)>> {
    mapping
        .into_iter()
        .map(|(k, v)| match k {
            YamlValue::String(s) => Ok((s, v)),
            YamlValue::Number(n) => Ok((n.to_string(), v)),
            YamlValue::Bool(b) => Ok((b.to_string(), v)),
            other => Err(MetaCsvError::MalformedHeader(format!(
                "{} keys must be scalars, got {:?}",
                what, other
            ))),
        })
        .collect()
}

/// A table together with its documentation metadata.
///
/// Assigning coordinates may restructure the table: declared coordinates
/// found among the data columns are moved into the index, and deriving
/// coordinates names unlabeled index levels in place.
#[derive(Debug, Clone)]
pub struct MetadataContainer<T> {
    table: T,
    metadata: Metadata,
}

impl<T: Tabular> MetadataContainer<T> {
    /// Wrap a bare table with empty metadata.
    pub fn new(table: T) -> Self {
        Self {
            table,
            metadata: Metadata::new(),
        }
    }

    /// Wrap a table with metadata, reconciling any coordinates against it.
    pub fn with_metadata(table: T, mut metadata: Metadata) -> Result<Self> {
        let coords = metadata.coords.take();
        let mut container = Self { table, metadata };
        if let Some(graph) = coords {
            container.set_coordinates(&graph.to_declaration())?;
        }
        Ok(container)
    }

    pub fn table(&self) -> &T {
        &self.table
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn into_parts(self) -> (T, Metadata) {
        (self.table, self.metadata)
    }

    pub fn attrs(&self) -> &Attributes {
        &self.metadata.attrs
    }

    pub fn attrs_mut(&mut self) -> &mut Attributes {
        &mut self.metadata.attrs
    }

    pub fn set_attrs(&mut self, attrs: Attributes) {
        self.metadata.attrs = attrs;
    }

    pub fn variables(&self) -> &Variables {
        &self.metadata.variables
    }

    pub fn variables_mut(&mut self) -> &mut Variables {
        &mut self.metadata.variables
    }

    pub fn set_variables(&mut self, variables: Variables) {
        self.metadata.variables = variables;
    }

    pub fn coords(&self) -> Option<&CoordinateGraph> {
        self.metadata.coords.as_ref()
    }

    /// Base coordinates, empty when coordinates are unset.
    pub fn base_coords(&self) -> &[String] {
        self.coords().map(|g| g.base_coordinates()).unwrap_or(&[])
    }

    pub fn clear_coordinates(&mut self) {
        self.metadata.coords = None;
    }

    /// Assign coordinates, promoting columns into the index as needed.
    ///
    /// Declared coordinates present as columns but not as index levels are
    /// appended to the index in declaration order. Afterwards every declared
    /// coordinate must be an index level and every index level a declared
    /// coordinate. On error neither the table nor the metadata change.
    pub fn set_coordinates(&mut self, declaration: &CoordinateDeclaration) -> Result<()> {
        if declaration.is_empty() {
            self.metadata.coords = None;
            return Ok(());
        }

        let graph = CoordinateGraph::parse(declaration)?;

        let index = self.table.index();
        let mut prospective: Vec<Option<String>> = if index.is_positional() {
            Vec::new()
        } else {
            index.names().into_iter().map(|n| n.map(String::from)).collect()
        };

        let columns = self.table.column_names();
        let to_promote: Vec<String> = graph
            .coordinates()
            .filter(|c| !prospective.iter().any(|p| p.as_deref() == Some(*c)))
            .filter(|c| columns.contains(c))
            .map(String::from)
            .collect();
        prospective.extend(to_promote.iter().cloned().map(Some));
        if prospective.is_empty() {
            // Nothing promoted: the positional level stays
            prospective.push(None);
        }

        check_bijection(&graph, &prospective)?;

        if !to_promote.is_empty() {
            log::debug!("promoting columns {:?} into the index", to_promote);
            self.table.set_index(&to_promote)?;
        }

        self.metadata.coords = Some(graph);
        Ok(())
    }

    /// Build coordinates from the table's current index level names.
    ///
    /// Unlabeled levels are named in place on the table: a single unlabeled
    /// level becomes `index`, otherwise level `i` becomes `level_<i>`.
    pub fn derive_coordinates(&mut self) -> Result<()> {
        let names: Vec<Option<String>> = self
            .table
            .index()
            .names()
            .into_iter()
            .map(|n| n.map(String::from))
            .collect();

        let resolved: Vec<String> = if names.len() == 1 && names[0].is_none() {
            vec!["index".to_string()]
        } else {
            names
                .iter()
                .enumerate()
                .map(|(i, n)| n.clone().unwrap_or_else(|| format!("level_{}", i)))
                .collect()
        };

        if names.iter().any(|n| n.is_none()) {
            log::debug!("naming unlabeled index levels: {:?}", resolved);
            self.table
                .index_mut()
                .set_names(resolved.iter().cloned().map(Some).collect())?;
        }

        self.set_coordinates(&CoordinateDeclaration::Names(resolved))
    }

    /// Merge a partial declaration into the current coordinates.
    ///
    /// Previously declared coordinates that are no longer index levels or
    /// columns are dropped before merging; the result is validated as in
    /// [`MetadataContainer::set_coordinates`].
    pub fn update_coordinates(&mut self, partial: &CoordinateDeclaration) -> Result<()> {
        let mut current = self
            .coords()
            .map(|g| g.to_declaration().into_map())
            .unwrap_or_default();

        let available: HashSet<&str> = self
            .table
            .index()
            .named_levels()
            .into_iter()
            .chain(self.table.column_names())
            .collect();

        let stale: Vec<String> = current
            .keys()
            .filter(|k| !available.contains(k.as_str()))
            .cloned()
            .collect();
        for name in &stale {
            log::warn!("dropping stale coordinate '{}'", name);
            current.shift_remove(name);
        }

        current.extend(partial.clone().into_map());
        self.set_coordinates(&CoordinateDeclaration::Map(current))
    }
}

impl MetadataContainer<DataFrame> {
    /// Turn a single-column frame into a series, keeping all metadata.
    pub fn squeeze(self) -> Result<MetadataContainer<Series>> {
        let names: Vec<String> = self.table.column_names().into_iter().map(String::from).collect();
        let [name] = names.as_slice() else {
            return Err(MetaCsvError::Shape(format!(
                "cannot squeeze a frame with {} columns",
                names.len()
            )));
        };
        let series = self.table.into_series(name)?;
        Ok(MetadataContainer {
            table: series,
            metadata: self.metadata,
        })
    }
}

fn check_bijection(graph: &CoordinateGraph, index_names: &[Option<String>]) -> Result<()> {
    let declared_in_index = graph
        .coordinates()
        .all(|c| index_names.iter().any(|n| n.as_deref() == Some(c)));
    let index_declared = index_names
        .iter()
        .all(|n| n.as_deref().is_some_and(|n| graph.contains(n)));

    if declared_in_index && index_declared {
        return Ok(());
    }

    Err(MetaCsvError::CoordinateMismatch {
        declared: graph.coordinates().map(String::from).collect(),
        index: index_names
            .iter()
            .map(|n| n.clone().unwrap_or_else(|| "<unnamed>".to_string()))
            .collect(),
    })
}

impl<T: Tabular> PartialEq for MetadataContainer<T> {
    /// Containers compare by metadata and table shape, index and column values.
    fn eq(&self, other: &Self) -> bool {
        self.metadata == other.metadata
            && self.table.index() == other.table.index()
            && self.table.column_names() == other.table.column_names()
            && self
                .table
                .column_names()
                .iter()
                .all(|c| self.table.column(c) == other.table.column(c))
    }
}

/// Preview of unique level labels, cut off at `maxlen` characters.
fn preview(values: &[Value], mut line: String, maxlen: usize) -> String {
    let mut seen = HashSet::new();
    let mut first = true;
    for value in values.iter().filter(|v| seen.insert(*v)) {
        let text = value.to_string();
        if line.len() + text.len() + 5 > maxlen {
            line.push_str("...");
            return line;
        }
        if !first {
            line.push_str(", ");
        }
        line.push_str(&text);
        first = false;
    }
    line
}

impl<T: Tabular> fmt::Display for MetadataContainer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.table.ndim() == 1 { "Series" } else { "DataFrame" };
        write!(
            f,
            "<metacsv.{} ({}, {})>",
            kind,
            self.table.len(),
            self.table.column_names().len()
        )?;

        let index = self.table.index();
        match self.coords() {
            None => write!(f, "\n\n<Empty Coordinates>")?,
            Some(graph) => {
                write!(f, "\n\nCoordinates")?;
                for base in graph.base_coordinates() {
                    let line = format!("  * {: <10} ({}) ", base, base);
                    let values = index.level_values(base).unwrap_or(&[]);
                    write!(f, "\n{}", preview(values, line, 50))?;
                }
                for (name, deps) in graph.dependencies() {
                    let Some(deps) = deps else { continue };
                    let deps: Vec<&str> = deps.iter().map(|d| d.as_str()).collect();
                    let line = format!("    {: <10} ({}) ", name, deps.join(","));
                    let values = index.level_values(name).unwrap_or(&[]);
                    write!(f, "\n{}", preview(values, line, 50))?;
                }
            }
        }

        if !self.variables().is_empty() {
            write!(f, "\n{}", self.variables())?;
        }
        if !self.attrs().is_empty() {
            write!(f, "\n{}", self.attrs())?;
        }
        Ok(())
    }
}
