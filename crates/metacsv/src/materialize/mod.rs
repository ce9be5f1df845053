//! Expansion of indexed tables into named-dimension arrays.
//!
//! Every base coordinate becomes a dimension whose labels are the distinct
//! index values in order of first appearance. Derived coordinates become
//! coordinate variables over the dimensions of their base dependencies. Each
//! data column becomes a variable over all dimensions; combinations that do
//! not occur in the table are filled with [`Value::Null`].
//!
//! Collapsing is checked: rows sharing a key must agree on the value being
//! collapsed, compared exactly.

mod array;

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use indexmap::IndexMap;
use ndarray::{ArrayD, Axis, IxDyn};
use serde_yaml::Mapping;

use crate::coords::{CoordinateDeclaration, CoordinateGraph};
use crate::error::{MetaCsvError, Result};
use crate::metadata::MetadataContainer;
use crate::table::{Index, Tabular, Value};

pub use array::{DataArray, Dataset, Variable};

/// Dimension name used when frame columns are stacked.
pub const DEFAULT_COLUMN_DIM: &str = "coldim_0";

/// Result of [`MetadataContainer::to_xarray`].
#[derive(Debug, Clone, PartialEq)]
pub enum Materialized {
    DataArray(DataArray),
    Dataset(Dataset),
}

/// Labels of one dimension.
struct Dimension {
    name: String,
    level: usize,
    labels: Vec<Value>,
    lookup: HashMap<Value, usize>,
}

/// Coordinate graph and dimensions resolved against one table index.
struct Layout<'a> {
    index: &'a Index,
    graph: CoordinateGraph,
    levels: HashMap<String, usize>,
    dims: Vec<Dimension>,
}

impl<'a> Layout<'a> {
    fn new<T: Tabular>(container: &'a MetadataContainer<T>) -> Result<Self> {
        let index = container.table().index();

        // Unset coordinates: every level is a base coordinate, named locally
        let names: Vec<String> = match index.names().as_slice() {
            [None] => vec!["index".to_string()],
            names => names
                .iter()
                .enumerate()
                .map(|(i, n)| n.map(String::from).unwrap_or_else(|| format!("level_{}", i)))
                .collect(),
        };
        let graph = match container.coords() {
            Some(graph) => graph.clone(),
            None => CoordinateGraph::parse(&CoordinateDeclaration::Names(names.clone()))?,
        };

        let levels: HashMap<String, usize> = names
            .into_iter()
            .enumerate()
            .map(|(i, n)| (n, i))
            .collect();
        if let Some(missing) = graph.coordinates().find(|c| !levels.contains_key(*c)) {
            return Err(MetaCsvError::CoordinateMismatch {
                declared: vec![missing.to_string()],
                index: levels.keys().cloned().collect(),
            });
        }

        let dims = graph
            .base_coordinates()
            .iter()
            .map(|name| {
                let level = levels[name];
                let mut labels = Vec::new();
                let mut lookup = HashMap::new();
                for value in &index.levels()[level].values {
                    if let Entry::Vacant(slot) = lookup.entry(value.clone()) {
                        slot.insert(labels.len());
                        labels.push(value.clone());
                    }
                }
                Dimension {
                    name: name.clone(),
                    level,
                    labels,
                    lookup,
                }
            })
            .collect();

        Ok(Self {
            index,
            graph,
            levels,
            dims,
        })
    }

    fn dim_sizes(&self) -> IndexMap<String, usize> {
        self.dims
            .iter()
            .map(|d| (d.name.clone(), d.labels.len()))
            .collect()
    }

    /// Scatter row values onto the given dimensions, checking each cell is
    /// written with a single value.
    fn collapse(&self, name: &str, values: &[Value], dims: &[&Dimension], attrs: Mapping) -> Result<Variable> {
        let shape: Vec<usize> = dims.iter().map(|d| d.labels.len()).collect();
        let mut data = ArrayD::from_elem(IxDyn(&shape), Value::Null);
        let mut written: HashMap<Vec<usize>, usize> = HashMap::new();

        for (row, value) in values.iter().enumerate() {
            let position: Vec<usize> = dims
                .iter()
                .map(|d| d.lookup[&self.index.levels()[d.level].values[row]])
                .collect();

            match written.entry(position) {
                Entry::Occupied(first) => {
                    if values[*first.get()] != *value {
                        let key: Vec<String> = dims
                            .iter()
                            .zip(first.key())
                            .map(|(d, &p)| d.labels[p].to_string())
                            .collect();
                        return Err(MetaCsvError::UniquenessViolation {
                            name: name.to_string(),
                            key: key.join(","),
                        });
                    }
                }
                Entry::Vacant(slot) => {
                    data[IxDyn(slot.key())] = value.clone();
                    slot.insert(row);
                }
            }
        }

        Variable::new(dims.iter().map(|d| d.name.clone()).collect(), data, attrs)
    }

    /// Base coordinate labels and derived coordinate variables.
    fn coordinates<T: Tabular>(&self, container: &MetadataContainer<T>) -> Result<IndexMap<String, Variable>> {
        let mut coords = IndexMap::new();

        for dim in &self.dims {
            let data = ArrayD::from_shape_vec(IxDyn(&[dim.labels.len()]), dim.labels.clone())?;
            let attrs = field_attrs(container, &dim.name);
            coords.insert(dim.name.clone(), Variable::new(vec![dim.name.clone()], data, attrs)?);
        }

        for name in self.graph.coordinates() {
            if self.graph.is_base(name) {
                continue;
            }
            let bases = self.graph.base_dependencies(name);
            let dims: Vec<&Dimension> = self
                .dims
                .iter()
                .filter(|d| bases.is_some_and(|b| b.contains(&d.name)))
                .collect();
            let values = &self.index.levels()[self.levels[name]].values;
            let variable = self.collapse(name, values, &dims, field_attrs(container, name))?;
            coords.insert(name.to_string(), variable);
        }

        Ok(coords)
    }

    fn all_dims(&self) -> Vec<&Dimension> {
        self.dims.iter().collect()
    }
}

fn field_attrs<T: Tabular>(container: &MetadataContainer<T>, name: &str) -> Mapping {
    container.variables().field_attrs(name).cloned().unwrap_or_default()
}

impl<T: Tabular> MetadataContainer<T> {
    /// Series become a [`DataArray`], frames a [`Dataset`].
    pub fn to_xarray(&self) -> Result<Materialized> {
        match self.table().ndim() {
            1 => self.to_dataarray().map(Materialized::DataArray),
            2 => self.to_dataset().map(Materialized::Dataset),
            n => Err(MetaCsvError::UnsupportedArity(n)),
        }
    }

    /// One data variable per column; a series gives a single variable.
    pub fn to_dataset(&self) -> Result<Dataset> {
        check_arity(self.table().ndim())?;
        let layout = Layout::new(self)?;
        let dims = layout.all_dims();

        let mut dataset = Dataset::new(layout.dim_sizes(), self.attrs().to_yaml());
        for (name, variable) in layout.coordinates(self)? {
            dataset.insert_coord(name, variable)?;
        }
        for column in self.table().column_names() {
            let values = self.table().column(column).unwrap_or(&[]);
            let variable = layout.collapse(column, values, &dims, field_attrs(self, column))?;
            dataset.insert_var(column, variable)?;
        }

        log::debug!(
            "materialized dataset: dims {:?}, {} variables",
            dataset.dims(),
            dataset.data_vars().len()
        );
        Ok(dataset)
    }

    /// A single array. Frame columns are stacked along a trailing dimension
    /// named after the column axis, or `coldim_0`.
    pub fn to_dataarray(&self) -> Result<DataArray> {
        let ndim = self.table().ndim();
        check_arity(ndim)?;
        let layout = Layout::new(self)?;
        let dims = layout.all_dims();
        let mut coords = layout.coordinates(self)?;
        let columns = self.table().column_names();

        if ndim == 1 {
            let name = columns.first().copied().unwrap_or("data");
            let values = self.table().column(name).unwrap_or(&[]);
            let collapsed = layout.collapse(name, values, &dims, Mapping::new())?;
            let variable = Variable::new(
                collapsed.dims().to_vec(),
                collapsed.into_data(),
                self.attrs().to_yaml(),
            )?;
            return Ok(DataArray::new(Some(name.to_string()), variable, coords));
        }

        let column_dim = self.table().columns_name().unwrap_or(DEFAULT_COLUMN_DIM).to_string();
        let mut shape: Vec<usize> = dims.iter().map(|d| d.labels.len()).collect();
        shape.push(columns.len());
        let mut data = ArrayD::from_elem(IxDyn(&shape), Value::Null);

        for (j, column) in columns.iter().enumerate() {
            let values = self.table().column(column).unwrap_or(&[]);
            let collapsed = layout.collapse(column, values, &dims, Mapping::new())?;
            data.index_axis_mut(Axis(dims.len()), j).assign(collapsed.data());
        }

        let labels: Vec<Value> = columns.iter().map(|c| Value::from(*c)).collect();
        let label_data = ArrayD::from_shape_vec(IxDyn(&[labels.len()]), labels)?;
        coords.insert(
            column_dim.clone(),
            Variable::new(vec![column_dim.clone()], label_data, Mapping::new())?,
        );

        let mut dim_names: Vec<String> = dims.iter().map(|d| d.name.clone()).collect();
        dim_names.push(column_dim);
        let variable = Variable::new(dim_names, data, self.attrs().to_yaml())?;
        Ok(DataArray::new(None, variable, coords))
    }
}

fn check_arity(ndim: usize) -> Result<()> {
    match ndim {
        1 | 2 => Ok(()),
        n => Err(MetaCsvError::UnsupportedArity(n)),
    }
}
