//! Named-dimension arrays produced by materialization.

use std::fmt;

use indexmap::IndexMap;
use ndarray::ArrayD;
use serde_yaml::Mapping;

use crate::error::{MetaCsvError, Result};
use crate::table::Value;

/// An n-dimensional array with named dimensions and attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    dims: Vec<String>,
    data: ArrayD<Value>,
    attrs: Mapping,
}

impl Variable {
    pub fn new(dims: Vec<String>, data: ArrayD<Value>, attrs: Mapping) -> Result<Self> {
        if dims.len() != data.ndim() {
            return Err(MetaCsvError::Shape(format!(
                "{} dimension names for a {}-dimensional array",
                dims.len(),
                data.ndim()
            )));
        }
        Ok(Self { dims, data, attrs })
    }

    pub fn dims(&self) -> &[String] {
        &self.dims
    }

    pub fn data(&self) -> &ArrayD<Value> {
        &self.data
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn attrs(&self) -> &Mapping {
        &self.attrs
    }

    pub fn attrs_mut(&mut self) -> &mut Mapping {
        &mut self.attrs
    }

    /// Values along a one-dimensional variable, in order.
    pub fn values(&self) -> Vec<&Value> {
        self.data.iter().collect()
    }

    pub(crate) fn into_data(self) -> ArrayD<Value> {
        self.data
    }
}

/// A single labeled array with its coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct DataArray {
    name: Option<String>,
    variable: Variable,
    coords: IndexMap<String, Variable>,
}

impl DataArray {
    pub fn new(name: Option<String>, variable: Variable, coords: IndexMap<String, Variable>) -> Self {
        Self {
            name,
            variable,
            coords,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn dims(&self) -> &[String] {
        self.variable.dims()
    }

    pub fn shape(&self) -> &[usize] {
        self.variable.shape()
    }

    pub fn data(&self) -> &ArrayD<Value> {
        self.variable.data()
    }

    pub fn attrs(&self) -> &Mapping {
        self.variable.attrs()
    }

    pub fn coords(&self) -> &IndexMap<String, Variable> {
        &self.coords
    }

    pub fn coord(&self, name: &str) -> Option<&Variable> {
        self.coords.get(name)
    }
}

/// A collection of data variables sharing dimensions and coordinates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    dims: IndexMap<String, usize>,
    coords: IndexMap<String, Variable>,
    data_vars: IndexMap<String, Variable>,
    attrs: Mapping,
}

impl Dataset {
    pub fn new(dims: IndexMap<String, usize>, attrs: Mapping) -> Self {
        Self {
            dims,
            coords: IndexMap::new(),
            data_vars: IndexMap::new(),
            attrs,
        }
    }

    /// Dimension names and sizes.
    pub fn dims(&self) -> &IndexMap<String, usize> {
        &self.dims
    }

    pub fn coords(&self) -> &IndexMap<String, Variable> {
        &self.coords
    }

    pub fn coord(&self, name: &str) -> Option<&Variable> {
        self.coords.get(name)
    }

    pub fn data_vars(&self) -> &IndexMap<String, Variable> {
        &self.data_vars
    }

    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.data_vars.get(name)
    }

    pub fn attrs(&self) -> &Mapping {
        &self.attrs
    }

    pub fn insert_coord(&mut self, name: impl Into<String>, variable: Variable) -> Result<()> {
        self.check_dims(&variable)?;
        self.coords.insert(name.into(), variable);
        Ok(())
    }

    pub fn insert_var(&mut self, name: impl Into<String>, variable: Variable) -> Result<()> {
        self.check_dims(&variable)?;
        self.data_vars.insert(name.into(), variable);
        Ok(())
    }

    fn check_dims(&self, variable: &Variable) -> Result<()> {
        for (dim, &len) in variable.dims().iter().zip(variable.shape()) {
            match self.dims.get(dim) {
                Some(&expected) if expected == len => {}
                Some(&expected) => {
                    return Err(MetaCsvError::Shape(format!(
                        "dimension '{}' has length {}, expected {}",
                        dim, len, expected
                    )));
                }
                None => return Err(MetaCsvError::Shape(format!("unknown dimension '{}'", dim))),
            }
        }
        Ok(())
    }
}

fn write_variables(
    f: &mut fmt::Formatter<'_>,
    variables: &IndexMap<String, Variable>,
    dims: &IndexMap<String, usize>,
) -> fmt::Result {
    for (name, var) in variables {
        let marker = if dims.contains_key(name) { "*" } else { " " };
        write!(f, "\n  {} {: <10} ({})", marker, name, var.dims().join(", "))?;
    }
    Ok(())
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<metacsv.Dataset>")?;
        let dims: Vec<String> = self.dims.iter().map(|(d, n)| format!("{}: {}", d, n)).collect();
        write!(f, "\nDimensions:  ({})", dims.join(", "))?;
        write!(f, "\nCoordinates:")?;
        write_variables(f, &self.coords, &self.dims)?;
        write!(f, "\nData variables:")?;
        write_variables(f, &self.data_vars, &self.dims)?;
        if !self.attrs.is_empty() {
            write!(f, "\nAttributes:")?;
            for (k, v) in &self.attrs {
                let key = k.as_str().unwrap_or_default();
                let value = serde_json::to_string(v).unwrap_or_default();
                write!(f, "\n    {}: {}", key, value.trim_matches('"'))?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for DataArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dims: Vec<String> = self
            .dims()
            .iter()
            .zip(self.shape())
            .map(|(d, n)| format!("{}: {}", d, n))
            .collect();
        write!(
            f,
            "<metacsv.DataArray '{}' ({})>",
            self.name().unwrap_or_default(),
            dims.join(", ")
        )?;
        write!(f, "\nCoordinates:")?;
        let own: IndexMap<String, usize> = self
            .dims()
            .iter()
            .cloned()
            .zip(self.shape().iter().copied())
            .collect();
        write_variables(f, &self.coords, &own)
    }
}
