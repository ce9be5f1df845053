//! Admissible input shapes for coordinate declarations.

use indexmap::IndexMap;
use serde_yaml::{Mapping, Value as YamlValue};

use crate::error::{MetaCsvError, Result};

/// Dependencies declared for one coordinate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dependency {
    /// No dependencies: a base coordinate.
    Base,
    /// A single dependency name.
    One(String),
    /// An ordered collection of dependency names.
    Many(Vec<String>),
}

impl Dependency {
    /// Dependency names in declaration order.
    pub fn names(&self) -> &[String] {
        match self {
            Dependency::Base => &[],
            Dependency::One(name) => std::slice::from_ref(name),
            Dependency::Many(names) => names,
        }
    }

    fn to_yaml(&self) -> YamlValue {
        match self {
            Dependency::Base => YamlValue::Null,
            Dependency::One(name) => YamlValue::String(name.clone()),
            Dependency::Many(names) => {
                YamlValue::Sequence(names.iter().cloned().map(YamlValue::String).collect())
            }
        }
    }
}

/// A coordinate declaration as written by a user or decoded from a header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinateDeclaration {
    /// One base coordinate.
    Name(String),
    /// Several base coordinates.
    Names(Vec<String>),
    /// Coordinate name to its dependencies.
    Map(IndexMap<String, Dependency>),
}

impl CoordinateDeclaration {
    /// Resolve a decoded YAML value into one of the three admissible shapes.
    pub fn from_yaml(value: &YamlValue) -> Result<Self> {
        match value {
            YamlValue::Null => Ok(CoordinateDeclaration::Names(Vec::new())),
            YamlValue::Sequence(items) => items
                .iter()
                .map(|v| scalar_name(v, "coordinate list"))
                .collect::<Result<Vec<_>>>()
                .map(CoordinateDeclaration::Names),
            YamlValue::Mapping(mapping) => {
                let mut map = IndexMap::with_capacity(mapping.len());
                for (key, deps) in mapping {
                    let name = scalar_name(key, "coordinate name")?;
                    let dependency = match deps {
                        YamlValue::Null => Dependency::Base,
                        YamlValue::Sequence(items) if items.is_empty() => Dependency::Base,
                        YamlValue::Sequence(items) => Dependency::Many(
                            items
                                .iter()
                                .map(|v| scalar_name(v, "dependency list"))
                                .collect::<Result<Vec<_>>>()?,
                        ),
                        other => Dependency::One(scalar_name(other, "dependency")?),
                    };
                    map.insert(name, dependency);
                }
                Ok(CoordinateDeclaration::Map(map))
            }
            other => scalar_name(other, "coordinate").map(CoordinateDeclaration::Name),
        }
    }

    /// Normalize to the mapping shape. Duplicate names keep their first position.
    pub fn into_map(self) -> IndexMap<String, Dependency> {
        match self {
            CoordinateDeclaration::Name(name) => IndexMap::from([(name, Dependency::Base)]),
            CoordinateDeclaration::Names(names) => names
                .into_iter()
                .map(|n| (n, Dependency::Base))
                .collect(),
            CoordinateDeclaration::Map(map) => map,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CoordinateDeclaration::Name(_) => false,
            CoordinateDeclaration::Names(names) => names.is_empty(),
            CoordinateDeclaration::Map(map) => map.is_empty(),
        }
    }

    /// The mapping form as YAML, as written into a metadata block.
    pub fn to_yaml(&self) -> YamlValue {
        let mut mapping = Mapping::new();
        for (name, dependency) in self.clone().into_map() {
            mapping.insert(YamlValue::String(name), dependency.to_yaml());
        }
        YamlValue::Mapping(mapping)
    }
}

impl From<&str> for CoordinateDeclaration {
    fn from(name: &str) -> Self {
        CoordinateDeclaration::Name(name.to_string())
    }
}

impl From<Vec<&str>> for CoordinateDeclaration {
    fn from(names: Vec<&str>) -> Self {
        CoordinateDeclaration::Names(names.into_iter().map(String::from).collect())
    }
}

impl From<Vec<String>> for CoordinateDeclaration {
    fn from(names: Vec<String>) -> Self {
        CoordinateDeclaration::Names(names)
    }
}

impl From<IndexMap<String, Dependency>> for CoordinateDeclaration {
    fn from(map: IndexMap<String, Dependency>) -> Self {
        CoordinateDeclaration::Map(map)
    }
}

fn scalar_name(value: &YamlValue, what: &str) -> Result<String> {
    match value {
        YamlValue::String(s) => Ok(s.clone()),
        YamlValue::Number(n) => Ok(n.to_string()),
        YamlValue::Bool(b) => Ok(b.to_string()),
        other => Err(MetaCsvError::InvalidDeclaration(format!(
            "{} must be a name, got {:?}",
            what, other
        ))),
    }
}
