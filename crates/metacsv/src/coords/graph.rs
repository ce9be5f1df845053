//! Validated coordinate dependency graph.

use std::collections::HashSet;
use std::fmt;

use indexmap::{IndexMap, IndexSet};

use crate::error::{MetaCsvError, Result};

use super::declaration::{CoordinateDeclaration, Dependency};

/// A validated, acyclic coordinate dependency graph.
///
/// Base coordinates have no dependencies and become axes when a table is
/// materialized. Every other coordinate is derived from the base coordinates
/// reachable through its dependencies.
#[derive(Debug, Clone, Default)]
pub struct CoordinateGraph {
    /// Coordinate to direct dependencies (None for base coordinates), in declaration order.
    dependencies: IndexMap<String, Option<IndexSet<String>>>,
    /// Base coordinates in discovery order.
    base_coordinates: Vec<String>,
    /// Coordinate to the base coordinates transitively reachable from it.
    base_dependencies: IndexMap<String, IndexSet<String>>,
}

/// Traversal state for a single parse.
struct Resolver {
    pending: IndexMap<String, Dependency>,
    visited: HashSet<String>,
    dependencies: IndexMap<String, Option<IndexSet<String>>>,
    base_coordinates: Vec<String>,
    base_dependencies: IndexMap<String, IndexSet<String>>,
}

impl Resolver {
    fn resolve(&mut self, coord: &str, referrer: Option<&str>) -> Result<()> {
        if self.visited.contains(coord) {
            // Visited but not finalized: still on the traversal stack
            if !self.dependencies.contains_key(coord) {
                return Err(MetaCsvError::CyclicGraph {
                    coordinate: coord.to_string(),
                });
            }
            return Ok(());
        }

        let Some(dependency) = self.pending.shift_remove(coord) else {
            return Err(MetaCsvError::UnresolvedDependency {
                coordinate: referrer.unwrap_or(coord).to_string(),
                dependency: coord.to_string(),
            });
        };

        self.visited.insert(coord.to_string());

        if dependency.names().is_empty() {
            self.base_coordinates.push(coord.to_string());
            self.dependencies.insert(coord.to_string(), None);
            self.base_dependencies
                .insert(coord.to_string(), IndexSet::from([coord.to_string()]));
            return Ok(());
        }

        let mut direct = IndexSet::new();
        let mut bases = IndexSet::new();
        for dep in dependency.names() {
            self.resolve(dep, Some(coord))?;
            direct.insert(dep.clone());
            if let Some(dep_bases) = self.base_dependencies.get(dep) {
                bases.extend(dep_bases.iter().cloned());
            }
        }

        self.dependencies.insert(coord.to_string(), Some(direct));
        self.base_dependencies.insert(coord.to_string(), bases);
        Ok(())
    }
}

impl CoordinateGraph {
    /// Parse a declaration into a validated graph.
    ///
    /// The declaration is copied; caller data is never mutated. Every
    /// dependency must itself be declared as a coordinate.
    pub fn parse(declaration: &CoordinateDeclaration) -> Result<Self> {
        let map = declaration.clone().into_map();
        let order: Vec<String> = map.keys().cloned().collect();

        let mut resolver = Resolver {
            pending: map,
            visited: HashSet::new(),
            dependencies: IndexMap::new(),
            base_coordinates: Vec::new(),
            base_dependencies: IndexMap::new(),
        };

        while let Some(coord) = resolver.pending.keys().next().cloned() {
            resolver.resolve(&coord, None)?;
        }

        // Restore declaration order for the mappings
        let mut dependencies = IndexMap::with_capacity(order.len());
        let mut base_dependencies = IndexMap::with_capacity(order.len());
        for name in order {
            if let Some(deps) = resolver.dependencies.shift_remove(&name) {
                dependencies.insert(name.clone(), deps);
            }
            if let Some(bases) = resolver.base_dependencies.shift_remove(&name) {
                base_dependencies.insert(name, bases);
            }
        }

        if !dependencies.is_empty() && resolver.base_coordinates.is_empty() {
            return Err(MetaCsvError::InvalidDeclaration(
                "a non-empty coordinate graph needs at least one base coordinate".to_string(),
            ));
        }

        log::debug!(
            "parsed coordinate graph: {} coordinates, base {:?}",
            dependencies.len(),
            resolver.base_coordinates
        );

        Ok(Self {
            dependencies,
            base_coordinates: resolver.base_coordinates,
            base_dependencies,
        })
    }

    /// Coordinate names in declaration order.
    pub fn coordinates(&self) -> impl Iterator<Item = &str> {
        self.dependencies.keys().map(|k| k.as_str())
    }

    pub fn dependencies(&self) -> &IndexMap<String, Option<IndexSet<String>>> {
        &self.dependencies
    }

    /// Direct dependencies of a coordinate (None for base coordinates).
    pub fn dependencies_of(&self, coord: &str) -> Option<&IndexSet<String>> {
        self.dependencies.get(coord).and_then(|d| d.as_ref())
    }

    pub fn base_coordinates(&self) -> &[String] {
        &self.base_coordinates
    }

    /// Base coordinates transitively reachable from `coord`.
    pub fn base_dependencies(&self, coord: &str) -> Option<&IndexSet<String>> {
        self.base_dependencies.get(coord)
    }

    pub fn contains(&self, coord: &str) -> bool {
        self.dependencies.contains_key(coord)
    }

    pub fn is_base(&self, coord: &str) -> bool {
        matches!(self.dependencies.get(coord), Some(None))
    }

    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    /// The minimal declaration that reconstructs this graph.
    pub fn to_declaration(&self) -> CoordinateDeclaration {
        let map = self
            .dependencies
            .iter()
            .map(|(name, deps)| {
                let dependency = match deps {
                    None => Dependency::Base,
                    Some(set) if set.len() == 1 => {
                        Dependency::One(set.iter().next().cloned().unwrap_or_default())
                    }
                    Some(set) => Dependency::Many(set.iter().cloned().collect()),
                };
                (name.clone(), dependency)
            })
            .collect();
        CoordinateDeclaration::Map(map)
    }

    /// Merge a partial declaration over this graph's declaration.
    ///
    /// Entries in `partial` replace existing entries of the same name.
    pub fn merged(&self, partial: &CoordinateDeclaration) -> CoordinateDeclaration {
        let mut map = self.to_declaration().into_map();
        map.extend(partial.clone().into_map());
        CoordinateDeclaration::Map(map)
    }
}

impl PartialEq for CoordinateGraph {
    /// Graphs are equal when their dependency mappings are equal.
    fn eq(&self, other: &Self) -> bool {
        self.dependencies == other.dependencies
    }
}

impl Eq for CoordinateGraph {}

impl fmt::Display for CoordinateGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "<Empty Coordinates>");
        }
        write!(f, "Coordinates")?;
        for base in &self.base_coordinates {
            write!(f, "\n  * {: <10} ({})", base, base)?;
        }
        for (name, deps) in &self.dependencies {
            if let Some(deps) = deps {
                let deps: Vec<&str> = deps.iter().map(|d| d.as_str()).collect();
                write!(f, "\n    {: <10} ({})", name, deps.join(","))?;
            }
        }
        Ok(())
    }
}
