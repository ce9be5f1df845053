//! Coordinate declarations and the dependency graph built from them.

mod declaration;
mod graph;

pub use declaration::{CoordinateDeclaration, Dependency};
pub use graph::CoordinateGraph;
