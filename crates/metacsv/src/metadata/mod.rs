//! Documentation metadata: attributes, variables and the table container.

mod container;
mod facets;

pub use container::{Metadata, MetadataContainer, COORDS_KEY, VARIABLES_KEY};
pub use facets::{Attributes, FacetMap, Variables};
