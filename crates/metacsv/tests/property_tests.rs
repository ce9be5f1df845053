//! Property-based tests for coordinate graphs and the header codec.
//!
//! # Running Property Tests
//!
//! ```bash
//! cargo test -p metacsv --test property_tests
//!
//! # More cases
//! PROPTEST_CASES=10000 cargo test -p metacsv --test property_tests
//! ```

use indexmap::IndexMap;
use proptest::prelude::*;
use serde_yaml::Value as YamlValue;

use metacsv::header;
use metacsv::{CoordinateDeclaration, CoordinateGraph, Dependency, MetaCsvError, Metadata};

// =============================================================================
// Test Strategies
// =============================================================================

fn coord_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,7}"
}

/// Acyclic declarations: coordinate `i` may only depend on coordinates `< i`.
///
/// Dependencies are written in every admissible shape, including empty and
/// single-entry lists.
fn acyclic_declaration() -> impl Strategy<Value = IndexMap<String, Dependency>> {
    prop::collection::hash_set(coord_name(), 1..10)
        .prop_flat_map(|names| {
            let names: Vec<String> = names.into_iter().collect();
            let n = names.len();
            let deps = prop::collection::vec(
                (
                    prop::collection::vec(any::<prop::sample::Index>(), 0..3),
                    any::<bool>(),
                ),
                n,
            );
            (Just(names), deps)
        })
        .prop_map(|(names, deps)| {
            names
                .iter()
                .enumerate()
                .map(|(i, name)| {
                    let (picks, as_list) = &deps[i];
                    let mut picked: Vec<String> = if i == 0 {
                        Vec::new()
                    } else {
                        picks.iter().map(|ix| names[ix.index(i)].clone()).collect()
                    };
                    picked.dedup();
                    let dependency = match (picked.len(), *as_list) {
                        (0, false) => Dependency::Base,
                        (1, false) => Dependency::One(picked[0].clone()),
                        _ => Dependency::Many(picked),
                    };
                    (name.clone(), dependency)
                })
                .collect()
        })
}

/// A declaration with a cycle through the first `len` names.
fn cyclic_declaration() -> impl Strategy<Value = IndexMap<String, Dependency>> {
    prop::collection::hash_set(coord_name(), 1..8).prop_map(|names| {
        let names: Vec<String> = names.into_iter().collect();
        let n = names.len();
        names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), Dependency::One(names[(i + 1) % n].clone())))
            .collect()
    })
}

/// Free text, including quotes, colons, comments and multi-line values
/// with lines that look like block markers.
fn yaml_text() -> impl Strategy<Value = String> {
    let line = prop_oneof![
        4 => "[ -~]{0,20}",
        1 => Just("...".to_string()),
        1 => Just("---".to_string()),
        1 => Just("  ----".to_string()),
    ];
    prop_oneof![
        "[A-Za-z][A-Za-z0-9 ._-]{0,20}",
        "[ -~]{0,30}",
        prop::collection::vec(line, 1..5).prop_map(|lines| lines.join("\n")),
    ]
}

/// Arbitrary documentation values: scalars, lists and nested mappings.
fn yaml_value() -> impl Strategy<Value = YamlValue> {
    let leaf = prop_oneof![
        Just(YamlValue::Null),
        any::<bool>().prop_map(YamlValue::Bool),
        any::<i64>().prop_map(YamlValue::from),
        (-1_000_000i64..1_000_000).prop_map(|n| YamlValue::from(n as f64 / 8.0)),
        yaml_text().prop_map(YamlValue::String),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(YamlValue::Sequence),
            prop::collection::vec((coord_name(), inner), 0..4).prop_map(|entries| {
                YamlValue::Mapping(
                    entries
                        .into_iter()
                        .map(|(k, v)| (YamlValue::String(k), v))
                        .collect(),
                )
            }),
        ]
    })
}

fn metadata() -> impl Strategy<Value = Metadata> {
    (
        prop::collection::vec((coord_name(), yaml_value()), 0..5),
        prop::collection::vec((coord_name(), yaml_value()), 0..5),
        acyclic_declaration(),
    )
        .prop_map(|(attrs, vars, coords)| {
            let mut metadata = Metadata::new();
            for (k, v) in attrs {
                metadata.attrs.insert(format!("attr_{}", k), v);
            }
            for (k, v) in vars {
                metadata.variables.insert(k, v);
            }
            metadata
                .set_coords(&CoordinateDeclaration::Map(coords))
                .expect("acyclic declaration");
            metadata
        })
}

// =============================================================================
// Coordinate Graph Properties
// =============================================================================

mod graph_tests {
    use super::*;

    proptest! {
        /// Base coordinates are exactly the keys with no dependencies, null or empty list.
        #[test]
        fn base_coordinates_are_null_keys(decl in acyclic_declaration()) {
            let graph = CoordinateGraph::parse(&CoordinateDeclaration::Map(decl.clone()))
                .expect("acyclic declaration parses");

            let mut expected: Vec<&String> = decl
                .iter()
                .filter(|(_, d)| d.names().is_empty())
                .map(|(k, _)| k)
                .collect();
            let mut actual: Vec<&String> = graph.base_coordinates().iter().collect();
            expected.sort();
            actual.sort();
            prop_assert_eq!(expected, actual);
            prop_assert!(!graph.base_coordinates().is_empty());
        }

        /// Every coordinate's base set contains only base coordinates.
        #[test]
        fn base_sets_reach_only_bases(decl in acyclic_declaration()) {
            let graph = CoordinateGraph::parse(&CoordinateDeclaration::Map(decl))
                .expect("acyclic declaration parses");
            for coord in graph.coordinates() {
                let bases = graph.base_dependencies(coord).expect("every coordinate has a base set");
                prop_assert!(!bases.is_empty());
                prop_assert!(bases.iter().all(|b| graph.is_base(b)));
            }
        }

        /// List-shaped declarations make every name a base coordinate.
        #[test]
        fn list_declarations_are_all_base(names in prop::collection::hash_set(coord_name(), 1..10)) {
            let names: Vec<String> = names.into_iter().collect();
            let graph = CoordinateGraph::parse(&CoordinateDeclaration::Names(names.clone()))
                .expect("list declaration parses");
            prop_assert_eq!(graph.base_coordinates(), names.as_slice());
        }

        /// Any directed cycle is rejected.
        #[test]
        fn cycles_are_rejected(decl in cyclic_declaration()) {
            let result = CoordinateGraph::parse(&CoordinateDeclaration::Map(decl));
            prop_assert!(
                matches!(result, Err(MetaCsvError::CyclicGraph { .. })),
                "expected CyclicGraph, got {:?}",
                result
            );
        }

        /// The minimal declaration rebuilds an equal graph.
        #[test]
        fn declaration_round_trip(decl in acyclic_declaration()) {
            let graph = CoordinateGraph::parse(&CoordinateDeclaration::Map(decl))
                .expect("acyclic declaration parses");
            let again = CoordinateGraph::parse(&graph.to_declaration())
                .expect("minimal declaration parses");
            prop_assert_eq!(graph, again);
        }
    }
}

// =============================================================================
// Header Codec Properties
// =============================================================================

mod codec_tests {
    use super::*;

    proptest! {
        /// Decoding an encoded block yields equal metadata.
        #[test]
        fn encode_decode_round_trip(metadata in metadata()) {
            let block = header::encode(&metadata)
                .expect("encode")
                .expect("non-empty metadata writes a block");
            let text = format!("{}a,b\n1,2\n", block);

            let decoded = header::decode(&text).expect("decode");
            prop_assert_eq!(decoded.body, "a,b\n1,2\n");

            let back = Metadata::from_header(decoded.header.expect("block present"))
                .expect("header splits");
            prop_assert_eq!(back, metadata);
        }

        /// Encoding twice gives byte-identical blocks.
        #[test]
        fn encoding_is_idempotent(metadata in metadata()) {
            let first = header::encode(&metadata).expect("encode");
            let second = header::encode(&metadata).expect("encode");
            prop_assert_eq!(first, second);
        }

        /// The decoder never panics on arbitrary text.
        #[test]
        fn decode_never_panics(text in "(---\n)?[ -~\n]{0,200}") {
            let _ = header::decode(&text);
        }
    }
}
