//! Read-time checks against decoded metadata.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_yaml::Value as YamlValue;

use crate::error::{MetaCsvError, Result};
use crate::metadata::{Metadata, COORDS_KEY, VARIABLES_KEY};

/// Facet key for container attributes.
pub const ATTRS_KEY: &str = "attrs";

type PredicateFn = dyn Fn(&YamlValue) -> bool + Send + Sync;

/// What a decoded value must look like.
#[derive(Clone)]
pub enum Expectation {
    /// Deep equality with a YAML value.
    Equals(YamlValue),
    /// A caller-supplied check.
    Predicate(Arc<PredicateFn>),
    /// Expectations on the entries of a mapping.
    Nested(IndexMap<String, Expectation>),
}

impl Expectation {
    pub fn equals(value: impl Into<YamlValue>) -> Self {
        Expectation::Equals(value.into())
    }

    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&YamlValue) -> bool + Send + Sync + 'static,
    {
        Expectation::Predicate(Arc::new(f))
    }

    pub fn nested<K: Into<String>>(entries: impl IntoIterator<Item = (K, Expectation)>) -> Self {
        Expectation::Nested(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    fn verify(&self, path: &str, actual: Option<&YamlValue>) -> Result<()> {
        let Some(actual) = actual else {
            return Err(failed(path, "value is missing"));
        };

        match self {
            Expectation::Equals(expected) => {
                if expected != actual {
                    return Err(failed(
                        path,
                        format!("expected {:?}, found {:?}", expected, actual),
                    ));
                }
            }
            Expectation::Predicate(check) => {
                if !check(actual) {
                    return Err(failed(path, format!("predicate rejected {:?}", actual)));
                }
            }
            Expectation::Nested(entries) => {
                let Some(mapping) = actual.as_mapping() else {
                    return Err(failed(path, format!("expected a mapping, found {:?}", actual)));
                };
                for (key, expectation) in entries {
                    expectation.verify(&format!("{}.{}", path, key), mapping.get(key.as_str()))?;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expectation::Equals(v) => f.debug_tuple("Equals").field(v).finish(),
            Expectation::Predicate(_) => f.write_str("Predicate(..)"),
            Expectation::Nested(m) => f.debug_tuple("Nested").field(m).finish(),
        }
    }
}

impl From<YamlValue> for Expectation {
    fn from(value: YamlValue) -> Self {
        Expectation::Equals(value)
    }
}

fn failed(path: &str, message: impl Into<String>) -> MetaCsvError {
    MetaCsvError::AssertionFailed {
        path: path.to_string(),
        message: message.into(),
    }
}

/// Expectations keyed by facet.
///
/// `attrs`, `coords` and `variables` address those facets; any other key is
/// checked against the attribute of that name.
#[derive(Debug, Clone, Default)]
pub struct Assertions {
    entries: IndexMap<String, Expectation>,
}

impl Assertions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an expectation (builder style).
    pub fn expect(mut self, key: impl Into<String>, expectation: impl Into<Expectation>) -> Self {
        self.entries.insert(key.into(), expectation.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check every expectation, failing on the first mismatch.
    pub fn verify(&self, metadata: &Metadata) -> Result<()> {
        for (key, expectation) in &self.entries {
            let actual = match key.as_str() {
                ATTRS_KEY => Some(YamlValue::Mapping(metadata.attrs.to_yaml())),
                COORDS_KEY => metadata.coords().map(|g| g.to_declaration().to_yaml()),
                VARIABLES_KEY => Some(YamlValue::Mapping(metadata.variables.to_yaml())),
                attr => metadata.attrs.get(attr).cloned(),
            };
            expectation.verify(key, actual.as_ref())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> Metadata {
        let mut metadata = Metadata::new();
        metadata.attrs.insert("author", "series creator");
        metadata.attrs.insert("version", 2);
        metadata.set_coords(&"ind".into()).unwrap();
        metadata.variables.insert("col1", "first column [m]");
        metadata
    }

    #[test]
    fn test_top_level_key_checks_attribute() {
        let assertions = Assertions::new().expect("author", Expectation::equals("series creator"));
        assert!(assertions.verify(&metadata()).is_ok());
    }

    #[test]
    fn test_nested_attrs_mismatch_names_path() {
        let assertions = Assertions::new().expect(
            "attrs",
            Expectation::nested([("author", Expectation::equals("someone else"))]),
        );
        match assertions.verify(&metadata()) {
            Err(MetaCsvError::AssertionFailed { path, .. }) => assert_eq!(path, "attrs.author"),
            other => panic!("expected AssertionFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_predicate() {
        let ok = Assertions::new().expect(
            "version",
            Expectation::predicate(|v| v.as_i64().is_some_and(|n| n > 1)),
        );
        assert!(ok.verify(&metadata()).is_ok());

        let bad = Assertions::new().expect("version", Expectation::predicate(|v| v.is_string()));
        assert!(bad.verify(&metadata()).is_err());
    }

    #[test]
    fn test_coords_compared_as_declaration() {
        let expected: YamlValue = serde_yaml::from_str("{ind: null}").unwrap();
        let assertions = Assertions::new().expect("coords", expected);
        assert!(assertions.verify(&metadata()).is_ok());
    }

    #[test]
    fn test_missing_value_fails() {
        let assertions = Assertions::new().expect("license", Expectation::equals("MIT"));
        assert!(matches!(
            assertions.verify(&metadata()),
            Err(MetaCsvError::AssertionFailed { .. })
        ));

        let no_coords = Assertions::new().expect("coords", Expectation::equals(YamlValue::Null));
        assert!(no_coords.verify(&Metadata::new()).is_err());
    }
}
