//! Attributes and Variables: ordered documentation mappings.

use std::fmt;
use std::ops::{Deref, DerefMut};

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_yaml::{Mapping, Value as YamlValue};

/// Matches `"description [unit]"` variable shorthand.
static SHORTHAND: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<desc>[^\[\]]+?)\s*\[(?P<unit>[^\[\]]+)\]\s*$").unwrap());

/// An ordered mapping that distinguishes "never set" from "set but empty".
///
/// Equality compares contents only: an unset mapping equals an empty one.
/// [`FacetMap::is_unset`] and the `Display` output keep the two apart.
#[derive(Debug, Clone, Default)]
pub struct FacetMap {
    entries: Option<IndexMap<String, YamlValue>>,
}

impl FacetMap {
    /// A mapping that has never been assigned.
    pub fn unset() -> Self {
        Self { entries: None }
    }

    /// A present mapping with the given entries.
    pub fn from_entries(entries: IndexMap<String, YamlValue>) -> Self {
        Self {
            entries: Some(entries),
        }
    }

    pub fn is_unset(&self) -> bool {
        self.entries.is_none()
    }

    /// True when there are no entries, whether unset or assigned empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn len(&self) -> usize {
        self.entries.as_ref().map(|e| e.len()).unwrap_or(0)
    }

    pub fn get(&self, key: &str) -> Option<&YamlValue> {
        self.entries.as_ref()?.get(key)
    }

    /// Get a value or fall back to `default`.
    pub fn get_or<'a>(&'a self, key: &str, default: &'a YamlValue) -> &'a YamlValue {
        self.get(key).unwrap_or(default)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut YamlValue> {
        self.entries.as_mut()?.get_mut(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Set a value, making the mapping present.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<YamlValue>) -> Option<YamlValue> {
        self.entries
            .get_or_insert_with(IndexMap::new)
            .insert(key.into(), value.into())
    }

    /// Remove a key, preserving the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<YamlValue> {
        self.entries.as_mut()?.shift_remove(key)
    }

    /// Remove a key or return `default` when absent.
    pub fn pop_or(&mut self, key: &str, default: YamlValue) -> YamlValue {
        self.remove(key).unwrap_or(default)
    }

    /// Merge entries, overwriting existing keys.
    pub fn update<K, I>(&mut self, entries: I)
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, YamlValue)>,
    {
        let map = self.entries.get_or_insert_with(IndexMap::new);
        for (k, v) in entries {
            map.insert(k.into(), v);
        }
    }

    /// Return to the never-assigned state.
    pub fn reset(&mut self) {
        self.entries = None;
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &YamlValue)> {
        self.entries
            .iter()
            .flat_map(|e| e.iter())
            .map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.iter().map(|(k, _)| k)
    }

    /// The entries as a YAML mapping, in order.
    pub fn to_yaml(&self) -> Mapping {
        self.iter()
            .map(|(k, v)| (YamlValue::String(k.to_string()), v.clone()))
            .collect()
    }

    fn fmt_entries(&self, f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
        if self.is_unset() {
            return write!(f, "<Empty {}>", title);
        }
        write!(f, "{}", title)?;
        for (k, v) in self.iter() {
            write!(f, "\n    {}: {}", k, render_inline(v))?;
        }
        Ok(())
    }
}

impl PartialEq for FacetMap {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K: Into<String>> FromIterator<(K, YamlValue)> for FacetMap {
    fn from_iter<I: IntoIterator<Item = (K, YamlValue)>>(iter: I) -> Self {
        let mut map = FacetMap::unset();
        map.update(iter);
        map.entries.get_or_insert_with(IndexMap::new);
        map
    }
}

/// Render a value on one line for summaries.
fn render_inline(value: &YamlValue) -> String {
    match value {
        YamlValue::Null => "null".to_string(),
        YamlValue::Bool(b) => b.to_string(),
        YamlValue::Number(n) => n.to_string(),
        YamlValue::String(s) => s.clone(),
        other => serde_json::to_string(other).unwrap_or_else(|_| format!("{:?}", other)),
    }
}

/// Container-level documentation attributes (author, version, ...).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes(FacetMap);

impl Attributes {
    pub fn new() -> Self {
        Self(FacetMap::unset())
    }

    pub fn from_entries(entries: IndexMap<String, YamlValue>) -> Self {
        Self(FacetMap::from_entries(entries))
    }
}

impl Deref for Attributes {
    type Target = FacetMap;

    fn deref(&self) -> &FacetMap {
        &self.0
    }
}

impl DerefMut for Attributes {
    fn deref_mut(&mut self) -> &mut FacetMap {
        &mut self.0
    }
}

impl fmt::Display for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt_entries(f, "Attributes")
    }
}

impl<K: Into<String>> FromIterator<(K, YamlValue)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, YamlValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Per-field documentation, keyed by column or coordinate name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Variables(FacetMap);

impl Variables {
    pub fn new() -> Self {
        Self(FacetMap::unset())
    }

    pub fn from_entries(entries: IndexMap<String, YamlValue>) -> Self {
        Self(FacetMap::from_entries(entries))
    }

    /// Expand `"description [unit]"` into a `{description, unit}` mapping.
    ///
    /// Text without a well-formed trailing bracket is returned unchanged as a string.
    pub fn parse_string_var(text: &str) -> YamlValue {
        match SHORTHAND.captures(text) {
            Some(caps) => {
                let mut mapping = Mapping::new();
                mapping.insert("description".into(), caps["desc"].trim().into());
                mapping.insert("unit".into(), caps["unit"].trim().into());
                YamlValue::Mapping(mapping)
            }
            None => YamlValue::String(text.to_string()),
        }
    }

    /// Apply [`Variables::parse_string_var`] to every string-valued entry.
    pub fn expand_shorthand(&mut self) {
        let keys: Vec<String> = self.keys().map(String::from).collect();
        for key in keys {
            let expanded = match self.0.get(&key) {
                Some(YamlValue::String(text)) => Self::parse_string_var(text),
                _ => continue,
            };
            self.0.insert(key, expanded);
        }
    }

    /// The documentation mapping for one field, if it is a mapping.
    pub fn field_attrs(&self, name: &str) -> Option<&Mapping> {
        self.get(name).and_then(|v| v.as_mapping())
    }
}

impl Deref for Variables {
    type Target = FacetMap;

    fn deref(&self) -> &FacetMap {
        &self.0
    }
}

impl DerefMut for Variables {
    fn deref_mut(&mut self) -> &mut FacetMap {
        &mut self.0
    }
}

impl fmt::Display for Variables {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt_entries(f, "Variables")
    }
}

impl<K: Into<String>> FromIterator<(K, YamlValue)> for Variables {
    fn from_iter<I: IntoIterator<Item = (K, YamlValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
