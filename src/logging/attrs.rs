//! Attribute sets bound to handlers and attached to records
//!
//! Keys are unique and kept sorted, which is also the order they are
//! rendered in. Merging lets the incoming set win on key collisions.

use serde_json::{Map, Value};

/// Separator between a group name and the key it qualifies
pub const GROUP_SEPARATOR: char = '.';

/// Ordered key/value mapping with unique keys
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    entries: Map<String, Value>,
}

impl Attributes {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, replacing any existing value under `key`
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Get a value by key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Overlay `other` on top of this set; keys in `other` win
    pub fn merge(&mut self, other: &Attributes) {
        for (key, value) in &other.entries {
            self.entries.insert(key.clone(), value.clone());
        }
    }

    /// Copy of this set with every key qualified by `group`
    ///
    /// `None` returns the set unchanged.
    pub fn qualified(&self, group: Option<&str>) -> Attributes {
        let Some(group) = group else {
            return self.clone();
        };
        self.entries
            .iter()
            .map(|(key, value)| (qualify(group, key), value.clone()))
            .collect()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the set has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }

    /// Render as a 2-space indented JSON object
    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.entries)
    }
}

/// Join a group prefix and a key
pub fn qualify(group: &str, key: &str) -> String {
    format!("{}{}{}", group, GROUP_SEPARATOR, key)
}

impl<K, V> FromIterator<(K, V)> for Attributes
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attrs = Attributes::new();
        for (key, value) in iter {
            attrs.insert(key, value);
        }
        attrs
    }
}
