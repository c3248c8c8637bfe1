//! Field-equality filters over resource documents

use serde_json::{Map, Value};

use crate::utils::scalar_text;

/// A conjunction of `field = value` predicates
///
/// Values are compared against the textual form of the document field, so a
/// query string `hours=2` matches both `"hours": 2` and `"hours": "2"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceFilter {
    predicates: Vec<(String, String)>,
}

impl ResourceFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a predicate
    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.predicates.push((field.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Check a document against every predicate
    pub fn matches(&self, data: &Map<String, Value>) -> bool {
        self.predicates.iter().all(|(field, expected)| {
            data.get(field)
                .and_then(scalar_text)
                .is_some_and(|actual| actual == *expected)
        })
    }
}

impl<K, V> FromIterator<(K, V)> for ResourceFilter
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            predicates: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
