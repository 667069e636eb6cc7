//! Query configuration: the static `name → query text` table a store is
//! compiled from.

use indexmap::IndexMap;

/// Named queries in insertion order.
///
/// Compilation walks entries in this order, which keeps bucket handles
/// deterministic for a given configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryConfig {
    queries: IndexMap<String, String>,
}

impl QueryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a named query, returning the previous text
    pub fn insert(&mut self, name: impl Into<String>, query: impl Into<String>) -> Option<String> {
        self.queries.insert(name.into(), query.into())
    }

    /// Builder form of [`QueryConfig::insert`]
    pub fn with(mut self, name: impl Into<String>, query: impl Into<String>) -> Self {
        self.insert(name, query);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.queries.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.queries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    /// `(name, text)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.queries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryConfig {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut config = QueryConfig::new();
        for (name, query) in iter {
            config.insert(name, query);
        }
        config
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for QueryConfig {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (name, query) in iter {
            self.insert(name, query);
        }
    }
}
