//! The data store: compiled buckets plus the dispatch indices that route
//! record-store signals to the leaves interested in them.
//!
//! # Usage
//!
//! ```
//! use daiquiri::{DataStore, QueryConfig, Value};
//!
//! let config = QueryConfig::new()
//!     .with("movers", "{entity: Creature} & {component: Velocity}")
//!     .with("fast", "{set: movers} & {component: Velocity(speed > 10)}");
//! let mut store = DataStore::<u64>::compile(&config).unwrap();
//!
//! store.add_entity(&1, ["Creature"]);
//! store.add_entity_component(&1, "Velocity");
//! assert!(store.bucket_has("movers", &1).unwrap());
//!
//! store.set_entity_component_data(&1, "Velocity", "speed", &Value::Number(12.0), None);
//! assert!(store.bucket_has("fast", &1).unwrap());
//! ```

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use indexmap::IndexMap;
use log::debug;

use crate::ast::{Comparator, Expression, Value};
use crate::bucket::{BucketGraph, BucketId, BucketKind, Leaf};
use crate::compile::Compiler;
use crate::config::QueryConfig;
use crate::error::{Error, Result};

/// One registered attribute comparison: `(comparator, comparison value, leaf)`
#[derive(Clone, Debug, PartialEq)]
pub struct DataFilter {
    pub op: Comparator,
    pub value: Value,
    pub bucket: BucketId,
}

/// Leaves registered for one component name
#[derive(Clone, Debug, Default)]
struct ComponentFilters {
    /// The predicate-less "has this component" leaf
    any: Option<BucketId>,
    /// Attribute key → comparisons on that key, in registration order
    data: IndexMap<String, Vec<DataFilter>>,
}

/// Signal key → leaf bucket indices, built once by [`DispatchIndex::resolve`]
#[derive(Clone, Debug, Default)]
struct DispatchIndex {
    entity: HashMap<String, BucketId>,
    component: HashMap<String, ComponentFilters>,
}

impl DispatchIndex {
    /// Walk every bucket reachable from `roots` exactly once, registering
    /// each leaf under the signal keys that drive it.
    fn resolve<K: Eq + Hash + Clone>(
        graph: &BucketGraph<K>,
        roots: impl IntoIterator<Item = BucketId>,
    ) -> Self {
        let mut index = DispatchIndex::default();
        let mut visited = HashSet::new();
        let mut pending: Vec<BucketId> = roots.into_iter().collect();

        while let Some(id) = pending.pop() {
            if !visited.insert(id) {
                continue;
            }
            match graph.bucket(id).kind() {
                BucketKind::Group { children, .. } => pending.extend(children.iter().copied()),
                BucketKind::Leaf(leaf) => index.register(id, leaf),
            }
        }

        index
    }

    fn register(&mut self, id: BucketId, leaf: &Leaf) {
        match leaf {
            Leaf::Entity(name) => {
                self.entity.insert(name.clone(), id);
            }
            Leaf::Component { name, predicates } => {
                let filters = self.component.entry(name.clone()).or_default();
                if predicates.is_empty() {
                    filters.any = Some(id);
                }
                for predicate in predicates {
                    filters
                        .data
                        .entry(predicate.key.clone())
                        .or_default()
                        .push(DataFilter {
                            op: predicate.op,
                            value: predicate.value.clone(),
                            bucket: id,
                        });
                }
            }
        }
    }
}

/// A compiled set of named queries over records identified by `K`.
///
/// Mutations are driven by the host's record store; queries are O(1)
/// lookups against incrementally maintained membership. Everything runs
/// synchronously on the caller's thread and the store does no locking.
#[derive(Clone, Debug)]
pub struct DataStore<K> {
    graph: BucketGraph<K>,
    named: IndexMap<String, BucketId>,
    index: DispatchIndex,
}

impl<K: Eq + Hash + Clone> DataStore<K> {
    /// Parse and compile every query in `config`.
    ///
    /// Fails on the first syntax or reference error; no partially built
    /// store is ever returned.
    pub fn compile(config: &QueryConfig) -> Result<Self> {
        let mut queries = IndexMap::with_capacity(config.len());
        for (name, text) in config.iter() {
            let expression = crate::parse(text).map_err(|source| Error::Syntax {
                name: name.to_string(),
                source,
            })?;
            queries.insert(name.to_string(), expression);
        }
        Self::from_expressions(&queries)
    }

    /// Compile already-parsed queries
    pub fn from_expressions(queries: &IndexMap<String, Expression>) -> Result<Self> {
        let mut graph = BucketGraph::new();
        let named = Compiler::new(queries, &mut graph).compile_all()?;
        let index = DispatchIndex::resolve(&graph, named.values().copied());

        debug!(
            "compiled {} queries into {} buckets ({} entity types, {} components indexed)",
            named.len(),
            graph.len(),
            index.entity.len(),
            index.component.len()
        );

        Ok(Self {
            graph,
            named,
            index,
        })
    }

    /// `id` gained the given entity types
    pub fn add_entity<I, S>(&mut self, id: &K, entity_types: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for entity_type in entity_types {
            if let Some(&bucket) = self.index.entity.get(entity_type.as_ref()) {
                self.graph.attempt_add(bucket, id);
            }
        }
    }

    /// `id` lost the given entity types
    pub fn remove_entity<I, S>(&mut self, id: &K, entity_types: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for entity_type in entity_types {
            if let Some(&bucket) = self.index.entity.get(entity_type.as_ref()) {
                self.graph.attempt_remove(bucket, id);
            }
        }
    }

    /// `id` gained a component
    pub fn add_entity_component(&mut self, id: &K, component: &str) {
        if let Some(bucket) = self.index.component.get(component).and_then(|f| f.any) {
            self.graph.attempt_add(bucket, id);
        }
    }

    /// `id` lost a component.
    ///
    /// Every attribute predicate on the component is invalidated at once:
    /// the interested leaves forget `id` entirely instead of merely seeing
    /// their comparisons flip.
    pub fn remove_entity_component(&mut self, id: &K, component: &str) {
        let Some(filters) = self.index.component.get(component) else {
            return;
        };
        if let Some(bucket) = filters.any {
            self.graph.attempt_remove(bucket, id);
        }
        for filter in filters.data.values().flatten() {
            self.graph.clear_item(filter.bucket, id);
        }
    }

    /// An attribute of `id`'s component changed from `old_value` (if it had
    /// one) to `value`.
    ///
    /// Each registered comparison on `(component, key)` is evaluated against
    /// both values; only comparisons whose outcome flipped touch their leaf.
    pub fn set_entity_component_data(
        &mut self,
        id: &K,
        component: &str,
        key: &str,
        value: &Value,
        old_value: Option<&Value>,
    ) {
        let Some(filters) = self
            .index
            .component
            .get(component)
            .and_then(|f| f.data.get(key))
        else {
            return;
        };

        for filter in filters {
            let now = filter.op.evaluate(value, &filter.value);
            let before = old_value.is_some_and(|old| filter.op.evaluate(old, &filter.value));
            match (before, now) {
                (false, true) => self.graph.attempt_add(filter.bucket, id),
                (true, false) => self.graph.attempt_remove(filter.bucket, id),
                _ => {}
            }
        }
    }

    /// Whether `id` currently matches the named query
    pub fn bucket_has(&self, name: &str, id: &K) -> Result<bool> {
        let bucket = self.bucket_id(name)?;
        Ok(self.graph.bucket(bucket).has(id))
    }

    /// Snapshot of the records currently matching the named query
    pub fn get_bucket_items(&self, name: &str) -> Result<HashSet<K>> {
        let bucket = self.bucket_id(name)?;
        Ok(self.graph.bucket(bucket).entities())
    }

    /// Root bucket of a named query
    pub fn bucket_id(&self, name: &str) -> Result<BucketId> {
        self.named
            .get(name)
            .copied()
            .ok_or_else(|| Error::UndefinedBucket(name.to_string()))
    }

    /// Names of every compiled query, in configuration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.named.keys().map(String::as_str)
    }

    /// The underlying bucket graph, for inspection
    pub fn graph(&self) -> &BucketGraph<K> {
        &self.graph
    }

    /// Comparisons registered for `(component, key)`
    pub fn data_filters(&self, component: &str, key: &str) -> &[DataFilter] {
        self.index
            .component
            .get(component)
            .and_then(|f| f.data.get(key))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
