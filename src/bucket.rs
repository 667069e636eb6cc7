//! Bucket graph: the incremental membership engine.
//!
//! Buckets live in an arena and refer to each other by [`BucketId`]. A
//! bucket is either a leaf bound to one primitive predicate or a group
//! combining child buckets under `&` or `|`. Each bucket keeps, per record,
//! the number of its conditions currently satisfied; membership is a pure
//! function of that counter:
//!
//! - `&`: member iff `count == condition_count`
//! - `|`: member iff `count > 0`
//!
//! Membership changes propagate synchronously, depth first, to every
//! superset (parent group). Because the decision only ever looks at the
//! counter, a shared ancestor reached through two paths of a diamond ends
//! in the same state whatever order the paths are walked in.
//!
//! The graph shape is fixed once compilation finishes; afterwards only
//! counters and member sets change.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use log::{debug, trace};

use crate::ast::{Operator, Predicate, Value};
use crate::error::{Error, Result};

/// Handle to a bucket in a [`BucketGraph`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BucketId(usize);

impl BucketId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// The primitive predicate a leaf bucket is bound to
#[derive(Clone, Debug, PartialEq)]
pub enum Leaf {
    /// Records carrying an entity type tag
    Entity(String),

    /// Records with a component; with predicates, records whose component
    /// attributes satisfy every one of them
    Component {
        name: String,
        predicates: Vec<Predicate>,
    },
}

impl Leaf {
    /// Canonical structural hash; predicate order does not matter
    pub fn canonical_hash(&self) -> String {
        match self {
            Leaf::Entity(name) => format!("entity:{}", name),
            Leaf::Component { name, predicates } => {
                let mut parts: Vec<String> = predicates
                    .iter()
                    .map(|p| format!("{}:{}:{}", p.key, p.op.name(), hashed_value(&p.value)))
                    .collect();
                parts.sort();
                format!("component:{}({})", name, parts.join(","))
            }
        }
    }

    /// Number of independent conditions feeding the leaf's counter
    pub fn condition_count(&self) -> usize {
        match self {
            Leaf::Component { predicates, .. } if !predicates.is_empty() => predicates.len(),
            _ => 1,
        }
    }
}

/// JSON text of a predicate value. `-0` and `0` compare equal, so they
/// hash alike too.
fn hashed_value(value: &Value) -> String {
    match value {
        Value::Number(n) if *n == 0.0 => "0".to_string(),
        other => other.to_string(),
    }
}

/// What a bucket is
#[derive(Clone, Debug, PartialEq)]
pub enum BucketKind {
    Leaf(Leaf),
    Group {
        mode: Operator,
        children: Vec<BucketId>,
    },
}

/// A compiled node tracking which records satisfy it
#[derive(Clone, Debug)]
pub struct Bucket<K> {
    hash: String,
    kind: BucketKind,
    condition_count: usize,
    counts: HashMap<K, usize>,
    members: HashSet<K>,
    supersets: Vec<BucketId>,
}

impl<K: Eq + Hash + Clone> Bucket<K> {
    fn new(hash: String, kind: BucketKind) -> Self {
        let condition_count = match &kind {
            BucketKind::Leaf(leaf) => leaf.condition_count(),
            BucketKind::Group { children, .. } => children.len(),
        };
        Self {
            hash,
            kind,
            condition_count,
            counts: HashMap::new(),
            members: HashSet::new(),
            supersets: Vec::new(),
        }
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn kind(&self) -> &BucketKind {
        &self.kind
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, BucketKind::Group { .. })
    }

    /// Combination mode; leaves require all of their conditions
    pub fn mode(&self) -> Operator {
        match self.kind {
            BucketKind::Leaf(_) => Operator::And,
            BucketKind::Group { mode, .. } => mode,
        }
    }

    /// Direct children (empty for leaves)
    pub fn children(&self) -> &[BucketId] {
        match &self.kind {
            BucketKind::Leaf(_) => &[],
            BucketKind::Group { children, .. } => children,
        }
    }

    /// Groups that include this bucket as a direct child
    pub fn supersets(&self) -> &[BucketId] {
        &self.supersets
    }

    pub fn condition_count(&self) -> usize {
        self.condition_count
    }

    /// Satisfied-condition counter for `item`
    pub fn count(&self, item: &K) -> usize {
        self.counts.get(item).copied().unwrap_or(0)
    }

    pub fn has(&self, item: &K) -> bool {
        self.members.contains(item)
    }

    /// Independent snapshot of the current members
    pub fn entities(&self) -> HashSet<K> {
        self.members.clone()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    fn should_contain(&self, count: usize) -> bool {
        match self.mode() {
            Operator::And => count == self.condition_count,
            Operator::Or => count > 0,
        }
    }

    fn increment(&mut self, item: &K) -> usize {
        let count = self.counts.entry(item.clone()).or_insert(0);
        *count += 1;
        *count
    }

    fn decrement(&mut self, item: &K) -> usize {
        match self.count(item) {
            0 => {
                debug!(
                    "unmatched removal on bucket {}; counter stays at zero",
                    self.hash
                );
                0
            }
            1 => {
                self.counts.remove(item);
                0
            }
            n => {
                if let Some(count) = self.counts.get_mut(item) {
                    *count = n - 1;
                }
                n - 1
            }
        }
    }
}

/// Arena of buckets plus the canonical hash cache that deduplicates them
#[derive(Clone, Debug)]
pub struct BucketGraph<K> {
    buckets: Vec<Bucket<K>>,
    by_hash: HashMap<String, BucketId>,
}

impl<K> Default for BucketGraph<K> {
    fn default() -> Self {
        Self {
            buckets: Vec::new(),
            by_hash: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Clone> BucketGraph<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct buckets
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Look up a bucket.
    ///
    /// # Panics
    ///
    /// Panics if `id` was minted by a different graph and is out of range
    /// here; use [`BucketGraph::get`] for handles of unknown origin.
    pub fn bucket(&self, id: BucketId) -> &Bucket<K> {
        &self.buckets[id.0]
    }

    /// Look up a bucket, `None` if `id` is out of range for this graph
    pub fn get(&self, id: BucketId) -> Option<&Bucket<K>> {
        self.buckets.get(id.0)
    }

    /// Find a bucket by canonical hash
    pub fn lookup(&self, hash: &str) -> Option<BucketId> {
        self.by_hash.get(hash).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (BucketId, &Bucket<K>)> {
        self.buckets
            .iter()
            .enumerate()
            .map(|(idx, bucket)| (BucketId(idx), bucket))
    }

    fn insert(&mut self, hash: String, kind: BucketKind) -> BucketId {
        let id = BucketId(self.buckets.len());
        self.by_hash.insert(hash.clone(), id);
        self.buckets.push(Bucket::new(hash, kind));
        id
    }

    /// Get or create the leaf bucket for `leaf`
    pub fn leaf(&mut self, leaf: Leaf) -> BucketId {
        let hash = leaf.canonical_hash();
        if let Some(id) = self.lookup(&hash) {
            return id;
        }
        self.insert(hash, BucketKind::Leaf(leaf))
    }

    /// Get or create the group combining `children` under `mode`.
    ///
    /// Children that are themselves `mode` groups are spliced in, duplicates
    /// are dropped, and a single surviving child is returned as-is instead
    /// of being wrapped.
    pub fn group(
        &mut self,
        mode: Operator,
        children: impl IntoIterator<Item = BucketId>,
    ) -> Result<BucketId> {
        let mut seen = HashSet::new();
        let mut collapsed = Vec::new();

        for child in children {
            let bucket = self.bucket(child);
            if bucket.is_group() && bucket.mode() == mode {
                for &grandchild in bucket.children() {
                    if seen.insert(grandchild) {
                        collapsed.push(grandchild);
                    }
                }
            } else if seen.insert(child) {
                collapsed.push(child);
            }
        }

        match collapsed.len() {
            0 => return Err(Error::EmptyGroup),
            1 => return Ok(collapsed[0]),
            _ => {}
        }

        let mut child_hashes: Vec<&str> = collapsed
            .iter()
            .map(|&child| self.bucket(child).hash())
            .collect();
        child_hashes.sort_unstable();
        let hash = format!("group:{}:({})", mode, child_hashes.join(","));

        if let Some(id) = self.lookup(&hash) {
            return Ok(id);
        }

        let id = self.insert(
            hash,
            BucketKind::Group {
                mode,
                children: collapsed.clone(),
            },
        );
        for child in collapsed {
            self.buckets[child.0].supersets.push(id);
        }
        Ok(id)
    }

    /// One more condition of `bucket` holds for `item`
    pub fn attempt_add(&mut self, bucket: BucketId, item: &K) {
        let node = &mut self.buckets[bucket.0];
        let count = node.increment(item);
        if node.has(item) || !node.should_contain(count) {
            return;
        }
        node.members.insert(item.clone());
        trace!(
            "{} gained a member ({} total)",
            node.hash,
            node.members.len()
        );
        self.notify_add(bucket, item);
    }

    /// One condition of `bucket` stopped holding for `item`
    pub fn attempt_remove(&mut self, bucket: BucketId, item: &K) {
        let node = &mut self.buckets[bucket.0];
        let count = node.decrement(item);
        if !node.has(item) || node.should_contain(count) {
            return;
        }
        node.members.remove(item);
        trace!(
            "{} lost a member ({} left)",
            node.hash,
            node.members.len()
        );
        self.notify_remove(bucket, item);
    }

    /// Drop every condition of `bucket` for `item` in one step
    pub fn clear_item(&mut self, bucket: BucketId, item: &K) {
        let node = &mut self.buckets[bucket.0];
        node.counts.remove(item);
        if node.members.remove(item) {
            trace!(
                "{} cleared a member ({} left)",
                node.hash,
                node.members.len()
            );
            self.notify_remove(bucket, item);
        }
    }

    fn notify_add(&mut self, bucket: BucketId, item: &K) {
        for idx in 0..self.buckets[bucket.0].supersets.len() {
            let superset = self.buckets[bucket.0].supersets[idx];
            self.attempt_add(superset, item);
        }
    }

    fn notify_remove(&mut self, bucket: BucketId, item: &K) {
        for idx in 0..self.buckets[bucket.0].supersets.len() {
            let superset = self.buckets[bucket.0].supersets[idx];
            self.attempt_remove(superset, item);
        }
    }
}
