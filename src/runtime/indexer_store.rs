//! Last-written values of indexer slots, keyed by concrete argument tuples.
//!
//! The store is a trie with one level per argument position. Null keys are
//! routed to a dedicated child per level instead of the keyed map.

use crate::value::Value;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

#[derive(Default)]
struct Node {
    value: RwLock<Option<Value>>,
    children: RwLock<HashMap<Value, Arc<Node>>>,
    null_child: OnceLock<Arc<Node>>,
}

impl Node {
    fn child(&self, key: &Value) -> Option<Arc<Node>> {
        if key.is_null() {
            return self.null_child.get().cloned();
        }
        self.children.read().get(key).cloned()
    }

    fn child_or_insert(&self, key: &Value) -> Arc<Node> {
        if key.is_null() {
            return Arc::clone(self.null_child.get_or_init(Arc::default));
        }
        if let Some(existing) = self.children.read().get(key) {
            return Arc::clone(existing);
        }
        let mut children = self.children.write();
        Arc::clone(children.entry(key.clone()).or_default())
    }

    fn populated(&self) -> usize {
        let own = usize::from(self.value.read().is_some());
        let keyed: usize = self
            .children
            .read()
            .values()
            .map(|child| child.populated())
            .sum();
        let null = self.null_child.get().map_or(0, |child| child.populated());
        own + keyed + null
    }
}

#[derive(Default)]
pub struct IndexerValueStore {
    root: Arc<Node>,
}

impl IndexerValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn leaf(&self, key: &[Value]) -> Arc<Node> {
        key.iter()
            .fold(Arc::clone(&self.root), |node, k| node.child_or_insert(k))
    }

    fn find(&self, key: &[Value]) -> Option<Arc<Node>> {
        key.iter()
            .try_fold(Arc::clone(&self.root), |node, k| node.child(k))
    }

    /// Return the stored value, computing and storing `factory()` when absent.
    ///
    /// The factory runs without holding any lock. If another caller fills the
    /// slot first, its value wins.
    pub fn get_or_create(&self, key: &[Value], factory: impl FnOnce() -> Value) -> Value {
        let leaf = self.leaf(key);
        if let Some(existing) = leaf.value.read().clone() {
            return existing;
        }
        let fresh = factory();
        let mut slot = leaf.value.write();
        slot.get_or_insert(fresh).clone()
    }

    /// Overwrite the value of a slot.
    pub fn update(&self, key: &[Value], value: Value) {
        *self.leaf(key).value.write() = Some(value);
    }

    /// Read a slot without creating it.
    pub fn get(&self, key: &[Value]) -> Option<Value> {
        self.find(key)?.value.read().clone()
    }

    /// Number of slots holding a value.
    pub fn len(&self) -> usize {
        self.root.populated()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
