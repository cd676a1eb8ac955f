//! Aggregated validation results.
//!
//! A [`ResultNode`] exists for every branch and leaf of the rules tree. Each
//! node summarizes all leaves beneath it and carries a [`Batch`] of their
//! operation handles, so `test`/`reset`/`touch` can be issued at any level.

use crate::entry::{Entry, FieldError};
use crate::path::FieldPath;
use futures::future::{join_all, BoxFuture};
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Operations on a single leaf, implemented by the engine.
pub trait LeafOps: Send + Sync {
    /// Path of the leaf this handle is bound to.
    fn path(&self) -> &FieldPath;

    /// Runs the leaf's rules. Resolves once every rule has settled.
    fn test(self: Arc<Self>) -> BoxFuture<'static, ()>;

    /// Clears dirty state and restores a pristine entry.
    fn reset(&self);

    /// Marks the leaf dirty.
    fn touch(&self);
}

/// Collected leaf handles of a subtree.
#[derive(Clone, Default)]
pub struct Batch {
    handles: Vec<Arc<dyn LeafOps>>,
}

impl Batch {
    pub fn new(handles: Vec<Arc<dyn LeafOps>>) -> Self {
        Self { handles }
    }

    pub fn push(&mut self, handle: Arc<dyn LeafOps>) {
        self.handles.push(handle);
    }

    pub fn extend(&mut self, other: &Batch) {
        self.handles.extend(other.handles.iter().cloned());
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn paths(&self) -> Vec<FieldPath> {
        self.handles.iter().map(|h| h.path().clone()).collect()
    }

    /// Tests every leaf concurrently; resolves when all have settled.
    pub async fn test(&self) {
        join_all(self.handles.iter().map(|h| Arc::clone(h).test())).await;
    }

    pub fn reset(&self) {
        for handle in &self.handles {
            handle.reset();
        }
    }

    pub fn touch(&self) {
        for handle in &self.handles {
            handle.touch();
        }
    }
}

impl fmt::Debug for Batch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.handles.iter().map(|h| h.path().to_string())).finish()
    }
}

/// One node of the aggregated result tree.
///
/// For a leaf the flags and lists are its own entry; for a branch they are
/// folded over all descendant leaves (flags OR-ed, lists concatenated in
/// depth-first field order).
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResultNode {
    #[serde(rename = "$invalid")]
    pub invalid: bool,
    #[serde(rename = "$dirty")]
    pub dirty: bool,
    #[serde(rename = "$pending")]
    pub pending: bool,
    #[serde(rename = "$fault")]
    pub faulted: bool,
    #[serde(rename = "$errors")]
    pub errors: Vec<FieldError>,
    #[serde(rename = "$messages")]
    pub messages: Vec<String>,
    #[serde(flatten)]
    pub children: IndexMap<String, ResultNode>,
    #[serde(skip)]
    leaf: bool,
    #[serde(skip)]
    ops: Batch,
}

impl ResultNode {
    /// An empty branch summary.
    pub fn branch() -> Self {
        Self::default()
    }

    /// A leaf summary built from its entry, dirty flag, and handle.
    pub fn leaf(entry: &Entry, dirty: bool, handle: Arc<dyn LeafOps>) -> Self {
        Self {
            invalid: entry.invalid,
            dirty,
            pending: entry.pending,
            faulted: entry.faulted,
            errors: entry.errors.clone(),
            messages: entry.messages.clone(),
            children: IndexMap::new(),
            leaf: true,
            ops: Batch::new(vec![handle]),
        }
    }

    /// Folds `child` into this summary and records it under `key`.
    pub fn absorb(&mut self, key: impl Into<String>, child: ResultNode) {
        self.invalid |= child.invalid;
        self.dirty |= child.dirty;
        self.pending |= child.pending;
        self.faulted |= child.faulted;
        self.errors.extend(child.errors.iter().cloned());
        self.messages.extend(child.messages.iter().cloned());
        self.ops.extend(&child.ops);
        self.children.insert(key.into(), child);
    }

    pub fn is_leaf(&self) -> bool {
        self.leaf
    }

    /// Direct child by field name.
    pub fn get(&self, key: &str) -> Option<&ResultNode> {
        self.children.get(key)
    }

    /// Descendant by path. The root path returns `self`.
    pub fn at(&self, path: &FieldPath) -> Option<&ResultNode> {
        path.segments()
            .iter()
            .try_fold(self, |node, key| node.children.get(key))
    }

    /// Number of leaves summarized by this node.
    pub fn leaf_count(&self) -> usize {
        self.ops.len()
    }

    /// The leaf handles summarized by this node.
    pub fn batch(&self) -> &Batch {
        &self.ops
    }

    /// Tests every leaf under this node concurrently.
    pub async fn test(&self) {
        self.ops.test().await;
    }

    pub fn reset(&self) {
        self.ops.reset();
    }

    pub fn touch(&self) {
        self.ops.touch();
    }
}
