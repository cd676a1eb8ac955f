//! Ordered branch/leaf trees.
//!
//! Rules, dirty flags, and engine slots all share the same shape: a nested
//! mapping from field name to either a child mapping or a terminal value.
//! The branch/leaf split is an explicit variant, never inferred from the
//! contents of a leaf.

use crate::path::FieldPath;
use indexmap::IndexMap;

/// A tree whose branches map field names to subtrees in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub enum Tree<T> {
    Branch(IndexMap<String, Tree<T>>),
    Leaf(T),
}

impl<T> Tree<T> {
    /// Creates a leaf.
    pub fn leaf(value: impl Into<T>) -> Self {
        Tree::Leaf(value.into())
    }

    /// Creates a branch from `(key, subtree)` pairs, keeping their order.
    pub fn branch<K, I>(children: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Tree<T>)>,
    {
        Tree::Branch(children.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// An empty branch.
    pub fn empty() -> Self {
        Tree::Branch(IndexMap::new())
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Tree::Leaf(_))
    }

    /// Returns the leaf value, if this node is a leaf.
    pub fn as_leaf(&self) -> Option<&T> {
        match self {
            Tree::Leaf(value) => Some(value),
            Tree::Branch(_) => None,
        }
    }

    /// Returns the children, if this node is a branch.
    pub fn children(&self) -> Option<&IndexMap<String, Tree<T>>> {
        match self {
            Tree::Branch(children) => Some(children),
            Tree::Leaf(_) => None,
        }
    }

    /// Walks `path` from this node. The root path returns `self`.
    pub fn get(&self, path: &FieldPath) -> Option<&Tree<T>> {
        path.segments()
            .iter()
            .try_fold(self, |node, key| node.children().and_then(|c| c.get(key)))
    }

    /// Inserts `subtree` at `key` when this node is a branch. Returns the
    /// displaced subtree, or gives `subtree` back when this node is a leaf.
    pub fn insert(&mut self, key: impl Into<String>, subtree: Tree<T>) -> Result<Option<Tree<T>>, Tree<T>> {
        match self {
            Tree::Branch(children) => Ok(children.insert(key.into(), subtree)),
            Tree::Leaf(_) => Err(subtree),
        }
    }

    /// Depth-first, left-to-right list of leaves with their paths.
    pub fn leaves(&self) -> Vec<(FieldPath, &T)> {
        let mut out = Vec::new();
        self.collect_leaves(FieldPath::root(), &mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, path: FieldPath, out: &mut Vec<(FieldPath, &'a T)>) {
        match self {
            Tree::Leaf(value) => out.push((path, value)),
            Tree::Branch(children) => {
                for (key, child) in children {
                    child.collect_leaves(path.child(key.as_str()), out);
                }
            }
        }
    }

    pub fn leaf_count(&self) -> usize {
        match self {
            Tree::Leaf(_) => 1,
            Tree::Branch(children) => children.values().map(Tree::leaf_count).sum(),
        }
    }

    /// Maps every leaf, preserving shape.
    pub fn map<U>(&self, f: &mut impl FnMut(&FieldPath, &T) -> U) -> Tree<U> {
        self.map_at(&FieldPath::root(), f)
    }

    fn map_at<U>(&self, path: &FieldPath, f: &mut impl FnMut(&FieldPath, &T) -> U) -> Tree<U> {
        match self {
            Tree::Leaf(value) => Tree::Leaf(f(path, value)),
            Tree::Branch(children) => Tree::Branch(
                children
                    .iter()
                    .map(|(key, child)| (key.clone(), child.map_at(&path.child(key.as_str()), f)))
                    .collect(),
            ),
        }
    }
}

impl<T> Default for Tree<T> {
    fn default() -> Self {
        Tree::empty()
    }
}
