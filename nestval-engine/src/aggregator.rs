//! Result aggregation.
//!
//! A pure fold over the slot tree: every call reads the current entries and
//! dirty flags and produces a fresh [`ResultNode`] tree. No side effects.

use crate::slot::LeafSlot;
use nestval_types::{LeafOps, ResultNode, Tree};
use std::sync::Arc;

pub(crate) fn fold(tree: &Tree<Arc<LeafSlot>>) -> ResultNode {
    match tree {
        Tree::Leaf(slot) => {
            let handle: Arc<dyn LeafOps> = Arc::clone(slot) as Arc<dyn LeafOps>;
            ResultNode::leaf(&slot.entry(), slot.is_dirty(), handle)
        }
        Tree::Branch(children) => {
            let mut node = ResultNode::branch();
            for (key, child) in children {
                node.absorb(key.clone(), fold(child));
            }
            node
        }
    }
}
