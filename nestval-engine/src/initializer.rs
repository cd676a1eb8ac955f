//! Builds the slot tree for one rules/options snapshot.

use crate::adapter;
use crate::observable::Subscription;
use crate::slot::{Context, LeafSlot};
use nestval_types::{FieldPath, Tree};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Everything built by one initialization.
///
/// Dropping a generation unsubscribes its data watches; slots still
/// referenced by in-flight tests keep running but no longer affect results.
pub(crate) struct Generation {
    pub ctx: Arc<Context>,
    pub tree: Tree<Arc<LeafSlot>>,
    watches: HashMap<FieldPath, Subscription>,
}

impl Generation {
    pub fn watch_count(&self) -> usize {
        self.watches.len()
    }
}

/// Mirrors `ctx.rules` into a slot tree, snapshotting each leaf's current
/// data value and registering one data watch per leaf.
pub(crate) fn build(ctx: Arc<Context>) -> Generation {
    let data = ctx.data.get();
    let tree = ctx.rules.map(&mut |path, rules| {
        Arc::new(LeafSlot::new(
            path.clone(),
            rules.clone(),
            path.resolve(&data),
            Arc::clone(&ctx),
        ))
    });

    let watches: HashMap<FieldPath, Subscription> = tree
        .leaves()
        .into_iter()
        .map(|(path, slot)| {
            let watch = adapter::watch_leaf(&ctx.data, slot);
            (path, watch)
        })
        .collect();

    debug!(leaves = watches.len(), options = ?ctx.options, "validation tree initialized");
    Generation { ctx, tree, watches }
}
