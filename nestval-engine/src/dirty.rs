//! Dirty tracking.
//!
//! A leaf is dirty once it has been touched, or once a test observes its
//! value differing from the snapshot taken at initialization. Only a reset
//! clears it; the snapshot itself is never retaken.

use crate::slot::LeafSlot;
use nestval_types::{Entry, LeafOps, Tree};
use serde_json::Value;
use std::sync::Arc;
use tracing::trace;

/// Recomputes the dirty flag at the start of a test and returns it.
pub(crate) fn on_test(slot: &LeafSlot, current: &Value, touch_on_test: bool) -> bool {
    let dirty = touch_on_test || slot.is_dirty() || current != slot.snapshot();
    slot.set_dirty(dirty);
    dirty
}

pub(crate) fn touch(slot: &LeafSlot) {
    trace!(path = %slot.path(), "touch");
    slot.set_dirty(true);
}

/// Clears the dirty flag and restores a pristine entry.
pub(crate) fn reset(slot: &LeafSlot) {
    trace!(path = %slot.path(), "reset");
    slot.set_dirty(false);
    slot.replace_entry(|_| Entry::pristine());
}

/// Dirty flags with the shape of the slot tree.
pub(crate) fn dirt(tree: &Tree<Arc<LeafSlot>>) -> Tree<bool> {
    tree.map(&mut |_, slot| slot.is_dirty())
}
