//! Per-leaf engine state.
//!
//! A [`LeafSlot`] owns everything the engine tracks for one rules leaf: the
//! baseline snapshot of its data value, its dirty flag, and its current
//! [`Entry`]. Slots of one initialization share a [`Context`].

use crate::adapter::Notifier;
use crate::observable::Observable;
use crate::{dirty, executor};
use futures::future::BoxFuture;
use nestval_types::{Entry, FieldPath, LeafOps, Options, RuleSet, RuleTree};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Snapshot shared by every slot built in one initialization.
pub(crate) struct Context {
    pub data: Observable<Value>,
    pub rules: RuleTree,
    pub options: Options,
    pub notifier: Arc<Notifier>,
}

pub(crate) struct LeafSlot {
    path: FieldPath,
    rules: RuleSet,
    snapshot: Value,
    dirty: AtomicBool,
    entry: Mutex<Entry>,
    ctx: Arc<Context>,
}

impl LeafSlot {
    pub fn new(path: FieldPath, rules: RuleSet, snapshot: Value, ctx: Arc<Context>) -> Self {
        Self {
            path,
            rules,
            snapshot,
            dirty: AtomicBool::new(false),
            entry: Mutex::new(Entry::pristine()),
            ctx,
        }
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Data value captured when the slot was built.
    pub fn snapshot(&self) -> &Value {
        &self.snapshot
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    pub fn set_dirty(&self, dirty: bool) {
        if self.dirty.swap(dirty, Ordering::SeqCst) != dirty {
            self.ctx.notifier.bump();
        }
    }

    /// Clone of the current entry.
    pub fn entry(&self) -> Entry {
        self.entry.lock().clone()
    }

    /// Replaces the entry with `f(current)`.
    pub fn replace_entry(&self, f: impl FnOnce(&Entry) -> Entry) {
        {
            let mut entry = self.entry.lock();
            let next = f(&entry);
            *entry = next;
        }
        self.ctx.notifier.bump();
    }

    pub fn set_pending(&self, pending: bool) {
        self.entry.lock().pending = pending;
        self.ctx.notifier.bump();
    }
}

impl LeafOps for LeafSlot {
    fn path(&self) -> &FieldPath {
        &self.path
    }

    fn test(self: Arc<Self>) -> BoxFuture<'static, ()> {
        Box::pin(async move { executor::run(&self).await })
    }

    fn reset(&self) {
        dirty::reset(self);
    }

    fn touch(&self) {
        dirty::touch(self);
    }
}
