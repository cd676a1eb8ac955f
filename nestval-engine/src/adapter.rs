//! Bridge between source changes and engine side effects.
//!
//! Aggregation is a pure fold that can run at any time; everything with side
//! effects lives here: per-leaf data watches that drive auto-test and
//! auto-touch, and the revision channel consumers wait on.

use crate::executor;
use crate::observable::{Observable, Subscription};
use crate::slot::LeafSlot;
use futures::FutureExt;
use futures::future::BoxFuture;
use nestval_types::LeafOps;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

/// Revision broadcast plus bookkeeping for spawned auto-tests.
pub(crate) struct Notifier {
    revision: watch::Sender<u64>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Notifier {
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            revision,
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Signals that some slot changed.
    pub fn bump(&self) {
        self.revision.send_modify(|rev| *rev += 1);
        debug!(revision = *self.revision.borrow(), "result updated");
    }

    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Runs `task` on the ambient Tokio runtime.
    ///
    /// Hands the task back when no runtime is available.
    pub fn spawn(&self, task: BoxFuture<'static, ()>) -> Result<(), BoxFuture<'static, ()>> {
        let Ok(handle) = Handle::try_current() else {
            return Err(task);
        };
        let mut tasks = self.tasks.lock();
        tasks.retain(|t| !t.is_finished());
        tasks.push(handle.spawn(task));
        Ok(())
    }

    /// Waits for every spawned task, including ones spawned while waiting.
    pub async fn settle(&self) {
        loop {
            let pending = std::mem::take(&mut *self.tasks.lock());
            if pending.is_empty() {
                return;
            }
            for task in pending {
                if let Err(e) = task.await {
                    warn!(error = %e, "auto-test task did not complete");
                }
            }
        }
    }
}

/// Watches the data value of one leaf.
///
/// The subscription holds the slot weakly; once the slot's generation is
/// discarded the listener becomes a no-op until it is unsubscribed.
pub(crate) fn watch_leaf(data: &Observable<Value>, slot: &Arc<LeafSlot>) -> Subscription {
    let weak = Arc::downgrade(slot);
    let path = slot.path().clone();
    data.subscribe(move |old, new| {
        if path.lookup(old) == path.lookup(new) {
            return;
        }
        if let Some(slot) = weak.upgrade() {
            on_leaf_change(slot);
        }
    })
}

fn on_leaf_change(slot: Arc<LeafSlot>) {
    let options = &slot.context().options;
    trace!(path = %slot.path(), auto_test = options.auto_test, auto_touch = options.auto_touch, "field changed");

    // The dirty update and lazy check of the test see the leaf before the touch.
    if options.auto_test
        && let Some(prepared) = executor::prepare(&slot)
    {
        let leaf = Arc::clone(&slot);
        let task = async move { executor::evaluate_rules(&leaf, prepared).await }.boxed();
        if let Err(task) = slot.context().notifier.spawn(task) {
            run_inline(&slot, task);
        }
    }
    if options.auto_touch {
        slot.touch();
    }
}

/// Polls an auto-test once on the caller's thread.
///
/// Rules that answer immediately complete; a rule still waiting on a
/// deferred verdict is abandoned and the entry keeps its previous outcome.
fn run_inline(slot: &LeafSlot, task: BoxFuture<'static, ()>) {
    if task.now_or_never().is_none() {
        slot.set_pending(false);
        warn!(path = %slot.path(), "no async runtime available; deferred rule skipped");
    }
}
