//! Rule execution for a single leaf.
//!
//! Evaluation order follows the rule set's declaration order. Faulting
//! predicates (fault verdicts, failed futures, and panics) count as failed
//! rules; nothing escapes to the caller.

use crate::dirty;
use crate::slot::LeafSlot;
use futures::FutureExt;
use nestval_types::{FieldError, LeafOps, Rule, RuleContext, RuleFault, Verdict};
use serde_json::Value;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::{trace, warn};

/// Values captured by [`prepare`] for one evaluation.
pub(crate) struct Prepared {
    data: Value,
    value: Value,
}

/// Tests one leaf and replaces its entry with the outcome.
pub(crate) async fn run(slot: &LeafSlot) {
    if let Some(prepared) = prepare(slot) {
        evaluate_rules(slot, prepared).await;
    }
}

/// The synchronous part of a test: updates the dirty flag and decides
/// whether the rules need evaluating at all.
///
/// Returns `None` when the leaf is skipped by lazy mode or has no rules; in
/// the latter case the entry has already been marked valid.
pub(crate) fn prepare(slot: &LeafSlot) -> Option<Prepared> {
    let options = &slot.context().options;
    let data = slot.context().data.get();
    let value = slot.path().resolve(&data);

    let is_dirty = dirty::on_test(slot, &value, options.touch_on_test);
    if options.lazy && !is_dirty {
        trace!(path = %slot.path(), "lazy: skipping clean field");
        return None;
    }

    if slot.rules().is_empty() {
        slot.replace_entry(|entry| entry.with_outcome(Vec::new(), Vec::new(), false));
        return None;
    }

    Some(Prepared { data, value })
}

/// Evaluates every rule of a prepared leaf and replaces its entry.
pub(crate) async fn evaluate_rules(slot: &LeafSlot, prepared: Prepared) {
    let ctx = slot.context();
    let options = &ctx.options;
    let Prepared { data, value } = prepared;
    let rule_ctx = RuleContext {
        data: &data,
        rules: &ctx.rules,
        options,
    };
    let mut errors = Vec::new();
    let mut messages = Vec::new();
    let mut faulted = false;

    for rule in slot.rules() {
        let passed = match settle(slot, evaluate(rule, &value, &rule_ctx)).await {
            Ok(passed) => passed,
            Err(fault) => {
                warn!(path = %slot.path(), rule = %rule.name, %fault, "rule faulted; counting as failed");
                faulted = true;
                false
            }
        };
        if passed {
            continue;
        }

        let message = rule.message_for(&value);
        if let Some(text) = message.as_deref().filter(|m| !m.is_empty()) {
            messages.push(text.to_string());
        }
        errors.push(FieldError::new(rule.name.clone(), message));

        if options.first_error {
            break;
        }
    }

    trace!(path = %slot.path(), errors = errors.len(), "field tested");
    slot.replace_entry(|entry| entry.with_outcome(errors, messages, faulted));
}

/// Calls the predicate, turning a panic into a fault.
fn evaluate(rule: &Rule, value: &Value, ctx: &RuleContext<'_>) -> Verdict {
    panic::catch_unwind(AssertUnwindSafe(|| rule.evaluate(value, ctx)))
        .unwrap_or_else(|payload| Verdict::Fault(panic_fault(payload)))
}

/// Resolves a verdict, marking the slot pending while a deferred one is awaited.
async fn settle(slot: &LeafSlot, verdict: Verdict) -> Result<bool, RuleFault> {
    match verdict {
        Verdict::Ready(passed) => Ok(passed),
        Verdict::Fault(fault) => Err(fault),
        Verdict::Deferred(future) => {
            slot.set_pending(true);
            let outcome = AssertUnwindSafe(future).catch_unwind().await;
            slot.set_pending(false);
            outcome.unwrap_or_else(|payload| Err(panic_fault(payload)))
        }
    }
}

fn panic_fault(payload: Box<dyn Any + Send>) -> RuleFault {
    let reason = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "predicate panicked".to_string());
    RuleFault::new(reason)
}
