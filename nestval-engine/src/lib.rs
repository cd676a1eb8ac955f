//! Nested-structure validation engine.
//!
//! Given a data tree and a parallel tree of rules, the engine maintains a
//! mirrored tree of per-field validation state and aggregates it into
//! branch- and root-level summaries.
//!
//! # Architecture
//!
//! - **Initializer**: mirrors the rules tree into per-leaf slots, each holding
//!   a snapshot of its data value, a dirty flag, and an entry
//! - **Executor**: runs a leaf's rules under the lazy / first-error /
//!   touch-on-test policies; faulting predicates fail closed
//! - **Dirty tracker**: touch, reset, and the dirty recomputation done by tests
//! - **Aggregator**: pure fold from slots to a [`ResultNode`] tree
//! - **Adapter**: data watches driving auto-test/auto-touch, rebuilds on
//!   rules/options change, and the revision channel
//!
//! ## Leaf lifecycle
//!
//! 1. **Pristine**: built by the initializer, valid and clean
//! 2. **Dirty**: touched, or tested after its value changed
//! 3. **Pending**: awaiting a deferred predicate during a test
//! 4. **Valid / Invalid**: outcome of the last test
//! 5. **Reset**: back to pristine; a rules or options change resets every leaf

mod adapter;
mod aggregator;
mod dirty;
mod error;
mod executor;
mod initializer;
mod observable;
mod slot;
mod validator;

pub use error::{EngineError, EngineResult};
pub use observable::{Observable, Subscription};
pub use validator::Validator;

pub use nestval_types::{
    Batch, Entry, FieldError, FieldPath, LeafOps, Message, OptionOverrides, Options, Predicate,
    ResultNode, Rule, RuleContext, RuleFault, RuleSet, RuleTree, Transform, Tree, Verdict,
};
