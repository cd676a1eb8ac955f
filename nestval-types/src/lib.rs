//! Core type definitions for nestval.
//!
//! This crate defines the plain, engine-agnostic types shared by every layer:
//! - [`FieldPath`]: dot-joined address of a field inside a data tree
//! - [`Tree`]: ordered branch/leaf union mirroring the data shape
//! - [`Rule`] / [`RuleSet`]: user predicates attached to a leaf
//! - [`Entry`] / [`FieldError`]: per-leaf validation state
//! - [`ResultNode`]: aggregated result tree with batched leaf operations
//! - [`Options`] / [`OptionOverrides`]: resolved and user-supplied configuration
//!
//! Everything stateful (subscriptions, dirty tracking, rule execution) lives
//! in `nestval-engine`.

mod entry;
mod options;
mod path;
mod result;
mod rule;
mod tree;

pub use entry::{Entry, FieldError};
pub use options::{OptionOverrides, Options, Transform};
pub use path::FieldPath;
pub use result::{Batch, LeafOps, ResultNode};
pub use rule::{Message, Predicate, Rule, RuleContext, RuleFault, RuleSet, RuleTree, Verdict};
pub use tree::Tree;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid field path: {0}")]
    InvalidPath(String),
}
