//! Error types for the engine.

use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors surfaced by the engine's public accessors.
///
/// Validation itself never fails: rule failures and predicate faults are
/// reported through the result tree.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The path does not name a node of the rules tree.
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// The path could not be parsed.
    #[error(transparent)]
    Types(#[from] nestval_types::Error),
}
