use serde::{Deserialize, Serialize};

/// One failing rule on a leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Name of the rule that failed.
    pub name: String,
    /// Rendered message, if the rule declares one.
    pub message: Option<String>,
}

impl FieldError {
    pub fn new(name: impl Into<String>, message: Option<String>) -> Self {
        Self {
            name: name.into(),
            message,
        }
    }
}

/// Validation state of a single leaf.
///
/// Replaced wholesale by every test and reset; a pristine entry is the
/// [`Default`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    #[serde(rename = "$invalid")]
    pub invalid: bool,
    #[serde(rename = "$errors")]
    pub errors: Vec<FieldError>,
    #[serde(rename = "$messages")]
    pub messages: Vec<String>,
    #[serde(rename = "$pending")]
    pub pending: bool,
    /// Set when a predicate faulted during the last test.
    #[serde(rename = "$fault")]
    pub faulted: bool,
}

impl Entry {
    /// A pristine entry: valid, no errors, not pending.
    pub fn pristine() -> Self {
        Self::default()
    }

    /// Returns a copy of `self` with the outcome of a test applied.
    ///
    /// `pending` is carried over from `self`.
    #[must_use]
    pub fn with_outcome(&self, errors: Vec<FieldError>, messages: Vec<String>, faulted: bool) -> Self {
        Self {
            invalid: !errors.is_empty(),
            errors,
            messages,
            pending: self.pending,
            faulted,
        }
    }
}
