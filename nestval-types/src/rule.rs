//! Validation rules.
//!
//! A rule is a named predicate over a leaf value. Predicates are plain
//! closures; they may answer immediately, report a fault, or hand back a
//! future when the answer needs I/O.

use crate::options::Options;
use crate::tree::Tree;
use futures::future::BoxFuture;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Rules tree: same shape as the data at branch positions, a [`RuleSet`] at each leaf.
pub type RuleTree = Tree<RuleSet>;

/// Signature of a rule predicate.
pub type Predicate = Arc<dyn Fn(&Value, &RuleContext<'_>) -> Verdict + Send + Sync>;

/// A predicate that could not produce an answer.
///
/// Faults never reach the caller of a test; the engine records them as a
/// failing rule and flags the entry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("rule fault: {0}")]
pub struct RuleFault(pub String);

impl RuleFault {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// What a predicate returned.
pub enum Verdict {
    /// Synchronous answer.
    Ready(bool),
    /// The predicate failed to evaluate.
    Fault(RuleFault),
    /// Answer arrives later.
    Deferred(BoxFuture<'static, Result<bool, RuleFault>>),
}

impl Verdict {
    /// Wraps a future as a deferred verdict.
    pub fn deferred<F>(future: F) -> Self
    where
        F: Future<Output = Result<bool, RuleFault>> + Send + 'static,
    {
        Verdict::Deferred(Box::pin(future))
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, Verdict::Deferred(_))
    }
}

impl From<bool> for Verdict {
    fn from(passed: bool) -> Self {
        Verdict::Ready(passed)
    }
}

impl From<Result<bool, RuleFault>> for Verdict {
    fn from(result: Result<bool, RuleFault>) -> Self {
        match result {
            Ok(passed) => Verdict::Ready(passed),
            Err(fault) => Verdict::Fault(fault),
        }
    }
}

impl fmt::Debug for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Ready(passed) => f.debug_tuple("Ready").field(passed).finish(),
            Verdict::Fault(fault) => f.debug_tuple("Fault").field(fault).finish(),
            Verdict::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

/// Everything a predicate can see besides its own value.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    /// The whole data tree.
    pub data: &'a Value,
    /// The whole rules tree.
    pub rules: &'a RuleTree,
    /// The resolved options.
    pub options: &'a Options,
}

/// Error message attached to a failing rule.
#[derive(Clone)]
pub enum Message {
    Static(String),
    Dynamic(Arc<dyn Fn(&Value) -> String + Send + Sync>),
}

impl Message {
    /// Renders the message for the value that failed.
    pub fn render(&self, value: &Value) -> String {
        match self {
            Message::Static(text) => text.clone(),
            Message::Dynamic(f) => f(value),
        }
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Static(text) => f.debug_tuple("Static").field(text).finish(),
            Message::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

/// A named predicate with an optional message.
#[derive(Clone)]
pub struct Rule {
    pub name: String,
    pub test: Predicate,
    pub message: Option<Message>,
}

impl Rule {
    /// Creates a rule from a synchronous predicate.
    ///
    /// The predicate may return `bool` or `Result<bool, RuleFault>`.
    pub fn new<F, V>(name: impl Into<String>, test: F) -> Self
    where
        F: Fn(&Value, &RuleContext<'_>) -> V + Send + Sync + 'static,
        V: Into<Verdict>,
    {
        Self {
            name: name.into(),
            test: Arc::new(move |value: &Value, ctx: &RuleContext<'_>| -> Verdict {
                test(value, ctx).into()
            }),
            message: None,
        }
    }

    /// Creates a rule whose predicate resolves asynchronously.
    ///
    /// The closure runs synchronously and must move whatever it needs out of
    /// its borrowed arguments into the returned future.
    pub fn new_async<F, Fut>(name: impl Into<String>, test: F) -> Self
    where
        F: Fn(&Value, &RuleContext<'_>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<bool, RuleFault>> + Send + 'static,
    {
        Self {
            name: name.into(),
            test: Arc::new(move |value: &Value, ctx: &RuleContext<'_>| -> Verdict {
                Verdict::deferred(test(value, ctx))
            }),
            message: None,
        }
    }

    /// Creates a rule from a predicate that already returns a [`Verdict`].
    pub fn from_predicate(name: impl Into<String>, test: Predicate) -> Self {
        Self {
            name: name.into(),
            test,
            message: None,
        }
    }

    /// Attaches a static message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(Message::Static(message.into()));
        self
    }

    /// Attaches a message computed from the failing value.
    #[must_use]
    pub fn with_message_fn<F>(mut self, message: F) -> Self
    where
        F: Fn(&Value) -> String + Send + Sync + 'static,
    {
        self.message = Some(Message::Dynamic(Arc::new(message)));
        self
    }

    /// Runs the predicate.
    pub fn evaluate(&self, value: &Value, ctx: &RuleContext<'_>) -> Verdict {
        (self.test)(value, ctx)
    }

    /// Renders this rule's message for `value`, if it has one.
    pub fn message_for(&self, value: &Value) -> Option<String> {
        self.message.as_ref().map(|m| m.render(value))
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

/// Ordered rules attached to one leaf.
///
/// A leaf declared with a single rule normalizes to a one-element set. An
/// empty set means no rules are configured for the leaf.
#[derive(Debug, Clone, Default)]
pub struct RuleSet(Vec<Rule>);

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self(rules)
    }

    pub fn none() -> Self {
        Self(Vec::new())
    }

    pub fn rules(&self) -> &[Rule] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.0.iter()
    }
}

impl From<Rule> for RuleSet {
    fn from(rule: Rule) -> Self {
        Self(vec![rule])
    }
}

impl From<Vec<Rule>> for RuleSet {
    fn from(rules: Vec<Rule>) -> Self {
        Self(rules)
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
