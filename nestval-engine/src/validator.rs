//! The public entry point.

use crate::adapter::Notifier;
use crate::aggregator;
use crate::dirty;
use crate::error::{EngineError, EngineResult};
use crate::initializer::{self, Generation};
use crate::observable::{Observable, Subscription};
use crate::slot::Context;
use nestval_types::{FieldPath, OptionOverrides, Options, ResultNode, RuleTree, Tree};
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::{Arc, Weak};
use tokio::sync::watch;
use tracing::{debug, warn};

struct Inner {
    data: Observable<Value>,
    rules: Observable<RuleTree>,
    options: Observable<OptionOverrides>,
    notifier: Arc<Notifier>,
    generation: RwLock<Generation>,
}

impl Inner {
    fn snapshot(
        data: &Observable<Value>,
        rules: &Observable<RuleTree>,
        options: &Observable<OptionOverrides>,
        notifier: &Arc<Notifier>,
    ) -> Generation {
        initializer::build(Arc::new(Context {
            data: data.clone(),
            rules: rules.get(),
            options: Options::resolve(&options.get()),
            notifier: Arc::clone(notifier),
        }))
    }

    /// Discards all slot state and rebuilds it from the current sources.
    fn initialize(&self) {
        let next = Self::snapshot(&self.data, &self.rules, &self.options, &self.notifier);
        let previous = std::mem::replace(&mut *self.generation.write(), next);
        // Unsubscribe outside the lock.
        drop(previous);
        self.notifier.bump();
    }
}

/// Validates a data tree against a parallel rules tree.
///
/// Each source may be a plain value or an [`Observable`] shared with the
/// caller. Writing to the rules or options source rebuilds all validation
/// state; writing to the data source drives auto-test/auto-touch for the
/// leaves whose values changed.
///
/// ```
/// use nestval_engine::{Rule, RuleContext, RuleTree, Tree, Validator};
/// use serde_json::{json, Value};
///
/// # tokio_test_block(async {
/// let rules: RuleTree = Tree::branch([(
///     "name",
///     Tree::leaf(
///         Rule::new("required", |v: &Value, _: &RuleContext<'_>| {
///             v.as_str().is_some_and(|s| !s.is_empty())
///         })
///         .with_message("required"),
///     ),
/// )]);
/// let validator = Validator::with_rules(json!({"name": ""}), rules);
///
/// validator.result().test().await;
/// assert!(validator.result().invalid);
/// # });
/// # fn tokio_test_block(f: impl std::future::Future<Output = ()>) {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
pub struct Validator {
    inner: Arc<Inner>,
    _watches: Vec<Subscription>,
}

impl Validator {
    pub fn new(
        data: impl Into<Observable<Value>>,
        rules: impl Into<Observable<RuleTree>>,
        options: impl Into<Observable<OptionOverrides>>,
    ) -> Self {
        let data = data.into();
        let rules = rules.into();
        let options = options.into();
        let notifier = Arc::new(Notifier::new());
        let generation = Inner::snapshot(&data, &rules, &options, &notifier);

        let inner = Arc::new(Inner {
            data,
            rules,
            options,
            notifier,
            generation: RwLock::new(generation),
        });

        let watches = vec![
            Self::reinitialize_on_change(&inner, &inner.rules, "rules updated"),
            Self::reinitialize_on_change(&inner, &inner.options, "options updated"),
            inner.data.subscribe(|_, new| debug!(data = %new, "data updated")),
        ];

        Self {
            inner,
            _watches: watches,
        }
    }

    /// Creates a validator with default options.
    pub fn with_rules(data: impl Into<Observable<Value>>, rules: impl Into<Observable<RuleTree>>) -> Self {
        Self::new(data, rules, OptionOverrides::default())
    }

    fn reinitialize_on_change<T>(inner: &Arc<Inner>, source: &Observable<T>, label: &'static str) -> Subscription
    where
        T: Clone + Send + Sync + 'static,
    {
        let weak: Weak<Inner> = Arc::downgrade(inner);
        source.subscribe(move |_, _| {
            debug!("{label}; rebuilding validation state");
            if let Some(inner) = weak.upgrade() {
                inner.initialize();
            }
        })
    }

    /// Aggregates the current validation state into a result tree.
    pub fn result(&self) -> ResultNode {
        aggregator::fold(&self.inner.generation.read().tree)
    }

    /// The externally observed result: the configured transform applied to
    /// [`result`](Self::result), or the result serialized as JSON.
    pub fn output(&self) -> Value {
        let result = self.result();
        let ctx = Arc::clone(&self.inner.generation.read().ctx);
        match &ctx.options.transform {
            Some(transform) => transform(&result, &ctx.data.get(), &ctx.rules, &ctx.options),
            None => serde_json::to_value(&result).unwrap_or_else(|e| {
                warn!(error = %e, "result serialization failed");
                Value::Null
            }),
        }
    }

    /// Result node at a dot-joined path.
    pub fn field(&self, path: &str) -> EngineResult<ResultNode> {
        let path = FieldPath::parse(path)?;
        self.result()
            .at(&path)
            .cloned()
            .ok_or_else(|| EngineError::UnknownField(path.to_string()))
    }

    /// Dirty flags shaped like the rules tree.
    pub fn dirt(&self) -> Tree<bool> {
        dirty::dirt(&self.inner.generation.read().tree)
    }

    /// The options in effect for the current validation state.
    pub fn options(&self) -> Options {
        self.inner.generation.read().ctx.options.clone()
    }

    /// The data source.
    pub fn data(&self) -> &Observable<Value> {
        &self.inner.data
    }

    /// The rules source. Writing to it rebuilds validation state.
    pub fn rules(&self) -> &Observable<RuleTree> {
        &self.inner.rules
    }

    /// The options source. Writing to it rebuilds validation state.
    pub fn option_overrides(&self) -> &Observable<OptionOverrides> {
        &self.inner.options
    }

    /// Number of per-leaf data watches currently registered.
    pub fn watch_count(&self) -> usize {
        self.inner.generation.read().watch_count()
    }

    /// Receiver that is marked changed whenever validation state changes.
    pub fn changes(&self) -> watch::Receiver<u64> {
        self.inner.notifier.subscribe()
    }

    /// Current revision; increases on every state change.
    pub fn revision(&self) -> u64 {
        self.inner.notifier.revision()
    }

    /// Waits until every auto-test spawned so far has finished.
    pub async fn settle(&self) {
        self.inner.notifier.settle().await;
    }

    /// Rebuilds validation state from the current sources.
    pub fn reinitialize(&self) {
        self.inner.initialize();
    }
}

impl std::fmt::Debug for Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validator")
            .field("revision", &self.revision())
            .field("watches", &self.watch_count())
            .finish_non_exhaustive()
    }
}
