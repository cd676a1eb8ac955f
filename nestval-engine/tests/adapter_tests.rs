use nestval_engine::{Observable, OptionOverrides, Rule, RuleContext, RuleFault, RuleTree, Tree, Validator};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn positive() -> Rule {
    Rule::new("positive", |v: &Value, _: &RuleContext<'_>| v.as_i64().is_some_and(|n| n > 0))
        .with_message("must be positive")
}

fn rules() -> RuleTree {
    Tree::branch([
        ("a", Tree::leaf(positive())),
        ("group", Tree::branch([("b", Tree::leaf(positive()))])),
    ])
}

fn data() -> Value {
    json!({"a": 1, "group": {"b": 2}})
}

// ── Auto-touch ───────────────────────────────────────────────────

#[tokio::test]
async fn auto_touch_marks_only_the_changed_leaf() {
    init_tracing();
    let validator = Validator::new(data(), rules(), OptionOverrides::new().auto_touch(true));

    validator.data().update(|d| d["group"]["b"] = json!(5));

    assert!(validator.field("group.b").unwrap().dirty);
    assert!(validator.field("group").unwrap().dirty);
    assert!(!validator.field("a").unwrap().dirty);
    assert!(!validator.result().invalid);
}

#[tokio::test]
async fn rewriting_an_equal_value_does_not_trigger() {
    let validator = Validator::new(data(), rules(), OptionOverrides::new().auto_touch(true));

    validator.data().set(data());

    assert!(!validator.result().dirty);
}

#[tokio::test]
async fn data_changes_without_auto_options_have_no_effect() {
    let validator = Validator::with_rules(data(), rules());

    validator.data().update(|d| d["a"] = json!(-1));
    validator.settle().await;

    let result = validator.result();
    assert!(!result.dirty);
    assert!(!result.invalid);
}

// ── Auto-test ────────────────────────────────────────────────────

#[tokio::test]
async fn auto_test_validates_the_changed_leaf() {
    init_tracing();
    let validator = Validator::new(data(), rules(), OptionOverrides::new().auto_test(true));

    validator.data().update(|d| d["a"] = json!(-1));
    validator.settle().await;

    let a = validator.field("a").unwrap();
    assert!(a.invalid);
    assert!(a.dirty);
    assert_eq!(a.messages, vec!["must be positive".to_string()]);
    assert!(!validator.field("group.b").unwrap().invalid);
}

#[tokio::test]
async fn auto_test_with_lazy_still_runs_for_changed_leaf() {
    let options = OptionOverrides::new().auto_test(true).lazy(true);
    let validator = Validator::new(data(), rules(), options);

    validator.data().update(|d| d["group"]["b"] = json!(0));
    validator.settle().await;

    assert!(validator.field("group.b").unwrap().invalid);
}

#[tokio::test]
async fn lazy_auto_test_skips_value_reverted_after_reset() {
    let never = Rule::new("never", |_: &Value, _: &RuleContext<'_>| false);
    let rules: RuleTree = Tree::branch([("a", Tree::leaf(never))]);
    let options = OptionOverrides::new().lazy(true).auto_test(true).auto_touch(true);
    let validator = Validator::new(json!({"a": 1}), rules, options);

    validator.data().set(json!({"a": 2}));
    validator.settle().await;
    assert!(validator.field("a").unwrap().invalid);

    validator.field("a").unwrap().reset();
    validator.data().set(json!({"a": 1}));
    validator.settle().await;

    // The test sees the leaf clean and skips; the touch lands afterwards.
    let a = validator.field("a").unwrap();
    assert!(a.dirty);
    assert!(!a.invalid);
    assert!(a.errors.is_empty());
}

#[test]
fn auto_test_without_runtime_runs_ready_rules_inline() {
    let options = OptionOverrides::new().auto_test(true).auto_touch(true);
    let validator = Validator::new(data(), rules(), options);

    validator.data().update(|d| d["a"] = json!(-1));

    let a = validator.field("a").unwrap();
    assert!(a.dirty);
    assert!(a.invalid);
    assert_eq!(a.messages, vec!["must be positive".to_string()]);
    assert!(!validator.field("group.b").unwrap().invalid);
}

#[test]
fn auto_test_without_runtime_skips_deferred_rules() {
    let remote = Rule::new_async("remote", |_: &Value, _: &RuleContext<'_>| {
        std::future::pending::<Result<bool, RuleFault>>()
    });
    let rules: RuleTree = Tree::branch([("a", Tree::leaf(remote))]);
    let validator = Validator::new(data(), rules, OptionOverrides::new().auto_test(true));

    validator.data().update(|d| d["a"] = json!(-1));

    let a = validator.field("a").unwrap();
    assert!(a.dirty);
    assert!(!a.pending);
    assert!(!a.invalid);
}

// ── Subscriptions ────────────────────────────────────────────────

#[tokio::test]
async fn shared_data_source_drives_the_validator() {
    let source = Observable::new(data());
    let validator = Validator::new(source.clone(), rules(), OptionOverrides::new().auto_test(true));

    source.update(|d| d["a"] = json!(0));
    validator.settle().await;

    assert!(validator.result().invalid);
}

#[tokio::test]
async fn rebuild_replaces_leaf_watches() {
    let source = Observable::new(data());
    let validator = Validator::with_rules(source.clone(), rules());
    // One watch per leaf plus the validator's own data log.
    assert_eq!(validator.watch_count(), 2);
    assert_eq!(source.listener_count(), 3);

    validator.rules().set(Tree::branch([
        ("a", Tree::leaf(positive())),
        ("c", Tree::leaf(positive())),
        ("d", Tree::leaf(positive())),
    ]));

    assert_eq!(validator.watch_count(), 3);
    assert_eq!(source.listener_count(), 4);
}

#[tokio::test]
async fn dropping_validator_unsubscribes() {
    let source = Observable::new(data());
    let rule_source = Observable::new(rules());
    let validator = Validator::with_rules(source.clone(), rule_source.clone());
    assert!(source.listener_count() > 0);
    assert_eq!(rule_source.listener_count(), 1);

    drop(validator);

    assert_eq!(source.listener_count(), 0);
    assert_eq!(rule_source.listener_count(), 0);
}

#[tokio::test]
async fn options_source_rebuilds_with_new_policy() {
    let option_source = Observable::new(OptionOverrides::new());
    let validator = Validator::new(data(), rules(), option_source.clone());

    option_source.set(OptionOverrides::new().auto_touch(true));
    validator.data().update(|d| d["a"] = json!(3));

    assert!(validator.field("a").unwrap().dirty);
}

// ── Revisions ────────────────────────────────────────────────────

#[tokio::test]
async fn state_changes_mark_receivers_changed() {
    let validator = Validator::with_rules(data(), rules());
    let mut changes = validator.changes();
    let start = validator.revision();
    changes.borrow_and_update();

    validator.field("a").unwrap().touch();

    assert!(changes.has_changed().unwrap());
    assert!(validator.revision() > start);
    changes.changed().await.unwrap();
    assert_eq!(*changes.borrow_and_update(), validator.revision());
}

#[tokio::test]
async fn touching_a_dirty_leaf_again_is_silent() {
    let validator = Validator::with_rules(data(), rules());
    validator.field("a").unwrap().touch();
    let revision = validator.revision();

    validator.field("a").unwrap().touch();

    assert_eq!(validator.revision(), revision);
}
