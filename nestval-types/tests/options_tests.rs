use nestval_types::{OptionOverrides, Options};
use serde_json::json;

#[test]
fn defaults_are_all_off() {
    let options = Options::default();
    assert!(!options.lazy);
    assert!(!options.first_error);
    assert!(!options.auto_test);
    assert!(!options.auto_touch);
    assert!(!options.touch_on_test);
    assert!(options.transform.is_none());
}

#[test]
fn resolve_empty_overrides_yields_defaults() {
    let options = Options::resolve(&OptionOverrides::new());
    assert!(!options.lazy);
    assert!(!options.first_error);
    assert!(options.transform.is_none());
}

#[test]
fn resolve_applies_only_set_fields() {
    let overrides = OptionOverrides::new().lazy(true).auto_touch(true);
    let options = Options::resolve(&overrides);
    assert!(options.lazy);
    assert!(options.auto_touch);
    assert!(!options.first_error);
    assert!(!options.auto_test);
    assert!(!options.touch_on_test);
}

#[test]
fn resolve_carries_transform() {
    let overrides = OptionOverrides::new().transform(|result, _, _, _| json!({"ok": !result.invalid}));
    let options = Options::resolve(&overrides);
    assert!(options.transform.is_some());
}

// ── JSON loading ─────────────────────────────────────────────────

#[test]
fn from_json_snake_case() {
    let overrides = OptionOverrides::from_json(r#"{"first_error": true, "touch_on_test": false}"#).unwrap();
    assert_eq!(overrides.first_error, Some(true));
    assert_eq!(overrides.touch_on_test, Some(false));
    assert_eq!(overrides.lazy, None);
}

#[test]
fn from_json_accepts_camel_case_aliases() {
    let overrides =
        OptionOverrides::from_json(r#"{"firstError": true, "autoTest": true, "autoTouch": true, "touchOnTest": true}"#)
            .unwrap();
    let options = Options::resolve(&overrides);
    assert!(options.first_error);
    assert!(options.auto_test);
    assert!(options.auto_touch);
    assert!(options.touch_on_test);
}

#[test]
fn from_json_ignores_unknown_keys() {
    let overrides = OptionOverrides::from_json(r#"{"lazy": true, "color": "blue"}"#).unwrap();
    assert_eq!(overrides.lazy, Some(true));
}

#[test]
fn from_json_rejects_malformed_input() {
    assert!(OptionOverrides::from_json("{not json").is_err());
    assert!(OptionOverrides::from_json(r#"{"lazy": "yes"}"#).is_err());
}

#[test]
fn debug_hides_transform_body() {
    let overrides = OptionOverrides::new().transform(|_, _, _, _| json!(null));
    let rendered = format!("{overrides:?}");
    assert!(rendered.contains("transform: true"));
}
