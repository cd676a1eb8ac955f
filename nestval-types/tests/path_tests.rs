use nestval_types::FieldPath;
use serde_json::json;
use std::str::FromStr;

// ── Parsing & display ────────────────────────────────────────────

#[test]
fn parse_and_display_roundtrip() {
    let path = FieldPath::parse("user.address.zip").unwrap();
    assert_eq!(path.segments(), ["user", "address", "zip"]);
    assert_eq!(path.to_string(), "user.address.zip");
    assert_eq!(path.key(), Some("zip"));
}

#[test]
fn empty_string_is_root() {
    let path = FieldPath::parse("").unwrap();
    assert!(path.is_root());
    assert_eq!(path.to_string(), "");
    assert_eq!(path.key(), None);
}

#[test]
fn empty_segments_are_rejected() {
    assert!(FieldPath::parse("user..zip").is_err());
    assert!(FieldPath::parse(".user").is_err());
    assert!(FieldPath::from_str("user.").is_err());
}

#[test]
fn child_appends_segment() {
    let path = FieldPath::root().child("user").child("age");
    assert_eq!(path.len(), 2);
    assert_eq!(path, FieldPath::from_iter(["user", "age"]));
}

// ── Lookup ───────────────────────────────────────────────────────

#[test]
fn lookup_descends_objects() {
    let data = json!({"user": {"age": 15, "tags": ["a"]}});
    let age = FieldPath::parse("user.age").unwrap();
    assert_eq!(age.lookup(&data), Some(&json!(15)));
    assert_eq!(FieldPath::root().lookup(&data), Some(&data));
}

#[test]
fn lookup_does_not_index_arrays_or_scalars() {
    let data = json!({"user": {"tags": ["a"], "age": 3}});
    assert_eq!(FieldPath::parse("user.tags.0").unwrap().lookup(&data), None);
    assert_eq!(FieldPath::parse("user.age.x").unwrap().lookup(&data), None);
}

#[test]
fn resolve_defaults_missing_to_null() {
    let data = json!({"a": 1});
    assert_eq!(FieldPath::parse("b").unwrap().resolve(&data), json!(null));
    assert_eq!(FieldPath::parse("a").unwrap().resolve(&data), json!(1));
}

// ── Serde ────────────────────────────────────────────────────────

#[test]
fn serializes_as_string() {
    let path = FieldPath::parse("a.b").unwrap();
    assert_eq!(serde_json::to_string(&path).unwrap(), r#""a.b""#);
    let parsed: FieldPath = serde_json::from_str(r#""a.b""#).unwrap();
    assert_eq!(parsed, path);
    assert!(serde_json::from_str::<FieldPath>(r#""a..b""#).is_err());
}
