//! Activity normalization and scoring.
use serde_json::json;
use vpnstat_probe::{activity_score, normalize_activity, ActivitySnapshot};

#[test]
fn malformed_fields_coerce_to_zero_or_empty() {
    let raw = json!({
        "keysTotal": "12",
        "clicksPerMinute": -5,
        "keysByLetter": "notAnObject"
    });
    let a = normalize_activity(&raw);
    assert_eq!(
        a,
        ActivitySnapshot {
            keys_total: 12,
            clicks_total: 0,
            keys_per_minute: 0,
            clicks_per_minute: 0,
            keys_by_letter: Default::default(),
        }
    );
}

#[test]
fn non_object_input_is_all_zero() {
    assert_eq!(normalize_activity(&json!(null)), ActivitySnapshot::default());
    assert_eq!(normalize_activity(&json!([1, 2, 3])), ActivitySnapshot::default());
    assert_eq!(normalize_activity(&json!("keys")), ActivitySnapshot::default());
}

#[test]
fn histogram_counts_are_coerced() {
    let raw = json!({
        "keysPerMinute": 40.9,
        "keysByLetter": { "a": 3, "b": "7", "c": -1, "d": { "nested": 1 } }
    });
    let a = normalize_activity(&raw);
    assert_eq!(a.keys_per_minute, 40);
    assert_eq!(a.keys_by_letter.get("a"), Some(&3));
    assert_eq!(a.keys_by_letter.get("b"), Some(&7));
    assert_eq!(a.keys_by_letter.get("c"), Some(&0));
    assert_eq!(a.keys_by_letter.get("d"), Some(&0));
}

#[test]
fn score_weights_and_cap() {
    let mut a = ActivitySnapshot::default();
    assert_eq!(activity_score(&a), 0);

    a.keys_per_minute = 21;
    a.clicks_per_minute = 3;
    // 10.5 + 6 = 16.5 -> 17
    assert_eq!(activity_score(&a), 17);

    a.keys_per_minute = 180;
    a.clicks_per_minute = 10;
    assert_eq!(activity_score(&a), 100);
}

#[test]
fn snapshot_uses_camel_case_on_the_wire() {
    let mut a = ActivitySnapshot::default();
    a.keys_total = 5;
    a.keys_by_letter.insert("q".into(), 5);
    let v = serde_json::to_value(&a).unwrap();
    assert_eq!(v["keysTotal"], 5);
    assert_eq!(v["keysByLetter"]["q"], 5);
    assert_eq!(v["clicksPerMinute"], 0);
}
