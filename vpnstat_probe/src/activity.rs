//! Input-activity snapshots: lenient normalization and the derived score.

use serde_json::Value;
use std::collections::BTreeMap;

use crate::types::ActivitySnapshot;

/// Coerce an arbitrary JSON value into a non-negative count.
///
/// Numbers are truncated toward zero, strings contribute their leading
/// integer (`"12abc"` → 12), everything else is 0. Negative results floor at 0.
pub fn coerce_count(v: &Value) -> u64 {
    let n: i64 = match v {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|u| u.min(i64::MAX as u64) as i64))
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Value::String(s) => leading_int(s).unwrap_or(0),
        _ => 0,
    };
    n.max(0) as u64
}

fn leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (neg, digits) = match s.as_bytes().first()? {
        b'-' => (true, &s[1..]),
        b'+' => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    // Saturate on overflow rather than dropping to 0.
    let magnitude = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
    Some(if neg { -magnitude } else { magnitude })
}

/// Normalize an externally supplied activity structure. Never fails.
pub fn normalize_activity(raw: &Value) -> ActivitySnapshot {
    let field = |name: &str| raw.get(name).map(coerce_count).unwrap_or(0);
    let keys_by_letter = match raw.get("keysByLetter") {
        Some(Value::Object(map)) => map
            .iter()
            .map(|(k, v)| (k.clone(), coerce_count(v)))
            .collect(),
        _ => BTreeMap::new(),
    };
    ActivitySnapshot {
        keys_total: field("keysTotal"),
        clicks_total: field("clicksTotal"),
        keys_per_minute: field("keysPerMinute"),
        clicks_per_minute: field("clicksPerMinute"),
        keys_by_letter,
    }
}

/// Engagement score in 0..=100: `min(100, round(0.5*keys/min + 2*clicks/min))`.
pub fn activity_score(a: &ActivitySnapshot) -> u8 {
    let raw = 0.5 * a.keys_per_minute as f64 + 2.0 * a.clicks_per_minute as f64;
    raw.round().min(100.0) as u8
}
