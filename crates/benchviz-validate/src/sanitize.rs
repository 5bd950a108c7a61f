//! Defensive transformation of untrusted JSON.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

/// Longest array kept by sanitization; extra elements are dropped.
pub const MAX_ARRAY_LENGTH: usize = 10_000;

/// Longest string kept by sanitization, in characters.
pub const MAX_STRING_LENGTH: usize = 100_000;

/// Keys that mutate object prototypes when merged naively.
const FORBIDDEN_KEYS: [&str; 3] = ["__proto__", "constructor", "prototype"];

static SCRIPT_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b.*?</script>").expect("script block pattern is valid")
});

/// Return a sanitized copy of `value`.
///
/// Never fails. Structure that matches none of the rules is copied unchanged.
pub fn sanitize(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(sanitize_string(s)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .take(MAX_ARRAY_LENGTH)
                .map(sanitize)
                .collect(),
        ),
        Value::Object(obj) => {
            let mut sanitized = Map::with_capacity(obj.len());
            for (key, value) in obj {
                if is_forbidden_key(key) {
                    continue;
                }
                sanitized.insert(key.clone(), sanitize(value));
            }
            Value::Object(sanitized)
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => value.clone(),
    }
}

fn is_forbidden_key(key: &str) -> bool {
    FORBIDDEN_KEYS
        .iter()
        .any(|forbidden| key.eq_ignore_ascii_case(forbidden))
}

fn sanitize_string(s: &str) -> String {
    let mut out = s.to_string();
    // Removing one block can splice a new one together, so repeat until stable.
    while SCRIPT_BLOCK.is_match(&out) {
        out = SCRIPT_BLOCK.replace_all(&out, "").into_owned();
    }

    match out.char_indices().nth(MAX_STRING_LENGTH) {
        Some((cut, _)) => {
            out.truncate(cut);
            out
        }
        None => out,
    }
}
