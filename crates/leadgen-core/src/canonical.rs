//! Canonical JSON serialization and content hashing.
//!
//! Two payloads that differ only in object key order or whitespace must hash
//! identically: the enqueuer compares a resend against the stored row by
//! re-hashing both through this path, never by comparing raw bytes.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Serialize a JSON value with object keys recursively sorted and no
/// whitespace.
pub fn to_canonical_string(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

/// SHA-256 over the canonical serialization, hex-encoded.
pub fn content_hash(value: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(to_canonical_string(value).as_bytes());
    hex::encode(hasher.finalize())
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort_unstable();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                // Value's Display emits compact JSON with proper escaping.
                out.push_str(&Value::String((*key).clone()).to_string());
                out.push(':');
                write_canonical(&map[*key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keys_are_sorted_recursively() {
        let value = json!({"b": 1, "a": {"z": true, "m": [1, {"y": 2, "x": 3}]}});
        assert_eq!(
            to_canonical_string(&value),
            r#"{"a":{"m":[1,{"x":3,"y":2}],"z":true},"b":1}"#
        );
    }

    #[test]
    fn hash_ignores_key_order() {
        let a = json!({"name": "Ada", "company": "Acme", "tags": ["x", "y"]});
        let b = json!({"tags": ["x", "y"], "company": "Acme", "name": "Ada"});
        assert_eq!(content_hash(&a), content_hash(&b));
    }

    #[test]
    fn hash_distinguishes_different_content() {
        let a = json!({"email": "a@example.com"});
        let b = json!({"email": "b@example.com"});
        assert_ne!(content_hash(&a), content_hash(&b));
    }

    #[test]
    fn strings_are_escaped() {
        let value = json!({"note": "line1\nline2 \"quoted\""});
        assert_eq!(
            to_canonical_string(&value),
            r#"{"note":"line1\nline2 \"quoted\""}"#
        );
    }
}
