//! Helpers for reading loosely-typed JSON fields.

use serde_json::Value;

/// JavaScript-style truthiness, used for flags and pointers whose type varies by API version.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Reads a non-negative integer that may arrive as a number or numeric string.
pub(crate) fn as_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(is_truthy(&json!(2)));
        assert!(is_truthy(&json!("/contacts?page=2")));
        assert!(is_truthy(&json!({})));
    }

    #[test]
    fn counts() {
        assert_eq!(as_count(&json!(3)), Some(3));
        assert_eq!(as_count(&json!(" 4 ")), Some(4));
        assert_eq!(as_count(&json!(-1)), None);
        assert_eq!(as_count(&json!("many")), None);
    }
}
