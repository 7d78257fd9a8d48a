//! URL-encoded form decoding.
//!
//! Bodies are decoded line by line. Each line is percent-decoded as a whole
//! before being split on `&`, so an encoded `%26` still separates pairs.
//! A key seen more than once turns into a list of its distinct values.

use percent_encoding::percent_decode_str;
use serde_json::Value;

use crate::package::Kwargs;

/// Percent-decode a single component, replacing invalid UTF-8.
pub fn decode_component(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

/// Merge one key/value pair, collecting repeats into a deduplicated list.
fn merge_pair(result: &mut Kwargs, key: &str, value: &str) {
    let value = Value::String(value.to_string());
    match result.get_mut(key) {
        Some(Value::Array(values)) => {
            if !values.contains(&value) {
                values.push(value);
            }
        }
        Some(existing) => {
            let previous = existing.take();
            let mut values = vec![previous];
            if !values.contains(&value) {
                values.push(value);
            }
            *existing = Value::Array(values);
        }
        None => {
            result.insert(key.to_string(), value);
        }
    }
}

/// Decode URL-encoded text into `result`.
///
/// Blank lines and empty `&` segments are skipped.
pub fn decode_form_into(text: &str, result: &mut Kwargs) {
    for line in text.lines() {
        let line = decode_component(line.trim_end_matches('\r'));
        if line.is_empty() {
            continue;
        }

        for segment in line.split('&').filter(|segment| !segment.is_empty()) {
            let (key, value) = segment.split_once('=').unwrap_or((segment, ""));
            merge_pair(result, key, value);
        }
    }
}

/// Decode URL-encoded text into a fresh keyword map.
pub fn decode_form(text: &str) -> Kwargs {
    let mut result = Kwargs::new();
    decode_form_into(text, &mut result);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_simple_pairs() {
        let result = decode_form("k1=v1&k2=v2");
        assert_eq!(result.len(), 2);
        assert_eq!(result["k1"], json!("v1"));
        assert_eq!(result["k2"], json!("v2"));
    }

    #[test]
    fn test_repeated_key_becomes_set() {
        let result = decode_form("k=a&k=b&k=a");
        let Value::Array(values) = &result["k"] else {
            panic!("expected a list, got {:?}", result["k"]);
        };
        assert_eq!(values.len(), 2);
        assert!(values.contains(&json!("a")));
        assert!(values.contains(&json!("b")));
    }

    #[test]
    fn test_percent_decoding() {
        let result = decode_form("name=Jane%20Doe&city=S%C3%A3o%20Paulo");
        assert_eq!(result["name"], json!("Jane Doe"));
        assert_eq!(result["city"], json!("São Paulo"));
    }

    #[test]
    fn test_value_keeps_later_equals() {
        let result = decode_form("expr=a=b");
        assert_eq!(result["expr"], json!("a=b"));
    }

    #[test]
    fn test_multiple_lines_and_blanks() {
        let result = decode_form("a=1\r\n\r\nb=2\n");
        assert_eq!(result.len(), 2);
        assert_eq!(result["b"], json!("2"));
        assert!(decode_form("").is_empty());
    }
}
