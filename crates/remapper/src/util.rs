//! Value helpers shared by the operators and the validator.

use crate::error::RemapError;
use regex::{Regex, RegexBuilder};
use serde_json::{Map, Number, Value};

// ----------------------------------------------------------------- Presence

/// Whether a value counts as present. Only `null` is absent; `''`, `0` and
/// `false` are present.
pub fn is_present(value: &Value) -> bool {
    !value.is_null()
}

/// Truthiness used by conditional operators: `null`, `false`, `0`, `NaN` and
/// `''` are falsy, everything else (including `[]` and `{}`) is truthy.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

// ----------------------------------------------------------------- Type helpers

pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub fn as_obj(value: &Value) -> Result<&Map<String, Value>, RemapError> {
    value.as_object().ok_or(RemapError::NotObject)
}

pub fn as_arr(value: &Value) -> Result<&Vec<Value>, RemapError> {
    value.as_array().ok_or(RemapError::NotArray)
}

pub fn as_str(value: &Value) -> Result<&str, RemapError> {
    value.as_str().ok_or(RemapError::NotString)
}

pub fn as_num(value: &Value) -> Result<f64, RemapError> {
    value.as_f64().ok_or(RemapError::NotNumber)
}

/// Builds a JSON number, keeping integral results integers.
pub fn num(n: f64) -> Value {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 9_007_199_254_740_992.0 {
        return Value::Number(Number::from(n as i64));
    }
    Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
}

/// Converts a value to display text: strings verbatim, `null` as nothing,
/// everything else as JSON.
pub fn str_val(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// -------------------------------------------------------------- Comparison

/// Deep equality where `1` and `1.0` are the same number.
pub fn loose_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| loose_equal(a, b))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(k, v)| y.get(k).is_some_and(|other| loose_equal(v, other)))
        }
        _ => a == b,
    }
}

/// Orders numbers numerically and strings lexically. Mixed or non-scalar
/// values are unordered.
pub fn compare(a: &Value, b: &Value) -> Option<std::cmp::Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

// ----------------------------------------------------------------- Paths

/// Reads one property: object keys by name, array items by index.
pub fn get_step<'v>(value: &'v Value, step: &Value) -> Option<&'v Value> {
    match (value, step) {
        (Value::Object(map), Value::String(key)) => map.get(key),
        (Value::Object(map), Value::Number(n)) => map.get(&n.to_string()),
        (Value::Array(items), Value::Number(n)) => array_index(items.len(), n).and_then(|i| items.get(i)),
        (Value::Array(items), Value::String(key)) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

/// Resolves an array step; negative numbers count back from `len`.
fn array_index(len: usize, n: &Number) -> Option<usize> {
    let i = n.as_i64()?;
    let i = if i < 0 { len as i64 + i } else { i };
    usize::try_from(i).ok().filter(|i| *i < len)
}

pub fn get_path<'v>(value: &'v Value, path: &[Value]) -> Option<&'v Value> {
    path.iter().try_fold(value, |current, step| get_step(current, step))
}

/// Interprets a key operand: `"a.b"` and `["a", "b"]` are both the path
/// `a` → `b`; a bare number is an index.
pub fn key_path(operand: &Value) -> Option<Vec<Value>> {
    match operand {
        Value::String(s) if s.contains('.') => {
            Some(s.split('.').map(|part| Value::String(part.to_string())).collect())
        }
        Value::String(_) | Value::Number(_) => Some(vec![operand.clone()]),
        Value::Array(steps) if steps.iter().all(|s| s.is_string() || s.is_number()) => Some(steps.clone()),
        _ => None,
    }
}

/// Removes the value at `path` from `value` in place. Missing paths are a
/// no-op.
pub fn remove_path(value: &mut Value, path: &[Value]) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };
    let mut current = value;
    for step in parents {
        let next = match (current, step) {
            (Value::Object(map), Value::String(key)) => map.get_mut(key),
            (Value::Array(items), Value::Number(n)) => array_index(items.len(), n).and_then(|i| items.get_mut(i)),
            _ => None,
        };
        match next {
            Some(next) => current = next,
            None => return,
        }
    }
    match (current, last) {
        (Value::Object(map), Value::String(key)) => {
            map.shift_remove(key);
        }
        (Value::Array(items), Value::Number(n)) => {
            if let Some(i) = array_index(items.len(), n) {
                items.remove(i);
            }
        }
        _ => {}
    }
}

// ----------------------------------------------------------------- Regex

/// Compiles a pattern with JavaScript-style flags.
///
/// `i`, `m` and `s` map to the matching regex options; `g`, `u` and `y` are
/// accepted and have no effect (matching is always Unicode-aware).
pub fn build_regex(pattern: &str, flags: &str) -> Result<Regex, RemapError> {
    let mut builder = RegexBuilder::new(pattern);
    for flag in flags.chars() {
        match flag {
            'i' => {
                builder.case_insensitive(true);
            }
            'm' => {
                builder.multi_line(true);
            }
            's' => {
                builder.dot_matches_new_line(true);
            }
            'g' | 'u' | 'y' => {}
            other => {
                return Err(RemapError::InvalidRegex(format!("unknown flag \"{other}\"")));
            }
        }
    }
    builder
        .build()
        .map_err(|e| RemapError::InvalidRegex(e.to_string()))
}

// ----------------------------------------------------------------- Pointers

/// Escapes a JSON Pointer reference token (`~` → `~0`, `/` → `~1`).
pub fn escape_component(component: &str) -> String {
    if !component.contains(['~', '/']) {
        return component.to_string();
    }
    component.replace('~', "~0").replace('/', "~1")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthy() {
        for v in [json!(null), json!(false), json!(0), json!(0.0), json!("")] {
            assert!(!truthy(&v), "{v}");
        }
        for v in [json!(true), json!(1), json!(-0.5), json!("0"), json!([]), json!({})] {
            assert!(truthy(&v), "{v}");
        }
    }

    #[test]
    fn test_presence_only_rejects_null() {
        assert!(!is_present(&json!(null)));
        assert!(is_present(&json!("")));
        assert!(is_present(&json!(0)));
        assert!(is_present(&json!(false)));
    }

    #[test]
    fn test_num_keeps_integers() {
        assert_eq!(num(3.0), json!(3));
        assert_eq!(num(2.5), json!(2.5));
        assert_eq!(num(f64::NAN), json!(null));
    }

    #[test]
    fn test_loose_equal() {
        assert!(loose_equal(&json!({ "a": [1, 2.0] }), &json!({ "a": [1.0, 2] })));
        assert!(!loose_equal(&json!({ "a": 1 }), &json!({ "a": 1, "b": 2 })));
        assert!(!loose_equal(&json!("1"), &json!(1)));
    }

    #[test]
    fn test_paths() {
        let doc = json!({ "a": { "b": [10, 20, 30] } });
        assert_eq!(get_path(&doc, &key_path(&json!("a.b")).unwrap()), Some(&json!([10, 20, 30])));
        assert_eq!(get_path(&doc, &[json!("a"), json!("b"), json!(-1)]), Some(&json!(30)));
        assert_eq!(get_path(&doc, &[json!("a"), json!("x")]), None);

        let mut copy = doc.clone();
        remove_path(&mut copy, &[json!("a"), json!("b"), json!(0)]);
        assert_eq!(copy, json!({ "a": { "b": [20, 30] } }));
        remove_path(&mut copy, &[json!("nope"), json!("b")]);
        assert_eq!(copy, json!({ "a": { "b": [20, 30] } }));
        remove_path(&mut copy, &[json!("a"), json!("b"), json!(-1)]);
        assert_eq!(copy, json!({ "a": { "b": [20] } }));
        remove_path(&mut copy, &[json!("a"), json!("b"), json!(-5)]);
        assert_eq!(copy, json!({ "a": { "b": [20] } }));
    }

    #[test]
    fn test_regex_flags() {
        assert!(build_regex("abc", "i").unwrap().is_match("ABC"));
        assert!(!build_regex("abc", "").unwrap().is_match("ABC"));
        assert!(build_regex("^b$", "m").unwrap().is_match("a\nb"));
        assert!(build_regex("a", "x").is_err());
        assert!(build_regex("(", "").is_err());
    }

    #[test]
    fn test_escape_component() {
        assert_eq!(escape_component("a/b~c"), "a~1b~0c");
        assert_eq!(escape_component("object.from"), "object.from");
    }
}
