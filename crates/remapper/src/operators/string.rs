//! String operators.

use super::object::eval_props;
use crate::error::RemapError;
use crate::eval_ctx::EvalCtx;
use crate::messages::format_message;
use crate::types::{Field, OperatorDefinition, Operand};
use crate::util;
use crate::validate::{ErrorCode, Validator};
use serde_json::{Map, Value};
use std::sync::Arc;

fn string_case_eval(operand: &Value, input: &Value, _ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    let s = util::as_str(input)?;
    match operand.as_str() {
        Some("upper") => Ok(Value::from(s.to_uppercase())),
        Some("lower") => Ok(Value::from(s.to_lowercase())),
        _ => Err(RemapError::operand("string.case", "expected \"upper\" or \"lower\"")),
    }
}

/// Resolves `"text"` or `{ substring, strict }`. Non-strict comparisons are
/// case-insensitive.
fn substring_operand(operator: &'static str, operand: &Value) -> Result<(String, bool), RemapError> {
    match operand {
        Value::String(s) => Ok((s.clone(), true)),
        Value::Object(map) => {
            let substring = map
                .get("substring")
                .and_then(Value::as_str)
                .ok_or_else(|| RemapError::operand(operator, "missing \"substring\""))?;
            let strict = map.get("strict").and_then(Value::as_bool).unwrap_or(true);
            Ok((substring.to_string(), strict))
        }
        _ => Err(RemapError::operand(operator, "expected a string or an object")),
    }
}

fn compare_substring(
    operator: &'static str,
    operand: &Value,
    input: &Value,
    test: fn(&str, &str) -> bool,
) -> Result<Value, RemapError> {
    let haystack = util::as_str(input)?;
    let (needle, strict) = substring_operand(operator, operand)?;
    let matched = if strict {
        test(haystack, &needle)
    } else {
        test(&haystack.to_lowercase(), &needle.to_lowercase())
    };
    Ok(Value::Bool(matched))
}

fn starts_with_eval(operand: &Value, input: &Value, _ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    compare_substring("string.startsWith", operand, input, |h, n| h.starts_with(n))
}

fn ends_with_eval(operand: &Value, input: &Value, _ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    compare_substring("string.endsWith", operand, input, |h, n| h.ends_with(n))
}

fn contains_eval(operand: &Value, input: &Value, _ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    compare_substring("string.contains", operand, input, |h, n| h.contains(n))
}

/// Resolves a slice bound the way `Array.prototype.slice` does.
fn normalize_slice_index(idx: i64, len: usize) -> usize {
    let len = len as i64;
    if idx < 0 {
        (len + idx).max(0) as usize
    } else {
        idx.min(len) as usize
    }
}

fn slice_bounds(operand: &Value, len: usize) -> Result<(usize, usize), RemapError> {
    let (start, end) = match operand {
        Value::Number(n) => (n.as_i64(), None),
        Value::Array(bounds) if !bounds.is_empty() && bounds.len() <= 2 => {
            (bounds[0].as_i64(), bounds.get(1).map(Value::as_i64))
        }
        _ => return Err(RemapError::operand("slice", "expected an index or [start, end]")),
    };
    let start = start.ok_or_else(|| RemapError::operand("slice", "start must be an integer"))?;
    let end = match end {
        None => len,
        Some(Some(end)) => normalize_slice_index(end, len),
        Some(None) => return Err(RemapError::operand("slice", "end must be an integer")),
    };
    let start = normalize_slice_index(start, len);
    Ok((start, end.max(start)))
}

fn slice_eval(operand: &Value, input: &Value, _ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    match input {
        Value::String(s) => {
            let chars: Vec<char> = s.chars().collect();
            let (start, end) = slice_bounds(operand, chars.len())?;
            Ok(Value::from(chars[start..end].iter().collect::<String>()))
        }
        Value::Array(items) => {
            let (start, end) = slice_bounds(operand, items.len())?;
            Ok(Value::Array(items[start..end].to_vec()))
        }
        _ => Err(RemapError::NotString),
    }
}

fn string_format_eval(operand: &Value, input: &Value, ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    let template = operand.get("template").and_then(Value::as_str).unwrap_or_default();
    let source = match operand.get("messageId").and_then(Value::as_str) {
        Some(id) => ctx.context.messages.message(id, template),
        None => template.to_string(),
    };
    let values = match operand.get("values") {
        Some(Value::Object(mappers)) => eval_props(mappers, input, ctx),
        _ => Map::new(),
    };
    Ok(Value::from(format_message(ctx.context, &source, &values)))
}

fn string_replace_eval(operand: &Value, input: &Value, _ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    let replacements = util::as_obj(operand)?;
    let mut result = util::as_str(input)?.to_string();
    for (pattern, replacement) in replacements {
        let regex = util::build_regex(pattern, "gm")?;
        let replacement = util::as_str(replacement)?;
        result = regex.replace_all(&result, replacement).into_owned();
    }
    Ok(Value::from(result))
}

fn string_test_eval(operand: &Value, input: &Value, _ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    let pattern = util::as_str(&operand["regex"])?;
    let flags = operand.get("flags").and_then(Value::as_str).unwrap_or_default();
    let regex = util::build_regex(pattern, flags)?;
    Ok(Value::Bool(regex.is_match(util::as_str(input)?)))
}

fn string_trim_eval(_operand: &Value, input: &Value, _ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    Ok(Value::from(util::as_str(input)?.trim()))
}

fn string_split_eval(operand: &Value, input: &Value, _ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    let separator = util::as_str(operand)?;
    let s = util::as_str(input)?;
    let parts: Vec<Value> = if separator.is_empty() {
        s.chars().map(|c| Value::from(c.to_string())).collect()
    } else {
        s.split(separator).map(Value::from).collect()
    };
    Ok(Value::Array(parts))
}

fn check_replace(operand: &Value, v: &mut Validator) {
    let Some(replacements) = operand.as_object() else {
        v.error(ErrorCode::InvalidOperand, "expected an object of pattern to replacement");
        return;
    };
    for (pattern, replacement) in replacements {
        v.at(pattern, |v| {
            v.regex(pattern, "gm");
            if !replacement.is_string() {
                v.error(ErrorCode::InvalidOperand, "replacement must be a string");
            }
        });
    }
}

const TEST_FIELDS: Operand = Operand::Fields(&[
    Field::required("regex", Operand::Str),
    Field::optional("flags", Operand::Str),
]);

fn check_test(operand: &Value, v: &mut Validator) {
    if !v.operand(operand, &TEST_FIELDS) {
        return;
    }
    if let Some(pattern) = operand["regex"].as_str() {
        let flags = operand.get("flags").and_then(Value::as_str).unwrap_or_default();
        v.at("regex", |v| v.regex(pattern, flags));
    }
}

fn check_slice(operand: &Value, v: &mut Validator) {
    let valid = match operand {
        Value::Number(n) => n.is_i64(),
        Value::Array(bounds) => {
            !bounds.is_empty() && bounds.len() <= 2 && bounds.iter().all(|b| b.is_i64())
        }
        _ => false,
    };
    if !valid {
        v.error(ErrorCode::InvalidOperand, "expected an integer or [start, end]");
    }
}

const SUBSTRING: Operand = Operand::Either(&[
    Operand::Str,
    Operand::Fields(&[
        Field::required("substring", Operand::Str),
        Field::optional("strict", Operand::Bool),
    ]),
]);

const FORMAT: Operand = Operand::Fields(&[
    Field::optional("messageId", Operand::Str),
    Field::optional("template", Operand::Str),
    Field::optional("values", Operand::ExprMap),
]);

pub fn operators() -> Vec<Arc<OperatorDefinition>> {
    vec![
        OperatorDefinition::new("string.case", Operand::Keyword(&["upper", "lower"]), string_case_eval),
        OperatorDefinition::new("string.startsWith", SUBSTRING, starts_with_eval),
        OperatorDefinition::new("string.endsWith", SUBSTRING, ends_with_eval),
        OperatorDefinition::new("string.contains", SUBSTRING, contains_eval),
        OperatorDefinition::new("slice", Operand::Custom(check_slice), slice_eval),
        OperatorDefinition::new("string.format", FORMAT, string_format_eval),
        OperatorDefinition::new("string.replace", Operand::Custom(check_replace), string_replace_eval),
        OperatorDefinition::new("string.test", Operand::Custom(check_test), string_test_eval),
        OperatorDefinition::new("string.trim", Operand::Null, string_trim_eval),
        OperatorDefinition::new("string.split", Operand::Str, string_split_eval),
    ]
}
