//! Object operators.

use crate::error::RemapError;
use crate::eval_ctx::EvalCtx;
use crate::evaluate::evaluate;
use crate::types::{Fallback, OperatorDefinition, Operand};
use crate::util;
use serde_json::{Map, Value};
use std::sync::Arc;

/// A key operand: a name, a dotted path, an index, or an explicit path array.
pub(crate) const KEY: Operand = Operand::Either(&[Operand::Str, Operand::Index, Operand::List(&PATH_STEP)]);
const PATH_STEP: Operand = Operand::Either(&[Operand::Str, Operand::Index]);
pub(crate) const KEYS: Operand = Operand::List(&KEY);

/// Evaluates every value of `mappers` against `input`. Properties never see
/// each other's results.
pub(crate) fn eval_props(
    mappers: &Map<String, Value>,
    input: &Value,
    ctx: &mut EvalCtx<'_>,
) -> Map<String, Value> {
    mappers
        .iter()
        .map(|(key, mapper)| (key.clone(), evaluate(mapper, input, ctx)))
        .collect()
}

/// Removes each key path in `keys` from a copy of `value`.
pub(crate) fn omit_keys(value: &Value, keys: &[Value]) -> Value {
    let mut result = value.clone();
    for key in keys {
        if let Some(path) = util::key_path(key) {
            util::remove_path(&mut result, &path);
        }
    }
    result
}

fn object_from_eval(operand: &Value, input: &Value, ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    let mappers = operand
        .as_object()
        .ok_or_else(|| RemapError::operand("object.from", "expected an object"))?;
    Ok(Value::Object(eval_props(mappers, input, ctx)))
}

fn object_assign_eval(operand: &Value, input: &Value, ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    let mappers = operand
        .as_object()
        .ok_or_else(|| RemapError::operand("object.assign", "expected an object"))?;
    let mut result = util::as_obj(input)?.clone();
    result.extend(eval_props(mappers, input, ctx));
    Ok(Value::Object(result))
}

fn object_omit_eval(operand: &Value, input: &Value, _ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    let keys = util::as_arr(operand)?;
    util::as_obj(input)?;
    Ok(omit_keys(input, keys))
}

fn object_explode_eval(operand: &Value, input: &Value, _ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    let property = util::as_str(operand)?;
    let object = util::as_obj(input)?;
    let mut base = object.clone();
    let items = match base.shift_remove(property) {
        Some(Value::Array(items)) => items,
        _ => return Err(RemapError::NotArray),
    };
    let exploded = items
        .into_iter()
        .map(|item| {
            let mut merged = base.clone();
            if let Value::Object(fields) = item {
                merged.extend(fields);
            }
            Value::Object(merged)
        })
        .collect();
    Ok(Value::Array(exploded))
}

fn null_strip(value: &Value, depth: Option<u64>) -> Value {
    if depth == Some(0) {
        return value.clone();
    }
    let next = depth.map(|d| d - 1);
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(_, v)| util::is_present(v))
                .map(|(k, v)| (k.clone(), null_strip(v, next)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .filter(|v| util::is_present(v))
                .map(|v| null_strip(v, next))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn null_strip_eval(operand: &Value, input: &Value, _ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    let depth = operand.get("depth").and_then(Value::as_u64);
    Ok(null_strip(input, depth))
}

const NULL_STRIP: Operand = Operand::Either(&[
    Operand::Null,
    Operand::Fields(&[crate::types::Field::required("depth", Operand::Int)]),
]);

pub fn operators() -> Vec<Arc<OperatorDefinition>> {
    vec![
        OperatorDefinition::container("object.from", Operand::ExprMap, object_from_eval, Fallback::EmptyObject),
        OperatorDefinition::container("object.assign", Operand::ExprMap, object_assign_eval, Fallback::EmptyObject),
        OperatorDefinition::container("object.omit", KEYS, object_omit_eval, Fallback::EmptyObject),
        OperatorDefinition::container("object.explode", Operand::Str, object_explode_eval, Fallback::EmptyArray),
        OperatorDefinition::new("null.strip", NULL_STRIP, null_strip_eval),
    ]
}
