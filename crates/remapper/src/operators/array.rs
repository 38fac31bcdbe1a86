//! Array operators.
//!
//! Iterating operators push the array they were given onto the history stack
//! and expose each element's position through the `array` accessor.

use crate::error::RemapError;
use crate::eval_ctx::{ArrayItem, EvalCtx};
use crate::evaluate::evaluate;
use crate::types::{Fallback, Field, OperatorDefinition, Operand};
use crate::util;
use serde_json::Value;
use std::cmp::Ordering;
use std::sync::Arc;

/// Evaluates `mapper` once per element of `items`, passing each result to
/// `visit` until it returns `false`.
fn each_item(
    items: &[Value],
    input: &Value,
    mapper: &Value,
    ctx: &mut EvalCtx<'_>,
    mut visit: impl FnMut(&Value, Value) -> bool,
) {
    let mut scope = ctx.push_history(input.clone());
    let length = items.len();
    for (index, item) in items.iter().enumerate() {
        let mut item_scope = scope.enter_item(ArrayItem {
            index,
            length,
            item: item.clone(),
        });
        let result = evaluate(mapper, item, &mut item_scope);
        if !visit(item, result) {
            break;
        }
    }
}

fn map_eval(operand: &Value, input: &Value, ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    let items = util::as_arr(input)?;
    let mut out = Vec::with_capacity(items.len());
    each_item(items, input, operand, ctx, |_, result| {
        out.push(result);
        true
    });
    Ok(Value::Array(out))
}

fn filter_eval(operand: &Value, input: &Value, ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    let items = util::as_arr(input)?;
    let mut out = Vec::new();
    each_item(items, input, operand, ctx, |item, result| {
        if util::truthy(&result) {
            out.push(item.clone());
        }
        true
    });
    Ok(Value::Array(out))
}

fn find_eval(operand: &Value, input: &Value, ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    let items = util::as_arr(input)?;
    let mut found = Value::Null;
    each_item(items, input, operand, ctx, |item, result| {
        if util::truthy(&result) {
            found = item.clone();
            return false;
        }
        true
    });
    Ok(found)
}

fn sort_eval(operand: &Value, input: &Value, ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    let items = util::as_arr(input)?;
    let mut keyed: Vec<(Value, Value)> = Vec::with_capacity(items.len());
    match operand.get("by") {
        Some(by) => each_item(items, input, by, ctx, |item, key| {
            keyed.push((key, item.clone()));
            true
        }),
        None => keyed.extend(items.iter().map(|item| (item.clone(), item.clone()))),
    }
    let descending = operand.get("order").and_then(Value::as_str) == Some("desc");
    keyed.sort_by(|(a, _), (b, _)| {
        let ord = util::compare(a, b).unwrap_or(Ordering::Equal);
        if descending {
            ord.reverse()
        } else {
            ord
        }
    });
    Ok(Value::Array(keyed.into_iter().map(|(_, item)| item).collect()))
}

fn unique_eval(operand: &Value, input: &Value, ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    let items = util::as_arr(input)?;
    let mut keys: Vec<Value> = Vec::new();
    let mut out = Vec::new();
    let mut record = |item: &Value, key: Value| {
        if !keys.iter().any(|seen| util::loose_equal(seen, &key)) {
            keys.push(key);
            out.push(item.clone());
        }
        true
    };
    if operand.is_null() {
        for item in items {
            record(item, item.clone());
        }
    } else {
        each_item(items, input, operand, ctx, record);
    }
    Ok(Value::Array(out))
}

fn from_eval(operand: &Value, input: &Value, ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    let mappers = util::as_arr(operand)?;
    Ok(Value::Array(mappers.iter().map(|m| evaluate(m, input, ctx)).collect()))
}

fn append_eval(operand: &Value, input: &Value, ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    let mappers = util::as_arr(operand)?;
    let mut out = util::as_arr(input)?.clone();
    out.extend(mappers.iter().map(|m| evaluate(m, input, ctx)));
    Ok(Value::Array(out))
}

fn omit_eval(operand: &Value, input: &Value, ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    let mappers = util::as_arr(operand)?;
    let items = util::as_arr(input)?;
    let len = items.len() as i64;
    let omitted: Vec<i64> = mappers
        .iter()
        .filter_map(|m| evaluate(m, input, ctx).as_i64())
        .map(|i| if i < 0 { len + i } else { i })
        .collect();
    Ok(Value::Array(
        items
            .iter()
            .enumerate()
            .filter(|(i, _)| !omitted.contains(&(*i as i64)))
            .map(|(_, item)| item.clone())
            .collect(),
    ))
}

fn flatten_into(items: &[Value], depth: Option<u64>, out: &mut Vec<Value>) {
    for item in items {
        match item {
            Value::Array(inner) if depth != Some(0) => flatten_into(inner, depth.map(|d| d - 1), out),
            other => out.push(other.clone()),
        }
    }
}

fn flatten_eval(operand: &Value, input: &Value, _ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    let items = util::as_arr(input)?;
    let mut out = Vec::new();
    flatten_into(items, operand.as_u64(), &mut out);
    Ok(Value::Array(out))
}

fn join_eval(operand: &Value, input: &Value, _ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    let separator = operand.as_str().unwrap_or(",");
    let items = util::as_arr(input)?;
    let parts: Vec<String> = items.iter().map(util::str_val).collect();
    Ok(Value::from(parts.join(separator)))
}

fn array_eval(operand: &Value, _input: &Value, ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    let Some(current) = ctx.array_item() else {
        return Ok(Value::Null);
    };
    match operand.as_str() {
        Some("index") => Ok(Value::from(current.index)),
        Some("length") => Ok(Value::from(current.length)),
        Some("item") => Ok(current.item.clone()),
        _ => Err(RemapError::operand("array", "expected \"index\", \"length\" or \"item\"")),
    }
}

const SORT: Operand = Operand::Fields(&[
    Field::optional("by", Operand::Expr),
    Field::optional("order", Operand::Keyword(&["asc", "desc"])),
]);

const FLATTEN: Operand = Operand::Either(&[Operand::Null, Operand::Int]);

pub fn operators() -> Vec<Arc<OperatorDefinition>> {
    vec![
        OperatorDefinition::container("array.map", Operand::Expr, map_eval, Fallback::EmptyArray),
        OperatorDefinition::container("array.filter", Operand::Expr, filter_eval, Fallback::EmptyArray),
        OperatorDefinition::new("array.find", Operand::Expr, find_eval),
        OperatorDefinition::container("array.sort", SORT, sort_eval, Fallback::EmptyArray),
        OperatorDefinition::container("array.unique", Operand::Expr, unique_eval, Fallback::EmptyArray),
        OperatorDefinition::container("array.from", Operand::ExprList, from_eval, Fallback::EmptyArray),
        OperatorDefinition::container("array.append", Operand::ExprList, append_eval, Fallback::EmptyArray),
        OperatorDefinition::container("array.omit", Operand::ExprList, omit_eval, Fallback::EmptyArray),
        OperatorDefinition::container("array.flatten", FLATTEN, flatten_eval, Fallback::EmptyArray),
        OperatorDefinition::new("array.join", Operand::Str, join_eval),
        OperatorDefinition::new("array", Operand::Keyword(&["index", "length", "item"]), array_eval),
    ]
}
