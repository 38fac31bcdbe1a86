//! History operators: reach values that were piped into enclosing operators.
//!
//! Depth `1` is the most recently pushed value; depth `0` is the current
//! input.

use super::object::{eval_props, omit_keys, KEYS};
use crate::error::RemapError;
use crate::eval_ctx::EvalCtx;
use crate::types::{Fallback, Field, OperatorDefinition, Operand};
use crate::util;
use serde_json::Value;
use std::sync::Arc;

fn lookup(depth: &Value, input: &Value, ctx: &EvalCtx<'_>) -> Result<Value, RemapError> {
    let depth = depth.as_u64().ok_or(RemapError::OutOfBounds)? as usize;
    if depth == 0 {
        return Ok(input.clone());
    }
    ctx.history(depth).cloned().ok_or(RemapError::OutOfBounds)
}

fn history_eval(operand: &Value, input: &Value, ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    lookup(operand, input, ctx)
}

fn from_history_eval(operand: &Value, input: &Value, ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    let source = lookup(&operand["index"], input, ctx)?;
    let props = util::as_obj(&operand["props"])?;
    let mut scope = ctx.push_history(input.clone());
    Ok(Value::Object(eval_props(props, &source, &mut scope)))
}

fn assign_history_eval(operand: &Value, input: &Value, ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    let mut result = util::as_obj(input)?.clone();
    let source = lookup(&operand["index"], input, ctx)?;
    let props = util::as_obj(&operand["props"])?;
    let mut scope = ctx.push_history(input.clone());
    result.extend(eval_props(props, &source, &mut scope));
    Ok(Value::Object(result))
}

fn omit_history_eval(operand: &Value, input: &Value, ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    let source = lookup(&operand["index"], input, ctx)?;
    util::as_obj(&source)?;
    Ok(omit_keys(&source, util::as_arr(&operand["keys"])?))
}

const FROM_HISTORY: Operand = Operand::Fields(&[
    Field::required("index", Operand::Int),
    Field::required("props", Operand::ExprMap),
]);

const OMIT_HISTORY: Operand = Operand::Fields(&[
    Field::required("index", Operand::Int),
    Field::required("keys", KEYS),
]);

pub fn operators() -> Vec<Arc<OperatorDefinition>> {
    vec![
        OperatorDefinition::new("history", Operand::Int, history_eval),
        OperatorDefinition::container("from.history", FROM_HISTORY, from_history_eval, Fallback::EmptyObject),
        OperatorDefinition::container("assign.history", FROM_HISTORY, assign_history_eval, Fallback::EmptyObject),
        OperatorDefinition::container("omit.history", OMIT_HISTORY, omit_history_eval, Fallback::EmptyObject),
    ]
}
