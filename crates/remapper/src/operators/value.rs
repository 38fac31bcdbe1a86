//! Operators that read or describe the piped value.

use super::object::KEY;
use crate::error::RemapError;
use crate::eval_ctx::EvalCtx;
use crate::types::{OperatorDefinition, Operand};
use crate::util;
use serde_json::Value;
use std::sync::Arc;

fn prop_eval(operand: &Value, input: &Value, _ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    let path = util::key_path(operand).ok_or_else(|| RemapError::operand("prop", "expected a key or path"))?;
    Ok(util::get_path(input, &path).cloned().unwrap_or(Value::Null))
}

fn root_eval(_operand: &Value, _input: &Value, ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    Ok(ctx.root.clone())
}

fn static_eval(operand: &Value, _input: &Value, _ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    Ok(operand.clone())
}

fn len_eval(_operand: &Value, input: &Value, _ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    let len = match input {
        Value::String(s) => s.chars().count(),
        Value::Array(items) => items.len(),
        Value::Object(map) => map.len(),
        _ => return Err(RemapError::operand("len", "input has no length")),
    };
    Ok(Value::from(len))
}

fn type_eval(_operand: &Value, input: &Value, _ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    Ok(Value::from(util::type_name(input)))
}

fn log_eval(operand: &Value, input: &Value, _ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    match operand.as_str().unwrap_or("info") {
        "debug" => tracing::debug!(input = %input, "remapper log"),
        "warn" => tracing::warn!(input = %input, "remapper log"),
        "error" => tracing::error!(input = %input, "remapper log"),
        _ => tracing::info!(input = %input, "remapper log"),
    }
    Ok(input.clone())
}

pub fn operators() -> Vec<Arc<OperatorDefinition>> {
    vec![
        OperatorDefinition::new("prop", KEY, prop_eval),
        OperatorDefinition::new("root", Operand::Null, root_eval),
        OperatorDefinition::new("static", Operand::Any, static_eval),
        OperatorDefinition::new("len", Operand::Null, len_eval),
        OperatorDefinition::new("type", Operand::Null, type_eval),
        OperatorDefinition::new("log", Operand::Keyword(&["debug", "info", "warn", "error"]), log_eval),
    ]
}
