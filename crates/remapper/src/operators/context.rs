//! Accessors for the caller-supplied context.

use crate::error::RemapError;
use crate::eval_ctx::EvalCtx;
use crate::messages::format_message;
use crate::types::{OperatorDefinition, Operand};
use serde_json::{Map, Value};
use std::sync::Arc;

fn app_eval(operand: &Value, _input: &Value, ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    let app = &ctx.context.app;
    match operand.as_str() {
        Some("id") => Ok(app.id.map(Value::from).unwrap_or(Value::Null)),
        Some("url") => Ok(Value::from(app.url.as_str())),
        Some("locale") => Ok(Value::from(app.locale.as_str())),
        _ => Err(RemapError::operand("app", "expected \"id\", \"url\" or \"locale\"")),
    }
}

fn user_eval(operand: &Value, _input: &Value, ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    let Some(user) = &ctx.context.user else {
        return Ok(Value::Null);
    };
    let optional = |v: &Option<String>| v.as_deref().map(Value::from).unwrap_or(Value::Null);
    match operand.as_str() {
        Some("sub") => Ok(Value::from(user.sub.as_str())),
        Some("name") => Ok(optional(&user.name)),
        Some("email") => Ok(optional(&user.email)),
        Some("email_verified") => Ok(Value::Bool(user.email_verified)),
        Some("locale") => Ok(optional(&user.locale)),
        Some("zoneinfo") => Ok(optional(&user.zoneinfo)),
        Some("properties") => Ok(Value::Object(user.properties.clone())),
        _ => Err(RemapError::operand("user", "unknown user property")),
    }
}

fn page_eval(operand: &Value, _input: &Value, ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    let page = &ctx.context.page;
    match operand {
        Value::Null => Ok(page.clone()),
        Value::String(name) => Ok(page.get(name).cloned().unwrap_or(Value::Null)),
        _ => Err(RemapError::operand("page", "expected null or a parameter name")),
    }
}

fn variable_eval(operand: &Value, _input: &Value, ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    let name = operand
        .as_str()
        .ok_or_else(|| RemapError::operand("variable", "expected a variable name"))?;
    Ok(ctx.context.variables.get(name).cloned().unwrap_or(Value::Null))
}

fn locale_eval(_operand: &Value, _input: &Value, ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    Ok(Value::from(ctx.context.locale()))
}

/// Looks up a message and interpolates it with the input's properties. An
/// unknown message id yields the id itself.
fn translate_eval(operand: &Value, input: &Value, ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    let id = operand
        .as_str()
        .ok_or_else(|| RemapError::operand("translate", "expected a message id"))?;
    let source = ctx.context.messages.message(id, id);
    let empty = Map::new();
    let values = input.as_object().unwrap_or(&empty);
    Ok(Value::from(format_message(ctx.context, &source, values)))
}

const PAGE: Operand = Operand::Either(&[Operand::Null, Operand::Str]);

pub fn operators() -> Vec<Arc<OperatorDefinition>> {
    vec![
        OperatorDefinition::new("app", Operand::Keyword(&["id", "url", "locale"]), app_eval),
        OperatorDefinition::new(
            "user",
            Operand::Keyword(&["sub", "name", "email", "email_verified", "locale", "zoneinfo", "properties"]),
            user_eval,
        ),
        OperatorDefinition::new("page", PAGE, page_eval),
        OperatorDefinition::new("variable", Operand::Str, variable_eval),
        OperatorDefinition::new("locale", Operand::Null, locale_eval),
        OperatorDefinition::new("translate", Operand::Str, translate_eval),
    ]
}
