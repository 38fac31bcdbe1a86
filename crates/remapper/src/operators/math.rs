//! Arithmetic on the piped number.

use crate::error::RemapError;
use crate::eval_ctx::EvalCtx;
use crate::evaluate::evaluate;
use crate::types::{OperatorDefinition, Operand};
use crate::util;
use serde_json::Value;
use std::sync::Arc;

fn apply(
    operand: &Value,
    input: &Value,
    ctx: &mut EvalCtx<'_>,
    op: fn(f64, f64) -> Result<f64, RemapError>,
) -> Result<Value, RemapError> {
    let lhs = util::as_num(input)?;
    let rhs = util::as_num(&evaluate(operand, input, ctx))?;
    Ok(util::num(op(lhs, rhs)?))
}

fn add_eval(operand: &Value, input: &Value, ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    apply(operand, input, ctx, |a, b| Ok(a + b))
}

fn subtract_eval(operand: &Value, input: &Value, ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    apply(operand, input, ctx, |a, b| Ok(a - b))
}

fn multiply_eval(operand: &Value, input: &Value, ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    apply(operand, input, ctx, |a, b| Ok(a * b))
}

fn divide_eval(operand: &Value, input: &Value, ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    apply(operand, input, ctx, |a, b| {
        if b == 0.0 {
            return Err(RemapError::DivisionByZero);
        }
        Ok(a / b)
    })
}

pub fn operators() -> Vec<Arc<OperatorDefinition>> {
    vec![
        OperatorDefinition::new("math.add", Operand::Expr, add_eval),
        OperatorDefinition::new("math.subtract", Operand::Expr, subtract_eval),
        OperatorDefinition::new("math.multiply", Operand::Expr, multiply_eval),
        OperatorDefinition::new("math.divide", Operand::Expr, divide_eval),
    ]
}
