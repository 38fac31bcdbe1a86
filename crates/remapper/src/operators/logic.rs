//! Conditional and comparison operators.

use crate::error::RemapError;
use crate::eval_ctx::EvalCtx;
use crate::evaluate::evaluate;
use crate::types::{Field, OperatorDefinition, Operand};
use crate::util;
use crate::validate::{ErrorCode, Validator};
use serde_json::Value;
use std::cmp::Ordering;
use std::sync::Arc;

fn if_eval(operand: &Value, input: &Value, ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    let condition = evaluate(&operand["condition"], input, ctx);
    let branch = if util::truthy(&condition) { &operand["then"] } else { &operand["else"] };
    Ok(evaluate(branch, input, ctx))
}

/// Returns the value of the first case that is truthy, or `null`.
///
/// A candidate without `case` always matches; only the last one may omit it.
fn match_eval(operand: &Value, input: &Value, ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    for candidate in util::as_arr(operand)? {
        let matched = match candidate.get("case") {
            Some(case) => util::truthy(&evaluate(case, input, ctx)),
            None => true,
        };
        if matched {
            return Ok(evaluate(&candidate["value"], input, ctx));
        }
    }
    Ok(Value::Null)
}

fn eval_all(operand: &Value, input: &Value, ctx: &mut EvalCtx<'_>) -> Result<Vec<Value>, RemapError> {
    Ok(util::as_arr(operand)?.iter().map(|e| evaluate(e, input, ctx)).collect())
}

fn equals_eval(operand: &Value, input: &Value, ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    let values = eval_all(operand, input, ctx)?;
    let equal = match values.split_first() {
        Some((first, rest)) => rest.iter().all(|v| util::loose_equal(first, v)),
        None => true,
    };
    Ok(Value::Bool(equal))
}

fn compare_pair(operand: &Value, input: &Value, ctx: &mut EvalCtx<'_>, expected: Ordering) -> Result<Value, RemapError> {
    let values = eval_all(operand, input, ctx)?;
    let [a, b] = values.as_slice() else {
        return Err(RemapError::operand("gt/lt", "expected two operands"));
    };
    Ok(Value::Bool(util::compare(a, b) == Some(expected)))
}

fn gt_eval(operand: &Value, input: &Value, ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    compare_pair(operand, input, ctx, Ordering::Greater)
}

fn lt_eval(operand: &Value, input: &Value, ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    compare_pair(operand, input, ctx, Ordering::Less)
}

fn not_eval(operand: &Value, input: &Value, ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    Ok(Value::Bool(!util::truthy(&evaluate(operand, input, ctx))))
}

fn and_eval(operand: &Value, input: &Value, ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    for e in util::as_arr(operand)? {
        if !util::truthy(&evaluate(e, input, ctx)) {
            return Ok(Value::Bool(false));
        }
    }
    Ok(Value::Bool(true))
}

fn or_eval(operand: &Value, input: &Value, ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    for e in util::as_arr(operand)? {
        if util::truthy(&evaluate(e, input, ctx)) {
            return Ok(Value::Bool(true));
        }
    }
    Ok(Value::Bool(false))
}

/// `true` unless the value is `null`. `''`, `0` and `false` are defined.
fn defined_eval(operand: &Value, input: &Value, ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    Ok(Value::Bool(util::is_present(&evaluate(operand, input, ctx))))
}

fn check_pair(operand: &Value, v: &mut Validator) {
    match operand.as_array() {
        Some(pair) if pair.len() == 2 => {
            v.operand(operand, &Operand::ExprList);
        }
        _ => v.error(ErrorCode::InvalidOperand, "expected exactly two expressions"),
    }
}

const IF: Operand = Operand::Fields(&[
    Field::required("condition", Operand::Expr),
    Field::required("then", Operand::Expr),
    Field::required("else", Operand::Expr),
]);

const CASE: Operand = Operand::Fields(&[
    Field::required("case", Operand::Expr),
    Field::required("value", Operand::Expr),
]);

const DEFAULT_CASE: Operand = Operand::Fields(&[
    Field::optional("case", Operand::Expr),
    Field::required("value", Operand::Expr),
]);

fn check_match(operand: &Value, v: &mut Validator) {
    let Some(candidates) = operand.as_array() else {
        v.error(ErrorCode::InvalidOperand, "expected an array of cases");
        return;
    };
    let last = candidates.len().saturating_sub(1);
    for (i, candidate) in candidates.iter().enumerate() {
        let shape = if i == last { &DEFAULT_CASE } else { &CASE };
        v.at(&i.to_string(), |v| v.operand(candidate, shape));
    }
}

pub fn operators() -> Vec<Arc<OperatorDefinition>> {
    vec![
        OperatorDefinition::new("if", IF, if_eval),
        OperatorDefinition::new("match", Operand::Custom(check_match), match_eval),
        OperatorDefinition::new("equals", Operand::ExprList, equals_eval),
        OperatorDefinition::new("gt", Operand::Custom(check_pair), gt_eval),
        OperatorDefinition::new("lt", Operand::Custom(check_pair), lt_eval),
        OperatorDefinition::new("not", Operand::Expr, not_eval),
        OperatorDefinition::new("and", Operand::ExprList, and_eval),
        OperatorDefinition::new("or", Operand::ExprList, or_eval),
        OperatorDefinition::new("defined", Operand::Expr, defined_eval),
    ]
}
