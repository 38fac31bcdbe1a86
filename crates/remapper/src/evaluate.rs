//! The tree-walking evaluator.

use crate::context::Context;
use crate::eval_ctx::EvalCtx;
use crate::expression::Expression;
use serde_json::Value;

/// Evaluates a remapper against `input`.
///
/// This is the only entry point collaborators need. The result is always a
/// value: operators that hit bad input yield their fallback instead of
/// aborting the surrounding chain.
///
/// ```
/// use remapper::{remap, Context};
/// use serde_json::json;
///
/// let expr = json!([{ "prop": "name" }, { "string.case": "upper" }]);
/// let result = remap(&expr, &json!({ "name": "ada" }), &Context::default());
/// assert_eq!(result, json!("ADA"));
/// ```
pub fn remap(expression: &Value, input: &Value, context: &Context) -> Value {
    let mut ctx = EvalCtx::new(context, input);
    match expression {
        Value::Array(steps) => fold(steps, input, &mut ctx),
        _ => evaluate(expression, input, &mut ctx),
    }
}

/// Evaluates `expr` with `input` as the piped value.
///
/// `expr` sits inside an operand, so:
///
/// - Arrays holding at least one expression are chains, folded left to right.
///   Any other array is a literal container.
/// - Single-key objects naming an operator dispatch to that operator.
/// - Everything else is returned as a literal.
pub fn evaluate(expr: &Value, input: &Value, ctx: &mut EvalCtx<'_>) -> Value {
    match Expression::classify_nested_with(expr, ctx.operators) {
        Expression::Literal(value) => value.clone(),
        Expression::Chain(steps) => fold(steps, input, ctx),
        Expression::Call { operator, operand } => {
            tracing::trace!(operator = operator.name, "remap");
            match (operator.eval_fn)(operand, input, ctx) {
                Ok(value) => value,
                Err(err) => {
                    tracing::debug!(operator = operator.name, error = %err, "remapper failed soft");
                    operator.fallback.value()
                }
            }
        }
    }
}

/// Threads `input` through `steps`. An empty chain is the identity.
fn fold(steps: &[Value], input: &Value, ctx: &mut EvalCtx<'_>) -> Value {
    let mut value = input.clone();
    for step in steps {
        value = evaluate(step, &value, ctx);
    }
    value
}
