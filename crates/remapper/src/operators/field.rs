//! `field.validate`: apply field requirements to the piped value.

use crate::error::RemapError;
use crate::eval_ctx::EvalCtx;
use crate::requirements::{validate_field, FieldKind, Requirement};
use crate::types::{Field, OperatorDefinition, Operand};
use crate::util;
use crate::validate::{ErrorCode, Validator};
use serde_json::Value;
use std::sync::Arc;

fn parse_requirements(operand: &Value) -> Result<Vec<Requirement>, RemapError> {
    match operand.get("requirements") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(requirements) => serde_json::from_value(requirements.clone())
            .map_err(|e| RemapError::operand("field.validate", e.to_string())),
    }
}

fn field_validate_eval(operand: &Value, input: &Value, _ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    let kind: FieldKind = serde_json::from_value(operand["type"].clone())
        .map_err(|e| RemapError::operand("field.validate", e.to_string()))?;
    let options: &[Value] = match operand.get("enum") {
        Some(options) => util::as_arr(options)?.as_slice(),
        None => &[],
    };
    let requirements = parse_requirements(operand)?;
    match validate_field(kind, options, &requirements, input) {
        Some(violation) => serde_json::to_value(violation)
            .map_err(|e| RemapError::operand("field.validate", e.to_string())),
        None => Ok(Value::Null),
    }
}

const FIELD: Operand = Operand::Fields(&[
    Field::required("type", Operand::Keyword(&["enum", "tags", "string", "number"])),
    Field::optional("enum", Operand::List(&Operand::Any)),
    Field::optional("requirements", Operand::List(&Operand::Any)),
]);

fn check_field(operand: &Value, v: &mut Validator) {
    if !v.operand(operand, &FIELD) {
        return;
    }
    let Some(requirements) = operand.get("requirements").and_then(Value::as_array) else {
        return;
    };
    v.at("requirements", |v| {
        for (i, raw) in requirements.iter().enumerate() {
            v.at(&i.to_string(), |v| match serde_json::from_value::<Requirement>(raw.clone()) {
                Ok(requirement) => {
                    if let Some(pattern) = &requirement.regex {
                        let flags = requirement.flags.as_deref().unwrap_or_default();
                        v.at("regex", |v| v.regex(pattern, flags));
                    }
                }
                Err(e) => v.error(ErrorCode::InvalidRequirement, e.to_string()),
            });
        }
    });
}

pub fn operators() -> Vec<Arc<OperatorDefinition>> {
    vec![OperatorDefinition::new("field.validate", Operand::Custom(check_field), field_validate_eval)]
}
