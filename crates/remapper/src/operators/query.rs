//! OData `$filter` and `$orderby` builders.

use super::date::{parse_date, to_iso};
use crate::error::RemapError;
use crate::eval_ctx::EvalCtx;
use crate::evaluate::evaluate;
use crate::types::{Field, OperatorDefinition, Operand};
use crate::util;
use crate::validate::{ErrorCode, Validator};
use regex::Regex;
use serde_json::Value;
use std::sync::{Arc, OnceLock};

pub const COMPARATORS: &[&str] = &["eq", "ne", "lt", "gt", "le", "ge"];

pub const TYPES: &[&str] = &[
    "String",
    "Guid",
    "Boolean",
    "Number",
    "Byte",
    "Int16",
    "Int32",
    "Int64",
    "Single",
    "Double",
    "Decimal",
    "Date",
    "DateTime",
    "DateTimeOffset",
];

/// `a.b` addresses the navigation path `a/b`.
fn field_path(name: &str) -> String {
    name.replace('.', "/")
}

const GUID_PATTERN: &str = "^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$";

fn guid(value: &Value) -> Result<String, RemapError> {
    static GUID: OnceLock<Result<Regex, RemapError>> = OnceLock::new();
    let pattern = GUID.get_or_init(|| util::build_regex(GUID_PATTERN, "")).as_ref().map_err(Clone::clone)?;
    let s = util::as_str(value)?;
    if pattern.is_match(s) {
        Ok(s.to_string())
    } else {
        Err(RemapError::operand("filter.from", format!("\"{s}\" is not a GUID")))
    }
}

/// Unquoted numbers must be finite; strings are re-emitted as parsed.
fn number(value: &Value) -> Result<String, RemapError> {
    let n = match value {
        Value::Number(n) => return Ok(n.to_string()),
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| RemapError::NotNumber)?,
        _ => return Err(RemapError::NotNumber),
    };
    if !n.is_finite() {
        return Err(RemapError::NotNumber);
    }
    Ok(util::num(n).to_string())
}

/// Serializes `value` as an OData literal of type `ty`.
///
/// Values that would not form a valid literal of that type are rejected, so
/// the result is always a syntactically valid filter fragment.
pub fn odata_literal(ty: &str, value: &Value) -> Result<String, RemapError> {
    if value.is_null() {
        return Ok("null".to_string());
    }
    match ty {
        "String" => Ok(format!("'{}'", util::str_val(value).replace('\'', "''"))),
        "Guid" => guid(value),
        "Boolean" => match value {
            Value::Bool(b) => Ok(b.to_string()),
            _ => Err(RemapError::operand("filter.from", "expected a boolean")),
        },
        "Number" | "Byte" | "Int16" | "Int32" | "Int64" | "Single" | "Double" | "Decimal" => number(value),
        "Date" => Ok(parse_date(value)?.format("%Y-%m-%d").to_string()),
        "DateTime" | "DateTimeOffset" => Ok(to_iso(&parse_date(value)?)),
        other => Err(RemapError::operand("filter.from", format!("unknown type \"{other}\""))),
    }
}

fn filter_from_eval(operand: &Value, input: &Value, ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    let fields = util::as_obj(operand)?;
    let mut fragments = Vec::with_capacity(fields.len());
    for (name, spec) in fields {
        let ty = util::as_str(&spec["type"])?;
        let comparator = spec.get("comparator").and_then(Value::as_str).unwrap_or("eq");
        if !COMPARATORS.iter().any(|c| *c == comparator) {
            return Err(RemapError::operand("filter.from", format!("unknown comparator \"{comparator}\"")));
        }
        let value = evaluate(&spec["value"], input, ctx);
        fragments.push(format!("{} {} {}", field_path(name), comparator, odata_literal(ty, &value)?));
    }
    Ok(Value::from(fragments.join(" and ")))
}

fn order_from_eval(operand: &Value, _input: &Value, _ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    let fields = util::as_obj(operand)?;
    let mut parts = Vec::with_capacity(fields.len());
    for (name, direction) in fields {
        let direction = match direction.as_str() {
            Some(d @ ("asc" | "desc")) => d,
            _ => return Err(RemapError::operand("order.from", "expected \"asc\" or \"desc\"")),
        };
        parts.push(format!("{} {}", field_path(name), direction));
    }
    Ok(Value::from(parts.join(",")))
}

const FILTER_FIELD: Operand = Operand::Fields(&[
    Field::required("type", Operand::Str),
    Field::optional("comparator", Operand::Str),
    Field::optional("value", Operand::Expr),
]);

fn check_filter(operand: &Value, v: &mut Validator) {
    let Some(fields) = operand.as_object() else {
        v.error(ErrorCode::InvalidOperand, "expected an object of field filters");
        return;
    };
    for (name, spec) in fields {
        v.at(name, |v| {
            if !v.operand(spec, &FILTER_FIELD) {
                return;
            }
            if let Some(ty) = spec["type"].as_str() {
                if !TYPES.iter().any(|t| *t == ty) {
                    v.at("type", |v| {
                        v.error(ErrorCode::UnknownType, format!("unknown OData type \"{ty}\""));
                    });
                }
            }
            if let Some(comparator) = spec.get("comparator").and_then(Value::as_str) {
                if !COMPARATORS.iter().any(|c| *c == comparator) {
                    v.at("comparator", |v| {
                        v.error(
                            ErrorCode::UnknownComparator,
                            format!(
                                "unknown comparator \"{comparator}\", expected one of {}",
                                COMPARATORS.join(", ")
                            ),
                        );
                    });
                }
            }
        });
    }
}

const DIRECTION: Operand = Operand::Keyword(&["asc", "desc"]);

fn check_order(operand: &Value, v: &mut Validator) {
    let Some(fields) = operand.as_object() else {
        v.error(ErrorCode::InvalidOperand, "expected an object of field directions");
        return;
    };
    for (name, direction) in fields {
        v.at(name, |v| {
            v.operand(direction, &DIRECTION);
        });
    }
}

pub fn operators() -> Vec<Arc<OperatorDefinition>> {
    vec![
        OperatorDefinition::new("filter.from", Operand::Custom(check_filter), filter_from_eval),
        OperatorDefinition::new("order.from", Operand::Custom(check_order), order_from_eval),
    ]
}
