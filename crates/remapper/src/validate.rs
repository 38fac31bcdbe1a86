//! Structural validation of remapper definitions.
//!
//! Runs once when a definition is published. It never evaluates anything and
//! reports every problem it finds instead of stopping at the first one.

use crate::operators::operators_map;
use crate::types::{OperatorMap, Operand};
use crate::util;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    UnknownOperator,
    InvalidOperand,
    MissingProperty,
    UnknownProperty,
    InvalidRegex,
    UnknownComparator,
    UnknownType,
    InvalidFormat,
    InvalidDuration,
    InvalidRequirement,
}

impl ErrorCode {
    pub fn name(self) -> &'static str {
        match self {
            ErrorCode::UnknownOperator => "unknown_operator",
            ErrorCode::InvalidOperand => "invalid_operand",
            ErrorCode::MissingProperty => "missing_property",
            ErrorCode::UnknownProperty => "unknown_property",
            ErrorCode::InvalidRegex => "invalid_regex",
            ErrorCode::UnknownComparator => "unknown_comparator",
            ErrorCode::UnknownType => "unknown_type",
            ErrorCode::InvalidFormat => "invalid_format",
            ErrorCode::InvalidDuration => "invalid_duration",
            ErrorCode::InvalidRequirement => "invalid_requirement",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A single problem, located by a JSON Pointer into the validated document.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[error("{path}: {code}: {message}")]
pub struct ValidationError {
    pub path: String,
    pub code: ErrorCode,
    pub message: String,
}

/// Every problem found in a document.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("invalid remapper ({} error(s)): {}", .0.len(), .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }

    pub fn codes(&self) -> Vec<ErrorCode> {
        self.0.iter().map(|e| e.code).collect()
    }
}

/// Validates a remapper expression.
///
/// ```
/// use remapper::validate;
/// use serde_json::json;
///
/// assert!(validate(&json!([{ "prop": "a" }, { "string.case": "upper" }])).is_ok());
///
/// let errors = validate(&json!({ "string.case": "title" })).unwrap_err();
/// assert_eq!(errors.0[0].path, "/string.case");
/// ```
pub fn validate(document: &Value) -> Result<(), ValidationErrors> {
    let mut validator = Validator::new();
    validator.expression(document);
    validator.finish()
}

/// Walks a document, tracking the current location and collecting errors.
pub struct Validator {
    path: Vec<String>,
    errors: Vec<ValidationError>,
    operators: &'static OperatorMap,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator {
    pub fn new() -> Self {
        Validator {
            path: Vec::new(),
            errors: Vec::new(),
            operators: operators_map(),
        }
    }

    /// The current location as a JSON Pointer.
    pub fn path(&self) -> String {
        self.path
            .iter()
            .map(|segment| format!("/{}", util::escape_component(segment)))
            .collect()
    }

    pub fn error(&mut self, code: ErrorCode, message: impl Into<String>) {
        self.errors.push(ValidationError {
            path: self.path(),
            code,
            message: message.into(),
        });
    }

    /// Runs `f` one level deeper, at `segment`.
    pub fn at<R>(&mut self, segment: &str, f: impl FnOnce(&mut Self) -> R) -> R {
        self.path.push(segment.to_string());
        let result = f(self);
        self.path.pop();
        result
    }

    pub fn regex(&mut self, pattern: &str, flags: &str) {
        if let Err(e) = util::build_regex(pattern, flags) {
            self.error(ErrorCode::InvalidRegex, e.to_string());
        }
    }

    /// Validates a value at an expression position.
    pub fn expression(&mut self, value: &Value) {
        match value {
            Value::Array(steps) => {
                for (i, step) in steps.iter().enumerate() {
                    self.at(&i.to_string(), |v| v.expression(step));
                }
            }
            Value::Object(map) if map.len() == 1 => {
                let Some((name, operand)) = map.iter().next() else {
                    return;
                };
                let operators = self.operators;
                self.at(name, |v| match operators.get(name.as_str()) {
                    Some(definition) => {
                        v.operand(operand, &definition.operand);
                    }
                    None => v.error(ErrorCode::UnknownOperator, format!("unknown operator \"{name}\"")),
                });
            }
            _ => {}
        }
    }

    /// Checks `value` against `shape`. Returns whether it conformed.
    pub fn operand(&mut self, value: &Value, shape: &Operand) -> bool {
        let before = self.errors.len();
        match shape {
            Operand::Expr => self.expression(value),
            Operand::ExprList => match value.as_array() {
                Some(items) => {
                    for (i, item) in items.iter().enumerate() {
                        self.at(&i.to_string(), |v| v.expression(item));
                    }
                }
                None => self.mismatch(shape),
            },
            Operand::ExprMap => match value.as_object() {
                Some(map) => {
                    for (key, item) in map {
                        self.at(key, |v| v.expression(item));
                    }
                }
                None => self.mismatch(shape),
            },
            Operand::List(inner) => match value.as_array() {
                Some(items) => {
                    for (i, item) in items.iter().enumerate() {
                        self.at(&i.to_string(), |v| v.operand(item, inner));
                    }
                }
                None => self.mismatch(shape),
            },
            Operand::Either(options) => self.either(value, options),
            Operand::Fields(fields) => match value.as_object() {
                Some(map) => {
                    for key in map.keys() {
                        if !fields.iter().any(|f| f.name == key.as_str()) {
                            self.at(key, |v| {
                                v.error(ErrorCode::UnknownProperty, format!("unknown property \"{key}\""));
                            });
                        }
                    }
                    for field in fields.iter() {
                        match map.get(field.name) {
                            Some(item) => {
                                self.at(field.name, |v| v.operand(item, &field.operand));
                            }
                            None if field.required => self.error(
                                ErrorCode::MissingProperty,
                                format!("missing required property \"{}\"", field.name),
                            ),
                            None => {}
                        }
                    }
                }
                None => self.mismatch(shape),
            },
            Operand::Custom(check) => check(value, self),
            Operand::Null
            | Operand::Str
            | Operand::Int
            | Operand::Index
            | Operand::Bool
            | Operand::Any
            | Operand::Keyword(_) => {
                if !scalar_matches(shape, value) {
                    self.mismatch(shape);
                }
            }
        }
        self.errors.len() == before
    }

    fn mismatch(&mut self, shape: &Operand) {
        self.error(ErrorCode::InvalidOperand, format!("expected {}", describe(shape)));
    }

    /// Accepts the first alternative that validates cleanly. Otherwise, when a
    /// single alternative has the right JSON kind its errors are reported,
    /// and a generic mismatch is reported in all other cases.
    fn either(&mut self, value: &Value, options: &[Operand]) {
        let mut candidates = Vec::new();
        for option in options {
            let mut scratch = Validator {
                path: self.path.clone(),
                errors: Vec::new(),
                operators: self.operators,
            };
            if scratch.operand(value, option) {
                return;
            }
            if kind_matches(option, value) {
                candidates.push(scratch.errors);
            }
        }
        if candidates.len() == 1 {
            self.errors.extend(candidates.remove(0));
        } else {
            self.error(
                ErrorCode::InvalidOperand,
                format!("expected {}", describe_all(options)),
            );
        }
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn finish(self) -> Result<(), ValidationErrors> {
        tracing::debug!(errors = self.errors.len(), "validated remapper");
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(self.errors))
        }
    }
}

fn scalar_matches(shape: &Operand, value: &Value) -> bool {
    match shape {
        Operand::Null => value.is_null(),
        Operand::Str => value.is_string(),
        Operand::Int => value.is_u64(),
        Operand::Index => value.is_i64() || value.is_u64(),
        Operand::Bool => value.is_boolean(),
        Operand::Any => true,
        Operand::Keyword(words) => value.as_str().is_some_and(|s| words.iter().any(|w| *w == s)),
        _ => false,
    }
}

/// Whether `value` has the JSON kind `shape` expects, ignoring details.
fn kind_matches(shape: &Operand, value: &Value) -> bool {
    match shape {
        Operand::Expr | Operand::Any | Operand::Custom(_) => true,
        Operand::ExprList | Operand::List(_) => value.is_array(),
        Operand::ExprMap | Operand::Fields(_) => value.is_object(),
        Operand::Null => value.is_null(),
        Operand::Str | Operand::Keyword(_) => value.is_string(),
        Operand::Int | Operand::Index => value.is_number(),
        Operand::Bool => value.is_boolean(),
        Operand::Either(options) => options.iter().any(|o| kind_matches(o, value)),
    }
}

fn describe_all(options: &[Operand]) -> String {
    options.iter().map(describe).collect::<Vec<_>>().join(" or ")
}

fn describe(shape: &Operand) -> String {
    match shape {
        Operand::Expr => "a remapper".to_string(),
        Operand::ExprList => "an array of remappers".to_string(),
        Operand::ExprMap => "an object of remappers".to_string(),
        Operand::Null => "null".to_string(),
        Operand::Str => "a string".to_string(),
        Operand::Int => "a non-negative integer".to_string(),
        Operand::Index => "an integer".to_string(),
        Operand::Bool => "a boolean".to_string(),
        Operand::Any => "any value".to_string(),
        Operand::Keyword(words) => {
            let quoted: Vec<String> = words.iter().map(|w| format!("\"{w}\"")).collect();
            format!("one of {}", quoted.join(", "))
        }
        Operand::List(inner) => format!("an array of {}", describe(inner)),
        Operand::Either(options) => describe_all(options),
        Operand::Fields(fields) => {
            let names: Vec<&str> = fields.iter().map(|f| f.name).collect();
            format!("an object with {}", names.join(", "))
        }
        Operand::Custom(_) => "a valid operand".to_string(),
    }
}
