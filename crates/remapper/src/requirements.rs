//! Field requirement checks used by form-like consumers.
//!
//! A requirement only treats `null` as missing: `''`, `0` and `false` satisfy
//! `required`. Each check returns the first violated requirement.

use crate::util;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One requirement object. A single object may combine several rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct Requirement {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl Requirement {
    fn is_required(&self) -> bool {
        self.required == Some(true)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldKind {
    Enum,
    Tags,
    String,
    Number,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ViolationCode {
    Required,
    Type,
    Enum,
    Regex,
    MinLength,
    MaxLength,
    Min,
    Max,
    MinItems,
    MaxItems,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub code: ViolationCode,
    /// Index of the violated requirement, if one was involved.
    pub index: Option<usize>,
    pub error_message: Option<String>,
}

impl Violation {
    fn of(code: ViolationCode, index: usize, requirement: &Requirement) -> Self {
        Violation {
            code,
            index: Some(index),
            error_message: requirement.error_message.clone(),
        }
    }

    fn bare(code: ViolationCode) -> Self {
        Violation {
            code,
            index: None,
            error_message: None,
        }
    }
}

fn check_required(requirements: &[Requirement]) -> Option<Violation> {
    requirements
        .iter()
        .enumerate()
        .find(|(_, r)| r.is_required())
        .map(|(i, r)| Violation::of(ViolationCode::Required, i, r))
}

fn regex_matches(requirement: &Requirement, pattern: &str, subject: &str) -> bool {
    let flags = requirement.flags.as_deref().unwrap_or_default();
    util::build_regex(pattern, flags).is_ok_and(|regex| regex.is_match(subject))
}

fn option_value(option: &Value) -> &Value {
    match option {
        Value::Object(map) if map.contains_key("value") => &map["value"],
        other => other,
    }
}

/// Checks a value chosen from `options`. Options are bare values or
/// `{ value, label }` objects.
pub fn validate_enum(options: &[Value], requirements: &[Requirement], value: &Value) -> Option<Violation> {
    if !util::is_present(value) {
        return check_required(requirements);
    }
    if !options.is_empty() && !options.iter().any(|o| util::loose_equal(option_value(o), value)) {
        return Some(Violation::bare(ViolationCode::Enum));
    }
    None
}

pub fn validate_tags(requirements: &[Requirement], value: &Value) -> Option<Violation> {
    if !util::is_present(value) {
        return check_required(requirements);
    }
    let Some(tags) = value.as_array() else {
        return Some(Violation::bare(ViolationCode::Type));
    };
    for (i, requirement) in requirements.iter().enumerate() {
        if let Some(pattern) = &requirement.regex {
            let all_match = tags
                .iter()
                .all(|tag| tag.as_str().is_some_and(|t| regex_matches(requirement, pattern, t)));
            if !all_match {
                return Some(Violation::of(ViolationCode::Regex, i, requirement));
            }
        }
        if requirement.min_items.is_some_and(|min| tags.len() < min) {
            return Some(Violation::of(ViolationCode::MinItems, i, requirement));
        }
        if requirement.max_items.is_some_and(|max| tags.len() > max) {
            return Some(Violation::of(ViolationCode::MaxItems, i, requirement));
        }
    }
    None
}

pub fn validate_string(requirements: &[Requirement], value: &Value) -> Option<Violation> {
    if !util::is_present(value) {
        return check_required(requirements);
    }
    let Some(s) = value.as_str() else {
        return Some(Violation::bare(ViolationCode::Type));
    };
    let len = s.chars().count();
    for (i, requirement) in requirements.iter().enumerate() {
        if let Some(pattern) = &requirement.regex {
            if !regex_matches(requirement, pattern, s) {
                return Some(Violation::of(ViolationCode::Regex, i, requirement));
            }
        }
        if requirement.min_length.is_some_and(|min| len < min) {
            return Some(Violation::of(ViolationCode::MinLength, i, requirement));
        }
        if requirement.max_length.is_some_and(|max| len > max) {
            return Some(Violation::of(ViolationCode::MaxLength, i, requirement));
        }
    }
    None
}

pub fn validate_number(requirements: &[Requirement], value: &Value) -> Option<Violation> {
    if !util::is_present(value) {
        return check_required(requirements);
    }
    let Some(n) = value.as_f64() else {
        return Some(Violation::bare(ViolationCode::Type));
    };
    for (i, requirement) in requirements.iter().enumerate() {
        if requirement.min.is_some_and(|min| n < min) {
            return Some(Violation::of(ViolationCode::Min, i, requirement));
        }
        if requirement.max.is_some_and(|max| n > max) {
            return Some(Violation::of(ViolationCode::Max, i, requirement));
        }
    }
    None
}

pub fn validate_field(
    kind: FieldKind,
    options: &[Value],
    requirements: &[Requirement],
    value: &Value,
) -> Option<Violation> {
    match kind {
        FieldKind::Enum => validate_enum(options, requirements, value),
        FieldKind::Tags => validate_tags(requirements, value),
        FieldKind::String => validate_string(requirements, value),
        FieldKind::Number => validate_number(requirements, value),
    }
}
