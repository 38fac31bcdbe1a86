//! Date operators.
//!
//! Dates travel between operators as ISO-8601 strings in UTC with millisecond
//! precision (`2024-01-31T09:30:00.000Z`). Format strings use `chrono`'s
//! strftime syntax. "Now" always comes from the context.

use crate::error::RemapError;
use crate::eval_ctx::EvalCtx;
use crate::types::{OperatorDefinition, Operand};
use crate::validate::{ErrorCode, Validator};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::Value;
use std::fmt::Write;
use std::sync::Arc;

pub fn to_iso(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Reads an ISO-8601 / RFC 3339 string, a bare `YYYY-MM-DD` date or epoch
/// milliseconds.
pub fn parse_date(value: &Value) -> Result<DateTime<Utc>, RemapError> {
    match value {
        Value::String(s) => parse_iso(s),
        Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::from_timestamp_millis)
            .ok_or_else(|| RemapError::NotDate(n.to_string())),
        other => Err(RemapError::NotDate(other.to_string())),
    }
}

fn parse_iso(s: &str) -> Result<DateTime<Utc>, RemapError> {
    if let Ok(date) = DateTime::parse_from_rfc3339(s) {
        return Ok(date.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(date.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|d| d.and_utc())
        .ok_or_else(|| RemapError::NotDate(s.to_string()))
}

fn parse_with_format(s: &str, format: &str) -> Result<DateTime<Utc>, RemapError> {
    if let Ok(date) = DateTime::parse_from_str(s, format) {
        return Ok(date.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDateTime::parse_from_str(s, format) {
        return Ok(date.and_utc());
    }
    NaiveDate::parse_from_str(s, format)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|d| d.and_utc())
        .ok_or_else(|| RemapError::NotDate(s.to_string()))
}

pub fn is_valid_format(format: &str) -> bool {
    !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}

/// Parses durations such as `1d`, `2h 30m`, `-1w` or `1500ms`.
pub fn parse_duration(source: &str) -> Result<Duration, RemapError> {
    let invalid = || RemapError::InvalidDuration(source.to_string());
    let trimmed = source.trim();
    let (negative, mut rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    if rest.trim().is_empty() {
        return Err(invalid());
    }
    let mut total: i64 = 0;
    while !rest.is_empty() {
        rest = rest.trim_start();
        let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        if digits == 0 {
            return Err(invalid());
        }
        let amount: i64 = rest[..digits].parse().map_err(|_| invalid())?;
        rest = &rest[digits..];
        let unit_len = rest.find(|c: char| !c.is_ascii_alphabetic()).unwrap_or(rest.len());
        let millis_per_unit: i64 = match &rest[..unit_len] {
            "w" => 7 * 24 * 60 * 60 * 1000,
            "d" => 24 * 60 * 60 * 1000,
            "h" => 60 * 60 * 1000,
            "m" => 60 * 1000,
            "s" => 1000,
            "ms" => 1,
            _ => return Err(invalid()),
        };
        rest = rest[unit_len..].trim_start();
        total = amount
            .checked_mul(millis_per_unit)
            .and_then(|millis| total.checked_add(millis))
            .ok_or_else(invalid)?;
    }
    Ok(Duration::milliseconds(if negative { -total } else { total }))
}

fn now_eval(_operand: &Value, _input: &Value, ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    Ok(Value::from(to_iso(&ctx.context.now)))
}

fn parse_eval(operand: &Value, input: &Value, _ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    let date = match operand.as_str() {
        Some(format) if !format.is_empty() => {
            let s = input.as_str().ok_or(RemapError::NotString)?;
            parse_with_format(s, format)?
        }
        _ => parse_date(input)?,
    };
    Ok(Value::from(to_iso(&date)))
}

fn format_eval(operand: &Value, input: &Value, _ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    let date = parse_date(input)?;
    let Some(format) = operand.as_str().filter(|f| !f.is_empty()) else {
        return Ok(Value::from(to_iso(&date)));
    };
    let mut out = String::new();
    write!(out, "{}", date.format(format))
        .map_err(|_| RemapError::operand("date.format", format!("invalid format \"{format}\"")))?;
    Ok(Value::from(out))
}

fn add_eval(operand: &Value, input: &Value, _ctx: &mut EvalCtx<'_>) -> Result<Value, RemapError> {
    let duration = parse_duration(operand.as_str().unwrap_or_default())?;
    let date = parse_date(input)?;
    let shifted = date
        .checked_add_signed(duration)
        .ok_or_else(|| RemapError::NotDate("out of range".to_string()))?;
    Ok(Value::from(to_iso(&shifted)))
}

fn check_format(operand: &Value, v: &mut Validator) {
    match operand {
        Value::Null => {}
        Value::String(format) => {
            if !is_valid_format(format) {
                v.error(ErrorCode::InvalidFormat, format!("invalid date format \"{format}\""));
            }
        }
        _ => v.error(ErrorCode::InvalidOperand, "expected null or a format string"),
    }
}

fn check_duration(operand: &Value, v: &mut Validator) {
    match operand.as_str() {
        Some(duration) => {
            if parse_duration(duration).is_err() {
                v.error(ErrorCode::InvalidDuration, format!("invalid duration \"{duration}\""));
            }
        }
        None => v.error(ErrorCode::InvalidOperand, "expected a duration string"),
    }
}

pub fn operators() -> Vec<Arc<OperatorDefinition>> {
    vec![
        OperatorDefinition::new("date.now", Operand::Null, now_eval),
        OperatorDefinition::new("date.parse", Operand::Custom(check_format), parse_eval),
        OperatorDefinition::new("date.format", Operand::Custom(check_format), format_eval),
        OperatorDefinition::new("date.add", Operand::Custom(check_duration), add_eval),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("1d").unwrap(), Duration::days(1));
        assert_eq!(parse_duration("2h 30m").unwrap(), Duration::minutes(150));
        assert_eq!(parse_duration("-1w").unwrap(), Duration::weeks(-1));
        assert_eq!(parse_duration("1500ms").unwrap(), Duration::milliseconds(1500));
        assert!(parse_duration("").is_err());
        assert!(parse_duration("5").is_err());
        assert!(parse_duration("3 years").is_err());
    }

    #[test]
    fn test_parse_date_forms() {
        let expected = "2024-03-01T00:00:00.000Z";
        assert_eq!(to_iso(&parse_date(&json!("2024-03-01")).unwrap()), expected);
        assert_eq!(to_iso(&parse_date(&json!("2024-03-01T00:00:00Z")).unwrap()), expected);
        assert_eq!(to_iso(&parse_date(&json!("2024-03-01T01:00:00+01:00")).unwrap()), expected);
        assert_eq!(to_iso(&parse_date(&json!(1709251200000_i64)).unwrap()), expected);
        assert!(parse_date(&json!("tomorrow")).is_err());
        assert!(parse_date(&json!(true)).is_err());
    }

    #[test]
    fn test_format_validation() {
        assert!(is_valid_format("%Y-%m-%d %H:%M"));
        assert!(!is_valid_format("%Q"));
    }
}
