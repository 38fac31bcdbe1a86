//! The shapes a remapper expression can take.

use crate::operators::operators_map;
use crate::types::{OperatorDefinition, OperatorMap};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A classified view of a JSON value at an expression position.
#[derive(Debug, Clone, Copy)]
pub enum Expression<'a> {
    /// Returned unchanged; never observes the input or the context.
    Literal(&'a Value),
    /// Evaluated left to right, each output becoming the next input.
    Chain(&'a [Value]),
    /// A single-key object naming a known operator.
    Call {
        operator: &'a OperatorDefinition,
        operand: &'a Value,
    },
}

impl<'a> Expression<'a> {
    /// Classifies `value` against the built-in operator table.
    pub fn classify(value: &'a Value) -> Expression<'a> {
        Self::classify_with(value, operators_map())
    }

    pub fn classify_with(value: &'a Value, operators: &'a OperatorMap) -> Expression<'a> {
        match value {
            Value::Array(items) => Expression::Chain(items),
            Value::Object(map) if map.len() == 1 => {
                let Some((name, operand)) = map.iter().next() else {
                    return Expression::Literal(value);
                };
                match operators.get(name.as_str()) {
                    Some(operator) => Expression::Call {
                        operator: operator.as_ref(),
                        operand,
                    },
                    None => Expression::Literal(value),
                }
            }
            _ => Expression::Literal(value),
        }
    }

    /// Classifies a value nested inside an operand.
    ///
    /// Arrays there are only chains when at least one element is itself an
    /// expression; `[1, 2, 3]` stays a literal container. An empty array has
    /// no such element and is a literal too.
    pub fn classify_nested_with(value: &'a Value, operators: &'a OperatorMap) -> Expression<'a> {
        match value {
            Value::Array(items) if !items.iter().any(|item| is_expression(item, operators)) => {
                Expression::Literal(value)
            }
            _ => Self::classify_with(value, operators),
        }
    }

    pub fn is_chain(&self) -> bool {
        matches!(self, Expression::Chain(_))
    }

    pub fn operator_name(&self) -> Option<&'static str> {
        match self {
            Expression::Call { operator, .. } => Some(operator.name),
            _ => None,
        }
    }

    pub fn operand(&self) -> Option<&'a Value> {
        match *self {
            Expression::Call { operand, .. } => Some(operand),
            _ => None,
        }
    }
}

/// Whether `value` would be evaluated rather than returned as written.
pub fn is_expression(value: &Value, operators: &OperatorMap) -> bool {
    match value {
        Value::Array(_) => true,
        Value::Object(map) if map.len() == 1 => map.keys().any(|name| operators.contains_key(name.as_str())),
        _ => false,
    }
}

/// A remapper as stored inside an app definition.
///
/// Serializes exactly as authored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Remapper(pub Value);

impl Remapper {
    pub fn new(value: Value) -> Self {
        Remapper(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn expression(&self) -> Expression<'_> {
        Expression::classify(&self.0)
    }
}

impl From<Value> for Remapper {
    fn from(value: Value) -> Self {
        Remapper(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify() {
        let chain = json!([{ "prop": "a" }]);
        assert!(Expression::classify(&chain).is_chain());

        let call = json!({ "prop": "a" });
        let expr = Expression::classify(&call);
        assert_eq!(expr.operator_name(), Some("prop"));
        assert_eq!(expr.operand(), Some(&json!("a")));

        for literal in [json!("x"), json!(1), json!(null), json!({}), json!({ "a": 1, "b": 2 }), json!({ "nope": 1 })] {
            assert!(matches!(Expression::classify(&literal), Expression::Literal(_)), "{literal}");
        }
    }

    #[test]
    fn test_classify_nested() {
        let operators = operators_map();
        for literal in [json!([1, 2, 3]), json!([]), json!(["a", { "b": 1 }])] {
            assert!(
                matches!(Expression::classify_nested_with(&literal, operators), Expression::Literal(_)),
                "{literal}"
            );
        }
        for chain in [json!([{ "prop": "a" }]), json!([1, [2]]), json!([[]])] {
            assert!(Expression::classify_nested_with(&chain, operators).is_chain(), "{chain}");
        }
        assert!(Expression::classify(&json!([1, 2, 3])).is_chain());
    }

    #[test]
    fn test_remapper_serializes_as_authored() {
        let remapper: Remapper = serde_json::from_str(r#"[{"prop":"a"},{"string.case":"upper"}]"#).unwrap();
        assert!(remapper.expression().is_chain());
        assert_eq!(
            serde_json::to_string(&remapper).unwrap(),
            r#"[{"prop":"a"},{"string.case":"upper"}]"#
        );
    }
}
