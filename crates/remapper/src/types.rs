use crate::error::RemapError;
use crate::eval_ctx::EvalCtx;
use crate::validate::Validator;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// The type of an operator evaluation function.
///
/// Receives the operator's raw operand, the value piped into it and the
/// evaluation state. Operand positions that hold sub-expressions are evaluated
/// by the implementation itself via [`crate::evaluate::evaluate`].
pub type EvalFn = for<'a> fn(&Value, &Value, &mut EvalCtx<'a>) -> Result<Value, RemapError>;

/// A structural check for operands that do not fit a declarative [`Operand`].
pub type CheckFn = fn(&Value, &mut Validator);

/// Declared shape of an operator's operand, consumed by the validator.
#[derive(Clone, Copy)]
pub enum Operand {
    /// Any remapper expression.
    Expr,
    /// An array whose every element is an expression (not a chain).
    ExprList,
    /// An object whose every value is an expression.
    ExprMap,
    /// Must be `null`.
    Null,
    Str,
    /// A non-negative integer.
    Int,
    /// Any integer; negative values count back from the end of an array.
    Index,
    Bool,
    /// Any literal JSON value; never evaluated.
    Any,
    /// One of a fixed set of strings.
    Keyword(&'static [&'static str]),
    /// An array whose elements all match the inner shape.
    List(&'static Operand),
    /// The first matching alternative wins.
    Either(&'static [Operand]),
    /// An object with named properties. Unknown properties are rejected.
    Fields(&'static [Field]),
    Custom(CheckFn),
}

impl std::fmt::Debug for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operand::Expr => f.write_str("Expr"),
            Operand::ExprList => f.write_str("ExprList"),
            Operand::ExprMap => f.write_str("ExprMap"),
            Operand::Null => f.write_str("Null"),
            Operand::Str => f.write_str("Str"),
            Operand::Int => f.write_str("Int"),
            Operand::Index => f.write_str("Index"),
            Operand::Bool => f.write_str("Bool"),
            Operand::Any => f.write_str("Any"),
            Operand::Keyword(words) => f.debug_tuple("Keyword").field(words).finish(),
            Operand::List(inner) => f.debug_tuple("List").field(inner).finish(),
            Operand::Either(options) => f.debug_tuple("Either").field(options).finish(),
            Operand::Fields(fields) => f.debug_tuple("Fields").field(fields).finish(),
            Operand::Custom(_) => f.write_str("Custom"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub required: bool,
    pub operand: Operand,
}

impl Field {
    pub const fn required(name: &'static str, operand: Operand) -> Self {
        Field {
            name,
            required: true,
            operand,
        }
    }

    pub const fn optional(name: &'static str, operand: Operand) -> Self {
        Field {
            name,
            required: false,
            operand,
        }
    }
}

/// What an operator yields when its evaluation fails soft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    Null,
    EmptyArray,
    EmptyObject,
}

impl Fallback {
    pub fn value(self) -> Value {
        match self {
            Fallback::Null => Value::Null,
            Fallback::EmptyArray => Value::Array(Vec::new()),
            Fallback::EmptyObject => Value::Object(Map::new()),
        }
    }
}

/// An operator definition: name, operand shape, implementation and the value
/// it produces when evaluation fails soft.
pub struct OperatorDefinition {
    pub name: &'static str,
    pub operand: Operand,
    pub eval_fn: EvalFn,
    pub fallback: Fallback,
}

impl OperatorDefinition {
    pub fn new(name: &'static str, operand: Operand, eval_fn: EvalFn) -> Arc<Self> {
        Arc::new(OperatorDefinition {
            name,
            operand,
            eval_fn,
            fallback: Fallback::Null,
        })
    }

    pub fn container(
        name: &'static str,
        operand: Operand,
        eval_fn: EvalFn,
        fallback: Fallback,
    ) -> Arc<Self> {
        Arc::new(OperatorDefinition {
            name,
            operand,
            eval_fn,
            fallback,
        })
    }
}

impl std::fmt::Debug for OperatorDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperatorDefinition")
            .field("name", &self.name)
            .field("operand", &self.operand)
            .field("fallback", &self.fallback)
            .finish()
    }
}

/// Map of operator name -> definition.
pub type OperatorMap = HashMap<String, Arc<OperatorDefinition>>;

/// Builds an `OperatorMap` from a list of operator definitions.
pub fn operators_to_map(operators: Vec<Arc<OperatorDefinition>>) -> OperatorMap {
    let mut map = HashMap::with_capacity(operators.len());
    for op in operators {
        let previous = map.insert(op.name.to_string(), Arc::clone(&op));
        debug_assert!(previous.is_none(), "duplicate operator {}", op.name);
    }
    map
}
