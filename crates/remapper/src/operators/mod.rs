//! The built-in operator library.

pub mod array;
pub mod context;
pub mod date;
pub mod field;
pub mod history;
pub mod logic;
pub mod math;
pub mod object;
pub mod query;
pub mod string;
pub mod value;

use crate::types::{operators_to_map, OperatorDefinition, OperatorMap};
use std::sync::{Arc, OnceLock};

/// All built-in operators.
pub fn all_operators() -> Vec<Arc<OperatorDefinition>> {
    let mut ops = Vec::new();
    ops.extend(object::operators());
    ops.extend(value::operators());
    ops.extend(history::operators());
    ops.extend(string::operators());
    ops.extend(array::operators());
    ops.extend(date::operators());
    ops.extend(logic::operators());
    ops.extend(math::operators());
    ops.extend(query::operators());
    ops.extend(context::operators());
    ops.extend(field::operators());
    ops
}

/// The operator table, built once on first use.
pub fn operators_map() -> &'static OperatorMap {
    static OPERATORS: OnceLock<OperatorMap> = OnceLock::new();
    OPERATORS.get_or_init(|| operators_to_map(all_operators()))
}
