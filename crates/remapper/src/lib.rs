//! Remapper evaluator: declarative JSON data transformations.
//!
//! # Overview
//!
//! A remapper is a JSON value describing how to turn an input value into an
//! output value. Three forms exist:
//!
//! - an array is a chain, each step receiving the previous step's result
//!   (nested inside an operand, an array holding no expressions is a literal);
//! - an object with exactly one key naming a known operator is a call;
//! - anything else is a literal and evaluates to itself.
//!
//! Evaluation never fails. An operator handed input it cannot process yields
//! its fallback (`null`, `[]` or `{}`) and the surrounding chain continues.
//! Structural problems are caught ahead of time by [`validate`].
//!
//! # Example
//!
//! ```
//! use remapper::{remap, validate, Context};
//! use serde_json::json;
//!
//! let expr = json!([{ "prop": "items" }, { "array.map": { "math.add": 1 } }]);
//! assert!(validate(&expr).is_ok());
//!
//! let result = remap(&expr, &json!({ "items": [1, 2, 3] }), &Context::default());
//! assert_eq!(result, json!([2, 3, 4]));
//! ```

pub mod context;
pub mod error;
pub mod eval_ctx;
pub mod evaluate;
pub mod expression;
pub mod messages;
pub mod operators;
pub mod requirements;
pub mod types;
pub mod util;
pub mod validate;

pub use context::{AppMetadata, Context, ContextConfig, MessageCatalog, NoMessages, StaticMessages, UserInfo};
pub use error::{ConfigError, RemapError};
pub use eval_ctx::{ArrayItem, EvalCtx};
pub use evaluate::{evaluate, remap};
pub use expression::{Expression, Remapper};
pub use messages::{format_message, MessageCache};
pub use operators::operators_map;
pub use requirements::{FieldKind, Requirement, Violation, ViolationCode};
pub use types::{Fallback, Field, OperatorDefinition, OperatorMap, Operand};
pub use validate::{validate, ErrorCode, ValidationError, ValidationErrors, Validator};
