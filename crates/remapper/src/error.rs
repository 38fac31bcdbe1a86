use thiserror::Error;

/// Evaluation-time anomalies raised by operator implementations.
///
/// These never escape [`crate::remap`]: the evaluator converts them into the
/// failing operator's fallback value and keeps going.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RemapError {
    #[error("NOT_OBJECT")]
    NotObject,

    #[error("NOT_ARRAY")]
    NotArray,

    #[error("NOT_STRING")]
    NotString,

    #[error("NOT_NUMBER")]
    NotNumber,

    #[error("NOT_DATE: {0}")]
    NotDate(String),

    #[error("DIVISION_BY_ZERO")]
    DivisionByZero,

    #[error("OUT_OF_BOUNDS")]
    OutOfBounds,

    #[error("Invalid regular expression: {0}")]
    InvalidRegex(String),

    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    #[error("Invalid operand for \"{operator}\": {message}")]
    InvalidOperand {
        operator: &'static str,
        message: String,
    },
}

impl RemapError {
    pub fn operand(operator: &'static str, message: impl Into<String>) -> Self {
        RemapError::InvalidOperand {
            operator,
            message: message.into(),
        }
    }
}

/// Errors raised while building a [`crate::Context`] from configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid context configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid \"now\" timestamp: {0}")]
    Now(#[from] chrono::ParseError),

    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
