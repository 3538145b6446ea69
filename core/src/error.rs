//! Error types for the model layer.
//!
//! # Design
//! Configuration problems (bad verb token, malformed template, missing or
//! duplicate action spec) surface when a `ModelType` is built, not on each
//! request. Everything that can go wrong per request — an unresolvable
//! placeholder, a response of the wrong JSON shape, a transport failure —
//! gets its own variant so callers can match on the failure class.

use std::fmt;

use serde_json::Value;

/// Errors returned by model setup, resolution, and CRUD operations.
#[derive(Debug)]
pub enum ModelError {
    /// The action spec is missing, duplicated, carries an unknown HTTP verb
    /// token, or its URL template is malformed. Raised at setup time.
    Configuration(String),

    /// A `{placeholder}` in the URL template references a field that is
    /// absent from the invocation's parameters, or whose value is not a
    /// scalar. No silent fallback: resolution fails for the whole request.
    Template { placeholder: String },

    /// The response JSON had the wrong shape for the operation — an object
    /// where an array was required, or vice versa.
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// An operation was attempted through an instance that has already been
    /// destroyed on the server.
    Destroyed,

    /// The server answered with a non-2xx status. Carries the raw status
    /// code and body for diagnostics.
    Http { status: u16, body: String },

    /// The transport collaborator failed, or the response body was not
    /// valid JSON. Opaque diagnostic text, propagated unchanged.
    Transport(String),
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::Configuration(msg) => write!(f, "configuration error: {msg}"),
            ModelError::Template { placeholder } => {
                write!(f, "no parameter for placeholder `{{{placeholder}}}`")
            }
            ModelError::TypeMismatch { expected, found } => {
                write!(f, "expected {expected}, found {found}")
            }
            ModelError::Destroyed => write!(f, "instance has been destroyed"),
            ModelError::Http { status, body } => write!(f, "HTTP {status}: {body}"),
            ModelError::Transport(msg) => write!(f, "transport error: {msg}"),
        }
    }
}

impl std::error::Error for ModelError {}

/// Name of a JSON value's type, for `TypeMismatch` diagnostics.
pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
