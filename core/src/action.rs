//! Declarative action specs for the four canonical CRUD operations.
//!
//! # Design
//! An application author fills in a model's actions with either a URL
//! template string (optionally prefixed with an HTTP verb, like
//! `"POST /tasks.json"`), a structured method + URL pair, or an override
//! function that issues its own request. The three forms are a tagged enum
//! resolved by pattern match, not duck-typed inspection. Specs are compiled
//! at model setup so that bad verb tokens and malformed templates fail
//! there, not per request.

use std::fmt;

use serde_json::Value;

use crate::error::ModelError;
use crate::http::HttpMethod;
use crate::resolver::{Params, UrlTemplate};
use crate::transport::Transport;

/// The four canonical actions a model can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    FindAll,
    FindOne,
    Create,
    Update,
    Destroy,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::FindAll => "find_all",
            Action::FindOne => "find_one",
            Action::Create => "create",
            Action::Update => "update",
            Action::Destroy => "destroy",
        }
    }

    /// Verb used when a template string carries no explicit verb token:
    /// GET for reads, POST for create, PUT for update, DELETE for destroy.
    pub fn default_method(&self) -> HttpMethod {
        match self {
            Action::FindAll | Action::FindOne => HttpMethod::Get,
            Action::Create => HttpMethod::Post,
            Action::Update => HttpMethod::Put,
            Action::Destroy => HttpMethod::Delete,
        }
    }
}

/// An override action body. Receives the invocation's parameters and the
/// transport, issues whatever request it wants, and returns the raw JSON
/// for the façade to wrap. The `Result` stands in for the success/error
/// callback pair of a callback-driven design.
pub type OverrideFn = Box<dyn Fn(Params, &dyn Transport) -> Result<Value, ModelError> + Send + Sync>;

/// Declarative description of how to perform one CRUD action.
pub enum ActionSpec {
    /// A URL template, optionally prefixed with a verb: `"PUT /tasks/{id}"`.
    Template(String),
    /// An explicit method and URL template.
    Structured { method: HttpMethod, url: String },
    /// Full delegation: the function owns request and response handling.
    Override(OverrideFn),
}

impl From<&str> for ActionSpec {
    fn from(template: &str) -> Self {
        ActionSpec::Template(template.to_string())
    }
}

impl From<String> for ActionSpec {
    fn from(template: String) -> Self {
        ActionSpec::Template(template)
    }
}

impl fmt::Debug for ActionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionSpec::Template(t) => f.debug_tuple("Template").field(t).finish(),
            ActionSpec::Structured { method, url } => f
                .debug_struct("Structured")
                .field("method", method)
                .field("url", url)
                .finish(),
            ActionSpec::Override(_) => f.write_str("Override(..)"),
        }
    }
}

/// A spec validated and parsed at model setup.
pub(crate) enum CompiledAction {
    Route {
        method: HttpMethod,
        template: UrlTemplate,
    },
    Override(OverrideFn),
}

impl fmt::Debug for CompiledAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompiledAction::Route { method, template } => f
                .debug_struct("Route")
                .field("method", method)
                .field("template", template)
                .finish(),
            CompiledAction::Override(_) => f.write_str("Override(..)"),
        }
    }
}

impl CompiledAction {
    pub(crate) fn compile(action: Action, spec: ActionSpec) -> Result<Self, ModelError> {
        match spec {
            ActionSpec::Override(run) => Ok(CompiledAction::Override(run)),
            ActionSpec::Structured { method, url } => Ok(CompiledAction::Route {
                method,
                template: UrlTemplate::parse(&url)?,
            }),
            ActionSpec::Template(raw) => {
                let (method, url) = split_verb(&raw, action)?;
                Ok(CompiledAction::Route {
                    method,
                    template: UrlTemplate::parse(url)?,
                })
            }
        }
    }
}

/// Split an optional leading verb token from a template string.
///
/// `"POST /tasks.json"` yields POST; a bare `"/tasks.json"` falls back to
/// the action's default verb. A leading token that is not one of the four
/// HTTP verbs is rejected rather than passed through into the URL.
fn split_verb<'a>(raw: &'a str, action: Action) -> Result<(HttpMethod, &'a str), ModelError> {
    let trimmed = raw.trim();
    match trimmed.split_once(char::is_whitespace) {
        Some((token, rest)) => match HttpMethod::parse_token(token) {
            Some(method) => Ok((method, rest.trim_start())),
            None => Err(ModelError::Configuration(format!(
                "unknown HTTP verb `{token}` in {} action spec",
                action.name()
            ))),
        },
        None => Ok((action.default_method(), trimmed)),
    }
}
