//! Declarative REST model layer: typed CRUD clients over plain HTTP.
//!
//! # Overview
//! A `ModelType` maps the four canonical CRUD actions to a server's REST
//! endpoints through declarative action specs — URL templates like
//! `"POST /tasks.json"` or `"/tasks/{id}.json"`, structured method + URL
//! pairs, or override functions. Invoking an operation resolves the spec
//! and the invocation's parameters into an `HttpRequest`, hands it to a
//! caller-supplied transport, and wraps the JSON response into typed
//! `Instance` / `Collection` values.
//!
//! # Design
//! - The core never performs I/O: requests and responses are plain data
//!   crossing the `Transport` trait (host-does-IO pattern), so everything
//!   is deterministic and testable with canned responses.
//! - Action specs are compiled and validated when the model is built;
//!   configuration mistakes fail at setup, not per request.
//! - The resolver is a pure function from (spec, params) to a request
//!   descriptor: placeholders consume their fields, leftovers become a
//!   query string or JSON body depending on the verb.
//! - Models are plain values passed explicitly to consumers; there is no
//!   global registry.

pub mod action;
pub mod error;
pub mod http;
pub mod model;
pub mod resolver;
pub mod transport;
pub mod wrap;

pub use action::{Action, ActionSpec, OverrideFn};
pub use error::ModelError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use model::{ModelBuilder, ModelType};
pub use resolver::{resolve, Params, RequestDescriptor, UrlTemplate};
pub use transport::Transport;
pub use wrap::{wrap_many, wrap_one, Collection, Instance};
