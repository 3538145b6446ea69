//! The transport collaborator boundary.

use crate::error::ModelError;
use crate::http::{HttpRequest, HttpResponse};

/// External HTTP collaborator. The core builds `HttpRequest` values and
/// interprets `HttpResponse` values; executing the round-trip is the
/// transport's job, so the core itself never performs I/O.
///
/// Responses are always JSON (the only in-scope wire format). A failure to
/// reach the server at all is reported as `ModelError::Transport` with an
/// opaque diagnostic message; non-2xx responses are returned as data and
/// interpreted by the façade.
pub trait Transport {
    fn request(&self, request: HttpRequest) -> Result<HttpResponse, ModelError>;
}
