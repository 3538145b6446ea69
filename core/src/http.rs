//! HTTP descriptor types for the host-does-IO pattern.
//!
//! # Design
//! These types describe HTTP requests and responses as plain data. The core
//! crate builds `HttpRequest` values and interprets `HttpResponse` values
//! without ever touching the network — the transport collaborator executes
//! the actual round-trip. This keeps the core deterministic and easy to test.
//!
//! All fields use owned types (`String`, `Vec`) so values can be handed to
//! any transport without lifetime concerns.

use serde_json::{Map, Value};

use crate::resolver::RequestDescriptor;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    /// Parse a verb token from an action spec, case-insensitively.
    ///
    /// Only the four supported verbs are recognized. Anything else
    /// (including made-up verbs like `DESTROY`) returns `None` so that
    /// model setup can reject it instead of passing it to a server.
    pub fn parse_token(token: &str) -> Option<Self> {
        match token.to_ascii_uppercase().as_str() {
            "GET" => Some(HttpMethod::Get),
            "POST" => Some(HttpMethod::Post),
            "PUT" => Some(HttpMethod::Put),
            "DELETE" => Some(HttpMethod::Delete),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// GET and DELETE carry leftover parameters in the query string;
    /// POST and PUT carry them in the request body.
    pub fn sends_body(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put)
    }
}

/// An HTTP request described as plain data.
///
/// Built from a resolved `RequestDescriptor`. The transport collaborator is
/// responsible for executing this request against the network and returning
/// the corresponding `HttpResponse`.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// Serialize a resolved descriptor into a concrete request.
    ///
    /// Leftover parameters (those not consumed by placeholder substitution)
    /// become a query string for GET/DELETE and a JSON body for POST/PUT.
    pub fn from_descriptor(descriptor: RequestDescriptor) -> Self {
        let RequestDescriptor {
            method,
            url,
            params,
        } = descriptor;

        if method.sends_body() {
            let (headers, body) = if params.is_empty() {
                (Vec::new(), None)
            } else {
                (
                    vec![("content-type".to_string(), "application/json".to_string())],
                    Some(Value::Object(params).to_string()),
                )
            };
            HttpRequest {
                method,
                url,
                headers,
                body,
            }
        } else {
            let url = if params.is_empty() {
                url
            } else {
                format!("{url}?{}", query_string(&params))
            };
            HttpRequest {
                method,
                url,
                headers: Vec::new(),
                body: None,
            }
        }
    }
}

/// An HTTP response described as plain data.
///
/// Constructed by the transport after executing an `HttpRequest`, then
/// interpreted by the CRUD façade.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Encode leftover parameters as `key=value&key=value`.
fn query_string(params: &Map<String, Value>) -> String {
    let mut parts = Vec::with_capacity(params.len());
    for (key, value) in params {
        parts.push(format!(
            "{}={}",
            percent_encode(key),
            percent_encode(&query_value(value))
        ));
    }
    parts.join("&")
}

/// Stringify a JSON value for a query string. Scalars render bare (strings
/// without quotes); objects and arrays fall back to compact JSON text.
fn query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Percent-encode the bytes that would corrupt a URL. Used for query keys
/// and values, and for string placeholder substitutions in path segments.
pub(crate) fn percent_encode(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
