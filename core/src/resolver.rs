//! URL template parsing and request resolution.
//!
//! # Design
//! A template like `/tasks/{id}.json` is parsed once, at model setup, into
//! literal and placeholder segments; syntax errors surface there as
//! configuration errors. Per-request resolution is then a pure mapping from
//! (method, template, params) to a `RequestDescriptor`: placeholders are
//! substituted from the parameter object and the consumed fields are removed
//! so they are not duplicated in a query string or request body.

use serde_json::{Map, Value};

use crate::error::ModelError;
use crate::http::HttpMethod;

/// Invocation parameters: an id, a filter, or an instance's attributes.
pub type Params = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A parsed URL template: literal text interleaved with `{field}`
/// placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate {
    segments: Vec<Segment>,
}

impl UrlTemplate {
    /// Parse a template string. Fails with `Configuration` on an empty
    /// placeholder, an unclosed `{`, or a stray `}` — a malformed template
    /// must never leak literal braces into a final URL.
    pub fn parse(raw: &str) -> Result<Self, ModelError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = raw.chars();

        while let Some(c) = chars.next() {
            match c {
                '{' => {
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(inner) => name.push(inner),
                            None => {
                                return Err(ModelError::Configuration(format!(
                                    "unclosed placeholder in template `{raw}`"
                                )))
                            }
                        }
                    }
                    if name.is_empty() {
                        return Err(ModelError::Configuration(format!(
                            "empty placeholder in template `{raw}`"
                        )));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder(name));
                }
                '}' => {
                    return Err(ModelError::Configuration(format!(
                        "stray `}}` in template `{raw}`"
                    )))
                }
                c => literal.push(c),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Ok(UrlTemplate { segments })
    }

    /// Names of the placeholders, in order of appearance.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Placeholder(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }
}

/// The resolver's output: a concrete method and URL, plus the parameters
/// left over after placeholder substitution.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub method: HttpMethod,
    pub url: String,
    pub params: Params,
}

/// Substitute placeholders from `params` to produce a request descriptor.
///
/// Each `{field}` consumes `params.field`; consumed fields are removed from
/// the outgoing set. A placeholder with no matching field, or with a
/// non-scalar value, fails with `Template` — never a URL with braces in it.
pub fn resolve(
    method: HttpMethod,
    template: &UrlTemplate,
    mut params: Params,
) -> Result<RequestDescriptor, ModelError> {
    let mut url = String::new();
    let mut consumed = Vec::new();
    for segment in &template.segments {
        match segment {
            Segment::Literal(text) => url.push_str(text),
            Segment::Placeholder(name) => {
                // Look up by reference so a placeholder repeated in the
                // template still resolves on its second occurrence.
                let value = params.get(name).ok_or_else(|| ModelError::Template {
                    placeholder: name.clone(),
                })?;
                url.push_str(&scalar_text(name, value)?);
                consumed.push(name.as_str());
            }
        }
    }
    for name in consumed {
        params.remove(name);
    }
    Ok(RequestDescriptor {
        method,
        url,
        params,
    })
}

/// Stringify a placeholder value. Strings render without quotes and are
/// percent-encoded so a value containing `/`, `?`, or a space cannot smuggle
/// extra URL structure into the path; numbers and booleans render via their
/// display form. Null, arrays, and objects cannot stand in a URL path.
fn scalar_text(name: &str, value: &Value) -> Result<String, ModelError> {
    match value {
        Value::String(s) => Ok(crate::http::percent_encode(s)),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => Err(ModelError::Template {
            placeholder: name.to_string(),
        }),
    }
}
