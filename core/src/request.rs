//! Declarative description of a single API call.
//!
//! A `RequestSpec` is what a service method produces: verb, URL template,
//! path and query parameters, body and whether the bearer token applies.
//! [`ApiClient::build_request`](crate::client::ApiClient::build_request)
//! turns it into an [`HttpRequest`](crate::http::HttpRequest).

use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::http::HttpMethod;

pub const JSON_MEDIA_TYPE: &str = "application/json";
pub const FORM_MEDIA_TYPE: &str = "application/x-www-form-urlencoded";

/// Request payload, tagged by media type.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    None,
    Json(Value),
    Form(Vec<(String, String)>),
}

impl RequestBody {
    pub fn media_type(&self) -> Option<&'static str> {
        match self {
            RequestBody::None => None,
            RequestBody::Json(_) => Some(JSON_MEDIA_TYPE),
            RequestBody::Form(_) => Some(FORM_MEDIA_TYPE),
        }
    }

    pub fn encode(&self) -> Result<Option<String>, ApiError> {
        match self {
            RequestBody::None => Ok(None),
            RequestBody::Json(value) => serde_json::to_string(value)
                .map(Some)
                .map_err(|e| ApiError::Serialization(e.to_string())),
            RequestBody::Form(pairs) => Ok(Some(encode_pairs(
                pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())),
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    pub method: HttpMethod,
    /// Path relative to the base URL, with `{name}` placeholders.
    pub url: &'static str,
    pub path: Vec<(&'static str, String)>,
    pub query: Vec<(&'static str, Option<String>)>,
    pub body: RequestBody,
    /// Attach the bearer token. Only the login grant turns this off.
    pub authenticated: bool,
    /// Documented error statuses, for diagnostics only.
    pub errors: &'static [(u16, &'static str)],
}

impl RequestSpec {
    pub fn new(method: HttpMethod, url: &'static str) -> Self {
        Self {
            method,
            url,
            path: Vec::new(),
            query: Vec::new(),
            body: RequestBody::None,
            authenticated: true,
            errors: &[],
        }
    }

    pub fn path_param(mut self, name: &'static str, value: impl ToString) -> Self {
        self.path.push((name, value.to_string()));
        self
    }

    pub fn query_param<V: ToString>(mut self, name: &'static str, value: Option<V>) -> Self {
        self.query.push((name, value.map(|v| v.to_string())));
        self
    }

    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body).map_err(|e| ApiError::Serialization(e.to_string()))?;
        self.body = RequestBody::Json(value);
        Ok(self)
    }

    pub fn form(mut self, pairs: Vec<(String, String)>) -> Self {
        self.body = RequestBody::Form(pairs);
        self
    }

    pub fn unauthenticated(mut self) -> Self {
        self.authenticated = false;
        self
    }

    pub fn errors(mut self, errors: &'static [(u16, &'static str)]) -> Self {
        self.errors = errors;
        self
    }

    /// Description of `status` if it is a documented error for this call.
    pub fn documented_error(&self, status: u16) -> Option<&'static str> {
        self.errors
            .iter()
            .find(|(code, _)| *code == status)
            .map(|(_, description)| *description)
    }

    /// Expand the URL template and append the query string.
    pub fn resolve_url(&self, base_url: &str) -> Result<String, ApiError> {
        let mut url = format!("{base_url}{}", expand_template(self.url, &self.path)?);
        let query = encode_pairs(
            self.query
                .iter()
                .filter_map(|(k, v)| v.as_deref().map(|v| (*k, v))),
        );
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query);
        }
        Ok(url)
    }
}

/// Replace each `{name}` in `template` with the percent-encoded value bound to
/// `name`.
fn expand_template(template: &str, params: &[(&'static str, String)]) -> Result<String, ApiError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let close = after.find('}').ok_or_else(|| {
            ApiError::Serialization(format!("unterminated placeholder in `{template}`"))
        })?;
        let name = &after[..close];
        let value = params
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value)
            .ok_or_else(|| ApiError::Serialization(format!("missing path parameter `{name}`")))?;
        out.push_str(&urlencoding::encode(value));
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

fn encode_pairs<'a>(pairs: impl Iterator<Item = (&'a str, &'a str)>) -> String {
    pairs
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}
