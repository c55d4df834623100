//! Captured HTTP exchange model.
//!
//! A [`Transaction`] is the normalized form of one request/response pair. It
//! is produced by a [`TransactionSource`](crate::TransactionSource) and read
//! by exactly one render pass.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

/// Header mapping with `Header-Case` keys.
pub type Headers = BTreeMap<String, String>;

/// Decoded request parameters (query string or form body).
pub type Params = BTreeMap<String, ParamValue>;

/// Default protocol version when the capture does not carry one.
pub(crate) const DEFAULT_HTTP_VERSION: &str = "HTTP/1.1";

/// Documented HTTP methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// Upper-case verb as it appears on the request line.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            _ => Err(s.to_owned()),
        }
    }
}

/// Raw payload plus its declared content type.
///
/// In capture files the payload is given either as `text` or as `base64`
/// for binary content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BodyRaw", into = "BodyRaw")]
pub struct Body {
    /// Declared content type, if any.
    pub content_type: Option<String>,
    /// Payload bytes.
    pub bytes: Vec<u8>,
}

impl Body {
    /// Create a body from bytes and an optional content type.
    pub fn new(content_type: Option<&str>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            content_type: content_type.map(str::to_owned),
            bytes: bytes.into(),
        }
    }

    /// Whether the payload is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Content type, or an empty string when undeclared.
    #[must_use]
    pub fn content_type(&self) -> &str {
        self.content_type.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct BodyRaw {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    base64: Option<String>,
}

impl TryFrom<BodyRaw> for Body {
    type Error = base64::DecodeError;

    fn try_from(raw: BodyRaw) -> Result<Self, Self::Error> {
        let bytes = match (raw.text, raw.base64) {
            (Some(text), _) => text.into_bytes(),
            (None, Some(encoded)) => STANDARD.decode(encoded)?,
            (None, None) => Vec::new(),
        };
        Ok(Self {
            content_type: raw.content_type,
            bytes,
        })
    }
}

impl From<Body> for BodyRaw {
    fn from(body: Body) -> Self {
        let (text, base64) = match String::from_utf8(body.bytes) {
            Ok(text) => (Some(text), None),
            Err(err) => (None, Some(STANDARD.encode(err.into_bytes()))),
        };
        Self {
            content_type: body.content_type,
            text,
            base64,
        }
    }
}

/// One decoded request parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// `key=value`
    Scalar(String),
    /// `key[]=a&key[]=b`
    List(Vec<String>),
    /// `key[a]=1&key[b]=2`
    Map(BTreeMap<String, String>),
}

/// Routing information used to address the validator registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteParams {
    /// Handling controller, when the application routes by controller.
    #[serde(default)]
    pub controller: Option<String>,
    /// Handling action within the controller.
    #[serde(default)]
    pub action: Option<String>,
}

/// Headers, body and protocol version of one side of the exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Headers with `Header-Case` keys.
    #[serde(default)]
    pub headers: Headers,
    /// Payload.
    #[serde(default)]
    pub body: Body,
    /// Protocol version, e.g. `HTTP/1.1`.
    #[serde(default = "default_http_version")]
    pub http_version: String,
}

impl Default for Message {
    fn default() -> Self {
        Self {
            headers: Headers::new(),
            body: Body::default(),
            http_version: default_http_version(),
        }
    }
}

fn default_http_version() -> String {
    DEFAULT_HTTP_VERSION.to_owned()
}

/// One captured request/response pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Request method.
    pub method: Method,
    /// Endpoint path without query string.
    pub path: String,
    /// Raw (percent-encoded) query string.
    #[serde(default)]
    pub query_string: Option<String>,
    /// Controller/action pair, if known.
    #[serde(default)]
    pub route: RouteParams,
    /// Decoded query parameters.
    #[serde(default)]
    pub query_params: Params,
    /// Decoded form parameters.
    #[serde(default)]
    pub form_params: Params,
    /// Request side.
    #[serde(default)]
    pub request: Message,
    /// Response status code.
    pub status: u16,
    /// Response side.
    #[serde(default)]
    pub response: Message,
}

impl Transaction {
    /// Create a transaction with an empty request and a `200` response.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query_string: None,
            route: RouteParams::default(),
            query_params: Params::new(),
            form_params: Params::new(),
            request: Message::default(),
            status: 200,
            response: Message::default(),
        }
    }

    #[must_use]
    pub fn with_query_string(mut self, query: impl Into<String>) -> Self {
        self.query_string = Some(query.into());
        self
    }

    #[must_use]
    pub fn with_route(mut self, controller: &str, action: &str) -> Self {
        self.route = RouteParams {
            controller: Some(controller.to_owned()),
            action: Some(action.to_owned()),
        };
        self
    }

    #[must_use]
    pub fn with_request_header(mut self, key: &str, value: &str) -> Self {
        self.request.headers.insert(key.to_owned(), value.to_owned());
        self
    }

    #[must_use]
    pub fn with_request_body(mut self, body: Body) -> Self {
        self.request.body = body;
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn with_response_header(mut self, key: &str, value: &str) -> Self {
        self.response.headers.insert(key.to_owned(), value.to_owned());
        self
    }

    #[must_use]
    pub fn with_response_body(mut self, body: Body) -> Self {
        self.response.body = body;
        self
    }
}
