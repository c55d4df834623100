//! Transaction sources.
//!
//! A test harness hands the renderer either a live driver context
//! ([`EmbeddedDriverSource`]) or a transaction it already assembled itself
//! ([`PrebuiltTransactionSource`]). The caller picks the variant.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::DocumentError;
use crate::headers::{headers_from_env, normalize_header_keys};
use crate::transaction::{
    Body, DEFAULT_HTTP_VERSION, Headers, Message, Method, Params, RouteParams, Transaction,
};

/// Endpoint declaration inside an example's full description,
/// e.g. `"GET /users/:id returns the user"`.
static DECLARED_ENDPOINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(GET|POST|PATCH|PUT|DELETE) ([^ ]+)").expect("invalid endpoint regex")
});

/// Test example that produced the capture.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExampleMetadata {
    /// The example's own description, e.g. `"returns the user"`.
    pub description: String,
    /// Description including enclosing groups,
    /// e.g. `"GET /users/:id returns the user"`.
    #[serde(default)]
    pub full_description: String,
    /// Test source file, e.g. `./tests/requests/users_test.rs`.
    #[serde(default)]
    pub file_path: PathBuf,
}

impl ExampleMetadata {
    pub fn new(description: &str, full_description: &str, file_path: impl Into<PathBuf>) -> Self {
        Self {
            description: description.to_owned(),
            full_description: full_description.to_owned(),
            file_path: file_path.into(),
        }
    }

    /// Endpoint path declared in the full description, if any.
    #[must_use]
    pub fn declared_path(&self) -> Option<&str> {
        DECLARED_ENDPOINT
            .captures(&self.full_description)
            .and_then(|caps| caps.get(2))
            .map(|m| m.as_str())
    }
}

/// Request as seen by the server driver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawRequest {
    pub method: Option<String>,
    /// Requested path without query string.
    pub path_info: Option<String>,
    /// Percent-encoded query string.
    pub query_string: Option<String>,
    /// CGI-style environment (`CONTENT_TYPE`, `HTTP_ACCEPT`, ...).
    pub env: BTreeMap<String, String>,
    pub body: Body,
    pub http_version: Option<String>,
    pub route: RouteParams,
    pub query_params: Params,
    pub form_params: Params,
}

/// Response as seen by the server driver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawResponse {
    pub status: Option<u16>,
    /// Response headers; keys are normalized to `Header-Case` on extraction.
    pub headers: Headers,
    pub body: Body,
    pub http_version: Option<String>,
}

/// Test-framework context holding the last driven exchange.
pub trait TestContext {
    fn request(&self) -> Option<&RawRequest>;

    fn response(&self) -> Option<&RawResponse>;

    /// Hand-written description overriding the example's own text.
    fn description(&self) -> Option<&str> {
        None
    }
}

/// Plain [`TestContext`] value, as recorded by a harness.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverContext {
    pub request: Option<RawRequest>,
    pub response: Option<RawResponse>,
    pub description: Option<String>,
}

impl TestContext for DriverContext {
    fn request(&self) -> Option<&RawRequest> {
        self.request.as_ref()
    }

    fn response(&self) -> Option<&RawResponse> {
        self.response.as_ref()
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// Produces the transaction a document describes.
pub trait TransactionSource {
    /// Build the transaction for `example`.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::MissingTransactionData` when the request,
    /// response, method or path is unavailable.
    fn transaction(&self, example: &ExampleMetadata) -> Result<Transaction, DocumentError>;

    /// Hand-written description overriding the example's own text.
    fn description(&self) -> Option<&str> {
        None
    }
}

/// Source reading a live driver context.
#[derive(Debug, Clone)]
pub struct EmbeddedDriverSource<C> {
    context: C,
}

impl<C: TestContext> EmbeddedDriverSource<C> {
    pub fn new(context: C) -> Self {
        Self { context }
    }
}

impl<C: TestContext> TransactionSource for EmbeddedDriverSource<C> {
    fn transaction(&self, example: &ExampleMetadata) -> Result<Transaction, DocumentError> {
        let request = self
            .context
            .request()
            .ok_or_else(|| DocumentError::missing("request"))?;
        let response = self
            .context
            .response()
            .ok_or_else(|| DocumentError::missing("response"))?;

        let method: Method = request
            .method
            .as_deref()
            .ok_or_else(|| DocumentError::missing("method"))?
            .parse()
            .map_err(DocumentError::UnsupportedMethod)?;
        let path = example
            .declared_path()
            .or(request.path_info.as_deref())
            .ok_or_else(|| DocumentError::missing("path"))?
            .to_owned();
        let status = response
            .status
            .ok_or_else(|| DocumentError::missing("status"))?;

        let mut request_body = request.body.clone();
        if request_body.content_type.is_none() {
            request_body.content_type = request.env.get("CONTENT_TYPE").cloned();
        }
        let response_headers = normalize_header_keys(&response.headers);
        let mut response_body = response.body.clone();
        if response_body.content_type.is_none() {
            response_body.content_type = response_headers.get("Content-Type").cloned();
        }

        Ok(Transaction {
            method,
            path,
            query_string: request.query_string.clone().filter(|q| !q.is_empty()),
            route: request.route.clone(),
            query_params: request.query_params.clone(),
            form_params: request.form_params.clone(),
            request: Message {
                headers: headers_from_env(&request.env),
                body: request_body,
                http_version: http_version(request.http_version.as_deref()),
            },
            status,
            response: Message {
                headers: response_headers,
                body: response_body,
                http_version: http_version(response.http_version.as_deref()),
            },
        })
    }

    fn description(&self) -> Option<&str> {
        self.context.description()
    }
}

fn http_version(version: Option<&str>) -> String {
    version.unwrap_or(DEFAULT_HTTP_VERSION).to_owned()
}

/// Source wrapping a transaction the harness already assembled.
#[derive(Debug, Clone)]
pub struct PrebuiltTransactionSource {
    transaction: Transaction,
    description: Option<String>,
}

impl PrebuiltTransactionSource {
    #[must_use]
    pub fn new(transaction: Transaction) -> Self {
        Self {
            transaction,
            description: None,
        }
    }

    /// Override the example's description with hand-written text.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl TransactionSource for PrebuiltTransactionSource {
    fn transaction(&self, _example: &ExampleMetadata) -> Result<Transaction, DocumentError> {
        if self.transaction.path.is_empty() {
            return Err(DocumentError::missing("path"));
        }
        Ok(self.transaction.clone())
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}
