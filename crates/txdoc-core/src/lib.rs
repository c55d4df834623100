//! Render recorded HTTP transactions as Markdown API documents.
//!
//! A test run captures one request/response pair per example. This crate
//! turns each capture into a Markdown document describing the endpoint:
//! request line and headers, bodies formatted by content type, and the
//! declared parameter schema as nested bullets.
//!
//! # Architecture
//!
//! - [`TransactionSource`]: yields a normalized [`Transaction`], either from a
//!   live driver context ([`EmbeddedDriverSource`]) or prebuilt
//!   ([`PrebuiltTransactionSource`])
//! - body and header formatting: JSON pretty-printing, XML re-indentation,
//!   labels for binary payloads, suppression and sorting of headers
//! - [`ValidatorRegistry`]: parameter schemas keyed by route or by
//!   controller/action, rendered by [`render_parameters`]
//! - [`DocumentRenderer`]: binds everything into a `minijinja` template
//! - [`DocumentSet`]: groups documents per output file and writes them
//!
//! # Example
//!
//! ```
//! use txdoc_core::{
//!     Body, DocumentRenderer, EmptyRegistry, ExampleMetadata, Method,
//!     PrebuiltTransactionSource, RenderConfig, Transaction,
//! };
//!
//! let transaction = Transaction::new(Method::Get, "/users/1")
//!     .with_response_header("Content-Type", "application/json")
//!     .with_response_body(Body::new(Some("application/json"), r#"{"id":1}"#));
//! let example = ExampleMetadata::new(
//!     "returns the user",
//!     "GET /users/1 returns the user",
//!     "./tests/requests/users_test.rs",
//! );
//!
//! let config = RenderConfig::default();
//! let document = DocumentRenderer::new(&config, &EmptyRegistry)
//!     .render(&PrebuiltTransactionSource::new(transaction), &example)
//!     .unwrap();
//!
//! assert!(document.markdown.starts_with("## GET /users/1\nReturns the user.\n"));
//! ```

mod body;
mod document;
mod error;
mod headers;
mod output;
mod params;
mod path;
mod registry;
mod source;
mod template;
mod transaction;

pub use document::{
    DocumentPathFn, DocumentRenderer, RenderConfig, RenderedDocument, identifier, path_fn,
};
pub use error::{DocumentError, OutputError, RegistryError};
pub use headers::header_case;
pub use output::{DocumentSet, TOC_FILENAME};
pub use params::{ParamType, ParameterNode, Scope, render_parameters};
pub use path::{DEFAULT_PATH_PATTERN, DEFAULT_PATH_REPLACEMENT, PathMapping};
pub use registry::{EmptyRegistry, EndpointKey, KeySpace, StaticRegistry, ValidatorRegistry};
pub use source::{
    DriverContext, EmbeddedDriverSource, ExampleMetadata, PrebuiltTransactionSource, RawRequest,
    RawResponse, TestContext, TransactionSource,
};
pub use template::{DEFAULT_TEMPLATE, TemplateValues, validate_template};
pub use transaction::{
    Body, Headers, Message, Method, ParamValue, Params, RouteParams, Transaction,
};
