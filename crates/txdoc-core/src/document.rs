//! Document façade: one transaction in, one Markdown document out.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use percent_encoding::percent_decode_str;

use crate::body::{body_section, format_request_body, format_response_body};
use crate::error::DocumentError;
use crate::headers::render_header_block;
use crate::params::{params_to_query, render_parameters};
use crate::path::PathMapping;
use crate::registry::{KeySpace, ValidatorRegistry};
use crate::source::{ExampleMetadata, TransactionSource};
use crate::template::{self, DEFAULT_TEMPLATE, TemplateValues};
use crate::transaction::{Params, Transaction};

/// Maps an example to its document path, relative to the output root.
pub type DocumentPathFn = Box<dyn Fn(&ExampleMetadata) -> PathBuf + Send + Sync>;

/// Rendering options.
pub struct RenderConfig {
    /// `minijinja` template source.
    pub template: String,
    /// Request header keys (`Header-Case`) never shown.
    pub suppressed_request_headers: BTreeSet<String>,
    /// Response header keys (`Header-Case`) never shown.
    pub suppressed_response_headers: BTreeSet<String>,
    /// Example → document path mapping.
    pub document_path: DocumentPathFn,
    /// Directory documents are written under.
    pub output_root: PathBuf,
    /// Key space of the validator registry.
    pub key_space: KeySpace,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_owned(),
            suppressed_request_headers: BTreeSet::new(),
            suppressed_response_headers: BTreeSet::new(),
            document_path: path_fn(PathMapping::default()),
            output_root: PathBuf::from("doc"),
            key_space: KeySpace::default(),
        }
    }
}

impl fmt::Debug for RenderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderConfig")
            .field("template", &self.template)
            .field("suppressed_request_headers", &self.suppressed_request_headers)
            .field("suppressed_response_headers", &self.suppressed_response_headers)
            .field("output_root", &self.output_root)
            .field("key_space", &self.key_space)
            .finish_non_exhaustive()
    }
}

/// Wrap a [`PathMapping`] as a [`DocumentPathFn`].
#[must_use]
pub fn path_fn(mapping: PathMapping) -> DocumentPathFn {
    Box::new(move |example: &ExampleMetadata| mapping.map(&example.file_path))
}

/// A rendered document and where it belongs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    /// Path relative to the output root.
    pub path: PathBuf,
    /// `"{METHOD} {path}"`.
    pub title: String,
    /// Anchor-safe form of the title.
    pub identifier: String,
    /// Markdown text.
    pub markdown: String,
}

/// Renders transactions using a configuration and a validator registry.
pub struct DocumentRenderer<'a> {
    config: &'a RenderConfig,
    registry: &'a dyn ValidatorRegistry,
}

impl<'a> DocumentRenderer<'a> {
    pub fn new(config: &'a RenderConfig, registry: &'a dyn ValidatorRegistry) -> Self {
        Self { config, registry }
    }

    /// Render one document.
    ///
    /// # Errors
    ///
    /// Returns an error if the source lacks a request, response, method or
    /// path, or if the template fails to render.
    pub fn render(
        &self,
        source: &dyn TransactionSource,
        example: &ExampleMetadata,
    ) -> Result<RenderedDocument, DocumentError> {
        let transaction = source.transaction(example)?;
        let values = self.bind(&transaction, example, source.description());
        let markdown = template::render(&self.config.template, &values)?;

        Ok(RenderedDocument {
            path: (self.config.document_path)(example),
            title: values.title,
            identifier: values.identifier,
            markdown,
        })
    }

    /// Compute every template value for one transaction.
    fn bind(
        &self,
        transaction: &Transaction,
        example: &ExampleMetadata,
        description: Option<&str>,
    ) -> TemplateValues {
        let title = format!("{} {}", transaction.method, transaction.path);
        let identifier = identifier(&title);

        let request_body = format_request_body(&transaction.request.body);
        let response_body = format_response_body(&transaction.response.body);
        let parameters = self.parameters(transaction);

        TemplateValues {
            description: describe(description, example),
            method: transaction.method.to_string(),
            path: transaction.path.clone(),
            request_query: request_query(transaction.query_string.as_deref()),
            request_http_version: transaction.request.http_version.clone(),
            request_header: render_header_block(
                &transaction.request.headers,
                &self.config.suppressed_request_headers,
            ),
            request_body_section: body_section(request_body.as_deref()),
            request_body: request_body.unwrap_or_default(),
            response_status: transaction.status,
            response_http_version: transaction.response.http_version.clone(),
            response_header: render_header_block(
                &transaction.response.headers,
                &self.config.suppressed_response_headers,
            ),
            response_body_section: body_section(response_body.as_deref()),
            response_body: response_body.unwrap_or_default(),
            parameters_section: titled_section("Parameters", &parameters),
            parameters,
            example_get_section: example_section("example GET", &transaction.query_params),
            example_post_section: example_section("example POST", &transaction.form_params),
            title,
            identifier,
        }
    }

    fn parameters(&self, transaction: &Transaction) -> String {
        let Some(key) = self.config.key_space.key_for(transaction) else {
            tracing::debug!("Transaction carries no registry key, skipping parameters");
            return String::new();
        };
        match self.registry.lookup(&key) {
            Some(root) => render_parameters(root),
            None => {
                tracing::debug!(%key, "No parameter schema registered");
                String::new()
            }
        }
    }
}

/// Anchor/file-safe identifier: spaces become `-`, `:` and `/` are dropped,
/// everything lower-cased.
///
/// ```
/// use txdoc_core::identifier;
///
/// assert_eq!(identifier("GET /users/:id"), "get-usersid");
/// ```
pub fn identifier(title: &str) -> String {
    title
        .replace(' ', "-")
        .replace([':', '/'], "")
        .to_lowercase()
}

fn describe(custom: Option<&str>, example: &ExampleMetadata) -> String {
    match custom {
        Some(text) => dedent(text),
        None => format!("{}.", capitalize(&example.description)),
    }
}

/// Upper-case the first character and lower-case the rest.
fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Remove the indentation shared by all non-blank lines.
fn dedent(text: &str) -> String {
    let indent = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start_matches([' ', '\t']).len())
        .min()
        .unwrap_or(0);

    text.split_inclusive('\n')
        .map(|line| {
            let strip = line
                .bytes()
                .take(indent)
                .take_while(|b| *b == b' ' || *b == b'\t')
                .count();
            &line[strip..]
        })
        .collect()
}

fn request_query(query: Option<&str>) -> String {
    match query {
        Some(query) if !query.is_empty() => {
            format!("?{}", percent_decode_str(query).decode_utf8_lossy())
        }
        _ => String::new(),
    }
}

fn titled_section(heading: &str, content: &str) -> String {
    if content.is_empty() {
        String::new()
    } else {
        format!("\n### {heading}\n{content}\n")
    }
}

fn example_section(heading: &str, params: &Params) -> String {
    titled_section(heading, &params_to_query(params))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{ParamType, ParameterNode};
    use crate::registry::{EmptyRegistry, EndpointKey, StaticRegistry};
    use crate::source::{
        DriverContext, EmbeddedDriverSource, PrebuiltTransactionSource, RawRequest, RawResponse,
    };
    use crate::transaction::{Body, Method, ParamValue};
    use pretty_assertions::assert_eq;

    fn example() -> ExampleMetadata {
        ExampleMetadata::new(
            "returns the user",
            "GET /users/1 returns the user",
            "./tests/requests/users_test.rs",
        )
    }

    fn get_user() -> Transaction {
        Transaction::new(Method::Get, "/users/1")
            .with_request_header("Accept", "application/json")
            .with_response_header("Content-Type", "application/json")
            .with_response_body(Body::new(
                Some("application/json"),
                r#"{"id":1,"name":"Al"}"#,
            ))
    }

    fn render(config: &RenderConfig, registry: &dyn ValidatorRegistry, t: Transaction) -> String {
        DocumentRenderer::new(config, registry)
            .render(&PrebuiltTransactionSource::new(t), &example())
            .unwrap()
            .markdown
    }

    #[test]
    fn test_render_full_document() {
        let config = RenderConfig::default();
        let markdown = render(&config, &EmptyRegistry, get_user());

        assert_eq!(
            markdown,
            "## GET /users/1\n\
             Returns the user.\n\
             \n\
             ### Request\n\
             ```plain\n\
             GET /users/1 HTTP/1.1\n\
             Accept: application/json\n\
             ```\n\
             \n\
             ### Response\n\
             ```plain\n\
             HTTP/1.1 200\n\
             Content-Type: application/json\n\
             \n\
             {\n  \"id\": 1,\n  \"name\": \"Al\"\n}\n\
             ```\n"
        );
    }

    #[test]
    fn test_json_response_keys_on_own_lines() {
        let markdown = render(&RenderConfig::default(), &EmptyRegistry, get_user());
        assert!(markdown.contains("## GET /users/1"));
        assert!(markdown.contains("\n  \"id\": 1,\n"));
        assert!(markdown.contains("\n  \"name\": \"Al\"\n"));
    }

    #[test]
    fn test_multipart_request_renders_label() {
        let transaction = Transaction::new(Method::Post, "/uploads").with_request_body(Body::new(
            Some("multipart/form-data; boundary=xyz"),
            b"--xyz\r\n\x00\x01\x02binary\r\n--xyz--".to_vec(),
        ));
        let markdown = render(&RenderConfig::default(), &EmptyRegistry, transaction);

        assert!(markdown.contains("\n\nmultipart/form-data\n```"));
        assert!(!markdown.contains("binary"));
    }

    #[test]
    fn test_image_response_renders_content_type() {
        let transaction = Transaction::new(Method::Get, "/avatar.png")
            .with_response_header("Content-Type", "image/png")
            .with_response_body(Body::new(Some("image/png"), vec![0x89, 0x50, 0x4e, 0x47, 0x00]));
        let markdown = render(&RenderConfig::default(), &EmptyRegistry, transaction);

        assert!(markdown.ends_with("Content-Type: image/png\n\nimage/png\n```\n"));
    }

    #[test]
    fn test_parameters_section_from_registry() {
        let registry = StaticRegistry::new()
            .with_entry(
                EndpointKey::Route {
                    method: Method::Get,
                    path: "/users/1".to_owned(),
                },
                ParameterNode::root(vec![
                    ParameterNode::named("name", ParamType::String).required(),
                    ParameterNode::named("age", ParamType::Integer).with_only(&["admin"]),
                ]),
            )
            .unwrap();
        let markdown = render(&RenderConfig::default(), &registry, get_user());

        assert!(markdown.contains(
            "\n### Parameters\n* `name` string (required)\n* `age` integer (only: `[:admin]`)\n"
        ));
    }

    #[test]
    fn test_no_registry_entry_omits_parameters() {
        let markdown = render(&RenderConfig::default(), &StaticRegistry::new(), get_user());
        assert!(!markdown.contains("Parameters"));
    }

    #[test]
    fn test_action_key_space() {
        let registry = StaticRegistry::new()
            .with_entry(
                EndpointKey::Action {
                    controller: "users".to_owned(),
                    action: "show".to_owned(),
                },
                ParameterNode::root(vec![ParameterNode::named("id", ParamType::Integer).required()]),
            )
            .unwrap();
        let config = RenderConfig {
            key_space: KeySpace::Action,
            ..RenderConfig::default()
        };

        let with_route = render(&config, &registry, get_user().with_route("users", "show"));
        let without_route = render(&config, &registry, get_user());

        assert!(with_route.contains("* `id` integer (required)"));
        assert!(!without_route.contains("### Parameters"));
    }

    #[test]
    fn test_suppressed_headers_never_rendered() {
        let transaction = get_user()
            .with_request_header("Authorization", "Bearer secret")
            .with_response_header("Set-Cookie", "session=abc");
        let config = RenderConfig {
            suppressed_request_headers: ["Authorization".to_owned()].into(),
            suppressed_response_headers: ["Set-Cookie".to_owned()].into(),
            ..RenderConfig::default()
        };
        let markdown = render(&config, &EmptyRegistry, transaction);

        assert!(!markdown.contains("Authorization"));
        assert!(!markdown.contains("secret"));
        assert!(!markdown.contains("Set-Cookie"));
    }

    #[test]
    fn test_query_and_example_sections() {
        let mut transaction = get_user().with_query_string("q=caf%C3%A9&page=2");
        transaction
            .query_params
            .insert("q".to_owned(), ParamValue::Scalar("café".to_owned()));
        transaction
            .form_params
            .insert("tags".to_owned(), ParamValue::List(vec!["a".to_owned()]));
        let markdown = render(&RenderConfig::default(), &EmptyRegistry, transaction);

        assert!(markdown.contains("GET /users/1?q=café&page=2 HTTP/1.1"));
        assert!(markdown.contains("\n### example GET\nq=café\n"));
        assert!(markdown.contains("\n### example POST\ntags[]=a\n"));
    }

    #[test]
    fn test_render_is_idempotent() {
        let config = RenderConfig::default();
        let registry = StaticRegistry::new()
            .with_entry(
                EndpointKey::Route {
                    method: Method::Get,
                    path: "/users/1".to_owned(),
                },
                ParameterNode::root(vec![
                    ParameterNode::named("filter", ParamType::Hash).with_children(vec![
                        ParameterNode::named("name", ParamType::String),
                    ]),
                ]),
            )
            .unwrap();
        let transaction = get_user()
            .with_request_header("X-B", "2")
            .with_request_header("X-A", "1");

        let first = render(&config, &registry, transaction.clone());
        let second = render(&config, &registry, transaction);
        assert_eq!(first, second);
    }

    #[test]
    fn test_custom_template_and_description() {
        let config = RenderConfig {
            template: "{{ identifier }}|{{ description }}".to_owned(),
            ..RenderConfig::default()
        };
        let source = PrebuiltTransactionSource::new(get_user())
            .with_description("    Fetches a user.\n      Indented detail.\n");
        let rendered = DocumentRenderer::new(&config, &EmptyRegistry)
            .render(&source, &example())
            .unwrap();

        assert_eq!(
            rendered.markdown,
            "get-users1|Fetches a user.\n  Indented detail.\n"
        );
        assert_eq!(rendered.path, PathBuf::from("users.md"));
        assert_eq!(rendered.title, "GET /users/1");
    }

    #[test]
    fn test_template_error_is_reported() {
        let config = RenderConfig {
            template: "{{ unknown_value }}".to_owned(),
            ..RenderConfig::default()
        };
        let result = DocumentRenderer::new(&config, &EmptyRegistry)
            .render(&PrebuiltTransactionSource::new(get_user()), &example());
        assert!(matches!(result, Err(DocumentError::Template(_))));
    }

    #[test]
    fn test_missing_response_aborts_document() {
        let source = EmbeddedDriverSource::new(DriverContext {
            request: Some(RawRequest {
                method: Some("GET".to_owned()),
                ..RawRequest::default()
            }),
            response: None,
            description: None,
        });
        let config = RenderConfig::default();
        let result = DocumentRenderer::new(&config, &EmptyRegistry).render(&source, &example());
        assert!(matches!(
            result,
            Err(DocumentError::MissingTransactionData { field: "response" })
        ));
    }

    #[test]
    fn test_embedded_source_end_to_end() {
        let env = [
            ("CONTENT_TYPE", "application/json"),
            ("HTTP_AUTHORIZATION", "token"),
            ("HTTP_ACCEPT", "*/*"),
        ]
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect();
        let source = EmbeddedDriverSource::new(DriverContext {
            request: Some(RawRequest {
                method: Some("POST".to_owned()),
                path_info: Some("/users".to_owned()),
                env,
                body: Body::new(None, r#"{"name":"Al"}"#),
                ..RawRequest::default()
            }),
            response: Some(RawResponse {
                status: Some(201),
                body: Body::new(Some("text/plain"), "created"),
                ..RawResponse::default()
            }),
            description: None,
        });
        let config = RenderConfig {
            suppressed_request_headers: ["Authorization".to_owned()].into(),
            ..RenderConfig::default()
        };
        let example = ExampleMetadata::new(
            "creates a user",
            "POST /users creates a user",
            "./tests/requests/users_test.rs",
        );

        let rendered = DocumentRenderer::new(&config, &EmptyRegistry)
            .render(&source, &example)
            .unwrap();

        assert!(rendered.markdown.contains(
            "POST /users HTTP/1.1\nAccept: */*\nContent-Type: application/json\n\n{\n  \"name\": \"Al\"\n}\n```"
        ));
        assert!(rendered.markdown.contains("HTTP/1.1 201\n\n\ncreated\n```"));
        assert!(!rendered.markdown.contains("token"));
    }

    #[test]
    fn test_lowercase_response_content_type_labels_image() {
        let source = EmbeddedDriverSource::new(DriverContext {
            request: Some(RawRequest {
                method: Some("GET".to_owned()),
                path_info: Some("/avatar.png".to_owned()),
                ..RawRequest::default()
            }),
            response: Some(RawResponse {
                status: Some(200),
                headers: [("content-type".to_owned(), "image/png".to_owned())].into(),
                body: Body::new(None, vec![0x89, 0x50, 0x4e, 0x47, 0x00, 0xff]),
                ..RawResponse::default()
            }),
            description: None,
        });
        let example = ExampleMetadata::new(
            "returns the avatar",
            "GET /avatar.png returns the avatar",
            "./tests/requests/avatars_test.rs",
        );
        let config = RenderConfig::default();

        let markdown = DocumentRenderer::new(&config, &EmptyRegistry)
            .render(&source, &example)
            .unwrap()
            .markdown;

        assert!(markdown.ends_with("HTTP/1.1 200\nContent-Type: image/png\n\nimage/png\n```\n"));
        assert!(!markdown.contains("PNG"));
    }

    #[test]
    fn test_identifier() {
        assert_eq!(identifier("GET /users/:id"), "get-usersid");
        assert_eq!(identifier("DELETE /a/b"), "delete-ab");
    }

    #[test]
    fn test_capitalize_lowercases_rest() {
        assert_eq!(capitalize("returns USER list"), "Returns user list");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_dedent() {
        assert_eq!(dedent("  a\n    b\n\n  c"), "a\n  b\n\nc");
        assert_eq!(dedent("flat"), "flat");
    }

    #[test]
    fn test_request_query() {
        assert_eq!(request_query(None), "");
        assert_eq!(request_query(Some("")), "");
        assert_eq!(request_query(Some("a=%2F")), "?a=/");
    }
}
