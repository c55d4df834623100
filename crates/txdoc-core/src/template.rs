//! Markdown document template.
//!
//! Templates are `minijinja` sources. Every placeholder listed on
//! [`TemplateValues`] is available; sections that compute to nothing are
//! bound to empty strings so templates need no conditionals.

use minijinja::{Environment, UndefinedBehavior};
use serde::Serialize;

/// Template used when the configuration does not name one.
pub const DEFAULT_TEMPLATE: &str = r"## {{ title }}
{{ description }}
{{ parameters_section }}{{ example_get_section }}{{ example_post_section }}
### Request
```plain
{{ method }} {{ path }}{{ request_query }} {{ request_http_version }}
{{ request_header }}{{ request_body_section }}
```

### Response
```plain
{{ response_http_version }} {{ response_status }}
{{ response_header }}{{ response_body_section }}
```
";

/// Values bound to template placeholders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TemplateValues {
    pub title: String,
    pub identifier: String,
    pub description: String,
    pub method: String,
    pub path: String,
    /// `?<decoded query>` or empty.
    pub request_query: String,
    pub request_http_version: String,
    pub request_header: String,
    pub request_body: String,
    pub request_body_section: String,
    pub response_status: u16,
    pub response_http_version: String,
    pub response_header: String,
    pub response_body: String,
    pub response_body_section: String,
    pub parameters: String,
    pub parameters_section: String,
    pub example_get_section: String,
    pub example_post_section: String,
}

fn environment<'source>() -> Environment<'source> {
    let mut env = Environment::new();
    env.set_keep_trailing_newline(true);
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env
}

/// Render `template` with `values`.
pub(crate) fn render(template: &str, values: &TemplateValues) -> Result<String, minijinja::Error> {
    environment().render_str(template, values)
}

/// Check that a template parses.
///
/// # Errors
///
/// Returns the parse error reported by the template engine.
pub fn validate_template(template: &str) -> Result<(), minijinja::Error> {
    environment().template_from_str(template).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_template_is_valid() {
        assert!(validate_template(DEFAULT_TEMPLATE).is_ok());
    }

    #[test]
    fn test_invalid_template() {
        assert!(validate_template("{{ title").is_err());
    }

    #[test]
    fn test_render_keeps_trailing_newline() {
        let values = TemplateValues {
            title: "GET /".to_owned(),
            ..TemplateValues::default()
        };
        assert_eq!(render("# {{ title }}\n", &values).unwrap(), "# GET /\n");
    }

    #[test]
    fn test_render_does_not_escape_markdown() {
        let values = TemplateValues {
            request_body: "<a href=\"x\">&</a>".to_owned(),
            ..TemplateValues::default()
        };
        assert_eq!(
            render("{{ request_body }}", &values).unwrap(),
            "<a href=\"x\">&</a>"
        );
    }

    #[test]
    fn test_unknown_placeholder_fails() {
        let err = render("{{ nope }}", &TemplateValues::default()).unwrap_err();
        assert_eq!(err.kind(), minijinja::ErrorKind::UndefinedError);
    }
}
