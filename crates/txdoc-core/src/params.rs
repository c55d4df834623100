//! Declared parameter schema and its Markdown rendering.
//!
//! A schema is a tree of [`ParameterNode`]s owned by value. Only `hash` and
//! `array` nodes carry children; the [`StaticRegistry`](crate::StaticRegistry)
//! rejects anything else when an entry is inserted.

use std::fmt::{self, Write};

use serde::{Deserialize, Serialize};

use crate::transaction::{ParamValue, Params};

/// Type tag of a declared parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ParamType {
    String,
    Integer,
    Float,
    Boolean,
    Date,
    Datetime,
    File,
    Hash,
    Array,
    Any,
    /// Tag not known to the renderer, printed verbatim.
    Other(String),
}

impl ParamType {
    /// Whether nodes of this type may have children.
    #[must_use]
    pub fn is_container(&self) -> bool {
        matches!(self, Self::Hash | Self::Array)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Datetime => "datetime",
            Self::File => "file",
            Self::Hash => "hash",
            Self::Array => "array",
            Self::Any => "any",
            Self::Other(tag) => tag,
        }
    }
}

impl From<String> for ParamType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "string" => Self::String,
            "integer" => Self::Integer,
            "float" => Self::Float,
            "boolean" => Self::Boolean,
            "date" => Self::Date,
            "datetime" => Self::Datetime,
            "file" => Self::File,
            "hash" => Self::Hash,
            "array" => Self::Array,
            "any" => Self::Any,
            _ => Self::Other(tag),
        }
    }
}

impl From<ParamType> for String {
    fn from(kind: ParamType) -> Self {
        kind.as_str().to_owned()
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of contexts a parameter is limited to (or excluded from).
///
/// Rendered as a symbol list, e.g. `[:admin, :owner]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scope(pub Vec<String>);

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char('[')?;
        for (i, context) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, ":{context}")?;
        }
        f.write_char(']')
    }
}

/// One node of a declared parameter schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterNode {
    /// Parameter name; absent for the root and for array elements.
    #[serde(default)]
    pub key: Option<String>,
    /// Type tag.
    #[serde(rename = "type")]
    pub kind: ParamType,
    #[serde(default)]
    pub required: bool,
    /// Contexts the parameter applies to exclusively.
    #[serde(default)]
    pub only: Option<Scope>,
    /// Contexts the parameter does not apply to.
    #[serde(default)]
    pub except: Option<Scope>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    /// Nested parameters in declaration order.
    #[serde(default)]
    pub children: Vec<ParameterNode>,
}

impl ParameterNode {
    /// Create an optional node without annotations.
    pub fn new(key: Option<&str>, kind: ParamType) -> Self {
        Self {
            key: key.map(str::to_owned),
            kind,
            required: false,
            only: None,
            except: None,
            description: None,
            comment: None,
            children: Vec::new(),
        }
    }

    /// Unnamed `hash` node holding the top-level parameters of an endpoint.
    #[must_use]
    pub fn root(children: Vec<ParameterNode>) -> Self {
        Self::new(None, ParamType::Hash).with_children(children)
    }

    /// Named node of the given type.
    pub fn named(key: &str, kind: ParamType) -> Self {
        Self::new(Some(key), kind)
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn with_only(mut self, contexts: &[&str]) -> Self {
        self.only = Some(Scope(contexts.iter().map(|&c| c.to_owned()).collect()));
        self
    }

    #[must_use]
    pub fn with_except(mut self, contexts: &[&str]) -> Self {
        self.except = Some(Scope(contexts.iter().map(|&c| c.to_owned()).collect()));
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_owned());
        self
    }

    #[must_use]
    pub fn with_comment(mut self, comment: &str) -> Self {
        self.comment = Some(comment.to_owned());
        self
    }

    #[must_use]
    pub fn with_children(mut self, children: Vec<ParameterNode>) -> Self {
        self.children = children;
        self
    }

    /// First node in the tree (depth-first) that has children but is not a
    /// container type.
    pub(crate) fn find_invalid_children(&self) -> Option<&ParameterNode> {
        if !self.children.is_empty() && !self.kind.is_container() {
            return Some(self);
        }
        self.children.iter().find_map(Self::find_invalid_children)
    }

    /// Annotations in fixed order: required, only, except, comment.
    fn annotations(&self) -> Vec<String> {
        let mut assets = Vec::with_capacity(4);
        if self.required {
            assets.push("required".to_owned());
        }
        if let Some(only) = &self.only {
            assets.push(format!("only: `{only}`"));
        }
        if let Some(except) = &self.except {
            assets.push(format!("except: `{except}`"));
        }
        if let Some(comment) = &self.comment {
            assets.push(format!("comment: `{comment:?}`"));
        }
        assets
    }
}

/// Render a schema as nested Markdown bullets.
///
/// An unnamed `hash` root stands for the endpoint itself, so its children
/// become the top-level bullets. Any other root is rendered as a single
/// bullet with its subtree.
pub fn render_parameters(root: &ParameterNode) -> String {
    if root.key.is_none() && root.kind == ParamType::Hash {
        root.children
            .iter()
            .map(render_node)
            .collect::<Vec<_>>()
            .join("\n")
    } else {
        render_node(root)
    }
}

/// One bullet followed by its subtree; every line of a child block is
/// indented two spaces.
fn render_node(node: &ParameterNode) -> String {
    let mut out = match &node.key {
        Some(key) => format!("* `{key}` {}", node.kind),
        None => format!("* {}", node.kind),
    };

    let assets = node.annotations();
    if !assets.is_empty() {
        let _ = write!(out, " ({})", assets.join(", "));
    }
    if let Some(description) = &node.description {
        let _ = write!(out, " - {description}");
    }

    for child in &node.children {
        out.push('\n');
        out.push_str(&indent(&render_node(child)));
    }
    out
}

/// Prefix every non-empty line with two spaces.
fn indent(block: &str) -> String {
    block
        .lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("  {line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render decoded request parameters as a query-style string,
/// e.g. `page=2&ids[]=1&ids[]=2&filter[name]=Al`.
pub(crate) fn params_to_query(params: &Params) -> String {
    let mut pairs = Vec::new();
    for (key, value) in params {
        match value {
            ParamValue::Scalar(value) => pairs.push(format!("{key}={value}")),
            ParamValue::List(values) => {
                pairs.extend(values.iter().map(|value| format!("{key}[]={value}")));
            }
            ParamValue::Map(entries) => {
                pairs.extend(
                    entries
                        .iter()
                        .map(|(sub, value)| format!("{key}[{sub}]={value}")),
                );
            }
        }
    }
    pairs.join("&")
}
