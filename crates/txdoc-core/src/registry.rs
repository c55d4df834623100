//! Validator registry: maps an endpoint to its declared parameter schema.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use serde::Deserialize;

use crate::error::RegistryError;
use crate::params::ParameterNode;
use crate::transaction::{Method, Transaction};

/// Key under which a parameter schema is registered.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EndpointKey {
    /// Method plus path info, for applications routed by path.
    Route { method: Method, path: String },
    /// Controller plus action, for applications routed by controller.
    Action { controller: String, action: String },
}

impl fmt::Display for EndpointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Route { method, path } => write!(f, "{method} {path}"),
            Self::Action { controller, action } => write!(f, "{controller}#{action}"),
        }
    }
}

/// Which key space the registry is addressed in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeySpace {
    /// Look schemas up by method and request path.
    #[default]
    Route,
    /// Look schemas up by controller and action.
    Action,
}

impl KeySpace {
    /// Build the lookup key for a transaction, if it carries the needed data.
    pub(crate) fn key_for(self, transaction: &Transaction) -> Option<EndpointKey> {
        match self {
            Self::Route => Some(EndpointKey::Route {
                method: transaction.method,
                path: transaction.path.clone(),
            }),
            Self::Action => {
                let route = &transaction.route;
                Some(EndpointKey::Action {
                    controller: route.controller.clone()?,
                    action: route.action.clone()?,
                })
            }
        }
    }
}

/// Source of declared parameter schemas.
pub trait ValidatorRegistry {
    /// Schema registered for `key`, if any.
    fn lookup(&self, key: &EndpointKey) -> Option<&ParameterNode>;
}

/// Registry that never has a schema.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyRegistry;

impl ValidatorRegistry for EmptyRegistry {
    fn lookup(&self, _key: &EndpointKey) -> Option<&ParameterNode> {
        None
    }
}

/// In-memory registry, built in code or loaded from YAML.
///
/// YAML layout:
///
/// ```yaml
/// routes:
///   - method: POST
///     path: /users
///     parameters:
///       - key: name
///         type: string
///         required: true
/// actions:
///   - controller: users
///     action: create
///     parameters: []
/// ```
#[derive(Debug, Default)]
pub struct StaticRegistry {
    entries: HashMap<EndpointKey, ParameterNode>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RegistryFile {
    routes: Vec<RouteEntry>,
    actions: Vec<ActionEntry>,
}

#[derive(Debug, Deserialize)]
struct RouteEntry {
    method: String,
    path: String,
    #[serde(default)]
    parameters: Vec<ParameterNode>,
}

#[derive(Debug, Deserialize)]
struct ActionEntry {
    controller: String,
    action: String,
    #[serde(default)]
    parameters: Vec<ParameterNode>,
}

impl StaticRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::ChildrenOnScalar` if a non-container node in
    /// the tree has children.
    pub fn insert(&mut self, key: EndpointKey, root: ParameterNode) -> Result<(), RegistryError> {
        if let Some(node) = root.find_invalid_children() {
            return Err(RegistryError::ChildrenOnScalar {
                key: node.key.clone().unwrap_or_else(|| "<element>".to_owned()),
                kind: node.kind.to_string(),
            });
        }
        self.entries.insert(key, root);
        Ok(())
    }

    /// Builder-style [`insert`](Self::insert).
    ///
    /// # Errors
    ///
    /// Same as [`insert`](Self::insert).
    pub fn with_entry(mut self, key: EndpointKey, root: ParameterNode) -> Result<Self, RegistryError> {
        self.insert(key, root)?;
        Ok(self)
    }

    /// Number of registered schemas.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse a registry from YAML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid, a method is unsupported or a
    /// schema violates the children invariant.
    pub fn from_yaml(yaml: &str) -> Result<Self, RegistryError> {
        let file: RegistryFile = serde_yaml::from_str(yaml)?;
        let mut registry = Self::new();

        for entry in file.routes {
            let method = entry
                .method
                .parse()
                .map_err(RegistryError::UnsupportedMethod)?;
            let key = EndpointKey::Route {
                method,
                path: entry.path,
            };
            registry.insert(key, ParameterNode::root(entry.parameters))?;
        }

        for entry in file.actions {
            let key = EndpointKey::Action {
                controller: entry.controller,
                action: entry.action,
            };
            registry.insert(key, ParameterNode::root(entry.parameters))?;
        }

        tracing::debug!(entries = registry.len(), "Loaded validator registry");
        Ok(registry)
    }

    /// Load a registry from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }
}

impl ValidatorRegistry for StaticRegistry {
    fn lookup(&self, key: &EndpointKey) -> Option<&ParameterNode> {
        self.entries.get(key)
    }
}
