//! Configuration management for txdoc.
//!
//! Parses `txdoc.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ```toml
//! [output]
//! root = "doc"
//! toc = true
//!
//! [template]
//! path = "doc/templates/document.md.j2"
//!
//! [headers]
//! suppressed_request = ["Authorization"]
//! suppressed_response = ["Set-Cookie"]
//!
//! [paths]
//! pattern = '^\./tests/[^/]+/(.+)_test\.rs$'
//! replacement = "$1.md"
//!
//! [registry]
//! path = "tests/parameters.yaml"
//! key_space = "route"
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override output directory.
    pub output_root: Option<PathBuf>,
    /// Override table of contents generation.
    pub toc: Option<bool>,
    /// Override validator registry file.
    pub registry_path: Option<PathBuf>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "txdoc.toml";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Output configuration (paths are relative strings from TOML).
    #[serde(rename = "output")]
    output_raw: OutputConfigRaw,
    /// Template configuration.
    #[serde(rename = "template")]
    template_raw: TemplateConfigRaw,
    /// Header suppression.
    pub headers: HeadersConfig,
    /// Test file → document path mapping.
    pub paths: PathsConfig,
    /// Validator registry configuration.
    #[serde(rename = "registry")]
    registry_raw: RegistryConfigRaw,

    /// Resolved output configuration (set after loading).
    #[serde(skip)]
    pub output: OutputConfig,
    /// Resolved template configuration (set after loading).
    #[serde(skip)]
    pub template: TemplateConfig,
    /// Resolved registry configuration (set after loading).
    #[serde(skip)]
    pub registry: RegistryConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct OutputConfigRaw {
    root: Option<String>,
    toc: Option<bool>,
}

/// Resolved output configuration with absolute paths.
#[derive(Debug, Default)]
pub struct OutputConfig {
    /// Directory documents are written under.
    pub root: PathBuf,
    /// Whether to write a `toc.md` next to the documents.
    pub toc: bool,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct TemplateConfigRaw {
    path: Option<String>,
}

/// Resolved template configuration.
#[derive(Debug, Default)]
pub struct TemplateConfig {
    /// Template file, if configured.
    pub path: Option<PathBuf>,
}

impl TemplateConfig {
    /// Read the configured template source.
    ///
    /// Returns `Ok(None)` when no template file is configured.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` or `ConfigError::Io` if the file
    /// cannot be read.
    pub fn source(&self) -> Result<Option<String>, ConfigError> {
        let Some(path) = &self.path else {
            return Ok(None);
        };
        if !path.exists() {
            return Err(ConfigError::NotFound(path.clone()));
        }
        Ok(Some(std::fs::read_to_string(path)?))
    }
}

/// Header names hidden from rendered documents.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct HeadersConfig {
    /// Request header names in `Header-Case`.
    pub suppressed_request: BTreeSet<String>,
    /// Response header names in `Header-Case`.
    pub suppressed_response: BTreeSet<String>,
}

/// Regex rewrite of test file paths into document paths.
///
/// Both fields unset means the renderer's default mapping.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct PathsConfig {
    pub pattern: Option<String>,
    pub replacement: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RegistryConfigRaw {
    path: Option<String>,
    key_space: KeySpaceSetting,
}

/// Key space the validator registry is addressed in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeySpaceSetting {
    /// Method and path.
    #[default]
    Route,
    /// Controller and action.
    Action,
}

/// Resolved registry configuration with absolute paths.
#[derive(Debug, Default)]
pub struct RegistryConfig {
    /// YAML registry file, if configured.
    pub path: Option<PathBuf>,
    pub key_space: KeySpaceSetting,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `txdoc.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(root) = &settings.output_root {
            self.output.root.clone_from(root);
        }
        if let Some(toc) = settings.toc {
            self.output.toc = toc;
        }
        if let Some(registry_path) = &settings.registry_path {
            self.registry.path = Some(registry_path.clone());
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            output_raw: OutputConfigRaw::default(),
            template_raw: TemplateConfigRaw::default(),
            headers: HeadersConfig::default(),
            paths: PathsConfig::default(),
            registry_raw: RegistryConfigRaw::default(),
            output: OutputConfig {
                root: base.join("doc"),
                toc: false,
            },
            template: TemplateConfig::default(),
            registry: RegistryConfig::default(),
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        // Validate configuration after loading and resolution
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_headers()?;
        self.validate_paths()?;
        Ok(())
    }

    fn validate_headers(&self) -> Result<(), ConfigError> {
        for name in &self.headers.suppressed_request {
            require_non_empty(name, "headers.suppressed_request")?;
        }
        for name in &self.headers.suppressed_response {
            require_non_empty(name, "headers.suppressed_response")?;
        }
        Ok(())
    }

    /// Pattern and replacement must be set together, and the pattern must
    /// compile.
    fn validate_paths(&self) -> Result<(), ConfigError> {
        match (&self.paths.pattern, &self.paths.replacement) {
            (None, None) => Ok(()),
            (Some(pattern), Some(replacement)) => {
                require_non_empty(replacement, "paths.replacement")?;
                regex::Regex::new(pattern).map_err(|e| {
                    ConfigError::Validation(format!("paths.pattern is not a valid regex: {e}"))
                })?;
                Ok(())
            }
            _ => Err(ConfigError::Validation(
                "paths.pattern and paths.replacement must be set together".to_owned(),
            )),
        }
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        self.output = OutputConfig {
            root: config_dir.join(self.output_raw.root.as_deref().unwrap_or("doc")),
            toc: self.output_raw.toc.unwrap_or(false),
        };
        self.template = TemplateConfig {
            path: self.template_raw.path.as_deref().map(|p| config_dir.join(p)),
        };
        self.registry = RegistryConfig {
            path: self.registry_raw.path.as_deref().map(|p| config_dir.join(p)),
            key_space: self.registry_raw.key_space,
        };
    }
}
