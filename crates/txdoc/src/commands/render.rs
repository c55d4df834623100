//! `txdoc render` command implementation.

use std::path::PathBuf;

use clap::Args;
use txdoc_config::{CliSettings, Config, KeySpaceSetting};
use txdoc_core::{
    DEFAULT_TEMPLATE, DocumentError, DocumentRenderer, DocumentSet, EmptyRegistry, KeySpace,
    PathMapping, RenderConfig, StaticRegistry, ValidatorRegistry, path_fn, validate_template,
};

use crate::capture::load_captures;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// Capture files written by the test run.
    #[arg(required = true)]
    captures: Vec<PathBuf>,

    /// Validator registry YAML file (overrides config).
    #[arg(short, long, env = "TXDOC_REGISTRY")]
    registry: Option<PathBuf>,

    /// Output directory for the documents (default: doc/).
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Also write a table of contents.
    #[arg(long)]
    toc: bool,

    /// Path to configuration file (default: auto-discover txdoc.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub(crate) verbose: bool,
}

impl RenderArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            output_root: self.output_dir.clone(),
            toc: self.toc.then_some(true),
            registry_path: self.registry.clone(),
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        let render_config = build_render_config(&config)?;
        let registry: Box<dyn ValidatorRegistry> = match &config.registry.path {
            Some(path) => {
                output.info(&format!("Registry: {}", path.display()));
                Box::new(StaticRegistry::load(path)?)
            }
            None => Box::new(EmptyRegistry),
        };
        let renderer = DocumentRenderer::new(&render_config, registry.as_ref());

        let mut documents = DocumentSet::new();
        let mut skipped = 0usize;
        for path in &self.captures {
            let captures = load_captures(path)?;
            tracing::debug!(path = %path.display(), count = captures.len(), "Loaded captures");
            for capture in captures {
                let description = capture.example().description.clone();
                match capture.render(&renderer) {
                    Ok(document) => documents.push(document),
                    Err(err) => {
                        skipped += 1;
                        output.warning(&format!(
                            "Skipping \"{description}\" ({}): {err}",
                            path.display()
                        ));
                    }
                }
            }
        }

        output.info(&format!("Output: {}", render_config.output_root.display()));
        let written = documents.write_all(&render_config.output_root, config.output.toc)?;

        output.success(&format!(
            "Rendered {} documents into {} files ({skipped} skipped)",
            documents.len(),
            written.len()
        ));
        Ok(())
    }
}

/// Translate the loaded configuration into rendering options.
fn build_render_config(config: &Config) -> Result<RenderConfig, CliError> {
    let template = config
        .template
        .source()?
        .unwrap_or_else(|| DEFAULT_TEMPLATE.to_owned());
    validate_template(&template).map_err(DocumentError::from)?;

    let mapping = match (&config.paths.pattern, &config.paths.replacement) {
        (Some(pattern), Some(replacement)) => PathMapping::new(pattern, replacement)
            .map_err(|e| CliError::Validation(format!("invalid paths.pattern: {e}")))?,
        _ => PathMapping::default(),
    };

    let key_space = match config.registry.key_space {
        KeySpaceSetting::Route => KeySpace::Route,
        KeySpaceSetting::Action => KeySpace::Action,
    };

    Ok(RenderConfig {
        template,
        suppressed_request_headers: config.headers.suppressed_request.clone(),
        suppressed_response_headers: config.headers.suppressed_response.clone(),
        document_path: path_fn(mapping),
        output_root: config.output.root.clone(),
        key_space,
    })
}
