//! `quire render` command implementation.

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use quire_config::{CliSettings, Config, OutputFormat};
use quire_renderer::{Children, DocumentRenderer, Token, deserialize_tokens, to_html};

use super::{read_input, write_stdout};
use crate::error::CliError;

/// Output format flag.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub(crate) enum FormatArg {
    /// Render tree as JSON.
    Json,
    /// HTML presentation of the render tree.
    Html,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => Self::Json,
            FormatArg::Html => Self::Html,
        }
    }
}

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// Markdown file to render (default: stdin).
    file: Option<PathBuf>,

    /// Treat the input as a JSON token tree instead of markdown.
    #[arg(long)]
    tokens: bool,

    /// Output format (overrides config).
    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// Maximum nesting depth rendered (overrides config).
    #[arg(long)]
    max_depth: Option<usize>,

    /// Disable GitHub Flavored Markdown extensions.
    #[arg(long)]
    no_gfm: bool,

    /// Path to configuration file (default: auto-discover quire.toml).
    #[arg(short, long, env = "QUIRE_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl RenderArgs {
    /// Execute the render command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration, input or token JSON is invalid.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let cli_settings = CliSettings {
            gfm: self.no_gfm.then_some(false),
            max_depth: self.max_depth,
            format: self.format.map(Into::into),
            ..Default::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        let input = read_input(self.file.as_deref())?;
        let renderer = DocumentRenderer::new()
            .with_gfm(config.render.gfm)
            .with_max_depth(config.render.max_depth);

        let nodes = if self.tokens {
            let tokens = parse_tokens(&input)?;
            renderer.render(&tokens)
        } else {
            renderer.render(input.as_str())
        };

        let Some(nodes) = nodes else {
            tracing::info!("document is empty, nothing rendered");
            return Ok(());
        };

        write_stdout(&format_nodes(&nodes, config.render.format)?)
    }
}

/// Parse a JSON token tree. Malformed tokens become empty slots.
fn parse_tokens(input: &str) -> Result<Vec<Token>, CliError> {
    let mut deserializer = serde_json::Deserializer::from_str(input);
    let tokens = deserialize_tokens(&mut deserializer)?;
    deserializer.end()?;
    Ok(tokens)
}

/// Serialize rendered slots in the requested format.
fn format_nodes(nodes: &Children, format: OutputFormat) -> Result<String, CliError> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(nodes)?,
        OutputFormat::Html => to_html(nodes),
    })
}
