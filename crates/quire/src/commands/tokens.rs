//! `quire tokens` command implementation.

use std::path::PathBuf;

use clap::Args;
use quire_config::{CliSettings, Config};
use quire_renderer::{parser_options, tokenize_bounded};

use super::{read_input, write_stdout};
use crate::error::CliError;

/// Arguments for the tokens command.
#[derive(Args)]
pub(crate) struct TokensArgs {
    /// Markdown file to tokenize (default: stdin).
    file: Option<PathBuf>,

    /// Disable GitHub Flavored Markdown extensions.
    #[arg(long)]
    no_gfm: bool,

    /// Path to configuration file (default: auto-discover quire.toml).
    #[arg(short, long, env = "QUIRE_CONFIG")]
    config: Option<PathBuf>,
}

impl TokensArgs {
    /// Execute the tokens command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration or input cannot be read.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let cli_settings = CliSettings {
            gfm: self.no_gfm.then_some(false),
            ..Default::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        let input = read_input(self.file.as_deref())?;
        let tokens = tokenize_bounded(
            &input,
            parser_options(config.render.gfm),
            config.render.max_depth,
        );
        write_stdout(&serde_json::to_string_pretty(&tokens)?)
    }
}
