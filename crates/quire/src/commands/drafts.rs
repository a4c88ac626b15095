//! `quire drafts` subcommand group.

use std::path::PathBuf;

use chrono::Utc;
use clap::{Args, Subcommand};
use quire_config::{CliSettings, Config, DraftsConfig};
use quire_drafts::{AutosaveHistory, AutosaveRecord, FileDraftStore};

use super::{read_input, write_stdout};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the drafts command group.
#[derive(Args)]
pub(crate) struct DraftsArgs {
    #[command(subcommand)]
    command: DraftsCommand,

    /// Path to configuration file (default: auto-discover quire.toml).
    #[arg(short, long, global = true, env = "QUIRE_CONFIG")]
    config: Option<PathBuf>,

    /// Drafts directory (overrides config).
    #[arg(long, global = true)]
    dir: Option<PathBuf>,
}

/// Draft history commands.
#[derive(Subcommand)]
enum DraftsCommand {
    /// List saved drafts, newest first.
    List,
    /// Print one saved draft.
    Show {
        /// Position in the list (0 is the newest).
        index: usize,
    },
    /// Save a document to the history.
    Push {
        /// Markdown file to save (default: stdin).
        file: Option<PathBuf>,

        /// Apply the editor's autosave rule and skip short drafts.
        #[arg(long)]
        auto: bool,
    },
}

impl DraftsArgs {
    /// Execute the drafts subcommand.
    pub(crate) fn execute(self, output: &Output) -> Result<(), CliError> {
        let cli_settings = CliSettings {
            drafts_dir: self.dir,
            ..Default::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let history = open_history(&config.drafts_resolved);

        match self.command {
            DraftsCommand::List => {
                let records = history.records();
                if records.is_empty() {
                    output.info("No drafts saved.");
                }
                for (index, record) in records.iter().enumerate() {
                    write_stdout(&list_line(index, record))?;
                }
            }
            DraftsCommand::Show { index } => {
                let records = history.records();
                let record = records.get(index).ok_or_else(|| {
                    CliError::Validation(format!(
                        "no draft at index {index} ({} saved)",
                        records.len()
                    ))
                })?;
                write_stdout(&record.data)?;
            }
            DraftsCommand::Push { file, auto } => {
                let input = read_input(file.as_deref())?;
                if auto {
                    if history.autosave(&input, Utc::now())? {
                        output.success("Draft saved.");
                    } else {
                        output.warning("Draft too short to autosave, skipped.");
                    }
                } else {
                    history.push(&input, Utc::now())?;
                    output.success("Draft saved.");
                }
            }
        }

        Ok(())
    }
}

fn open_history(config: &DraftsConfig) -> AutosaveHistory<FileDraftStore> {
    tracing::debug!(dir = %config.dir.display(), key = %config.key, "opening draft history");
    AutosaveHistory::new(FileDraftStore::new(config.dir.clone()))
        .with_key(config.key.clone())
        .with_capacity(config.capacity)
        .with_min_length(config.min_length)
}

/// Format one history entry as `[index] time: preview`.
fn list_line(index: usize, record: &AutosaveRecord) -> String {
    let time = record.time().map_or_else(
        || record.unix_time.to_string(),
        |time| time.format("%Y-%m-%d %H:%M:%S").to_string(),
    );
    format!("[{index}] {time}: {}", record.preview())
}
