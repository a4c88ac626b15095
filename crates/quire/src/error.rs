//! CLI error types.

use quire_config::ConfigError;
use quire_drafts::DraftError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Draft(#[from] DraftError),

    #[error("{0}")]
    Validation(String),
}
