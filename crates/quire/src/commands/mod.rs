//! CLI command implementations.

pub(crate) mod drafts;
pub(crate) mod render;
pub(crate) mod tokens;

use std::io::{self, Read, Write};
use std::path::Path;

pub(crate) use drafts::DraftsArgs;
pub(crate) use render::RenderArgs;
pub(crate) use tokens::TokensArgs;

use crate::error::CliError;

/// Read a document from `path`, or from stdin when `path` is absent or `-`.
pub(crate) fn read_input(path: Option<&Path>) -> Result<String, CliError> {
    match path {
        Some(path) if path != Path::new("-") => Ok(std::fs::read_to_string(path)?),
        _ => {
            let mut input = String::new();
            io::stdin().read_to_string(&mut input)?;
            Ok(input)
        }
    }
}

/// Write `text` to stdout followed by a newline.
pub(crate) fn write_stdout(text: &str) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{text}")?;
    stdout.flush()?;
    Ok(())
}
