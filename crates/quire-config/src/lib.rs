//! Configuration management for quire.
//!
//! Parses `quire.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `drafts.dir`
//! - `drafts.key`

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override GitHub Flavored Markdown extensions.
    pub gfm: Option<bool>,
    /// Override the nesting depth bound.
    pub max_depth: Option<usize>,
    /// Override the output format.
    pub format: Option<OutputFormat>,
    /// Override the drafts directory.
    pub drafts_dir: Option<PathBuf>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "quire.toml";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Rendering configuration.
    pub render: RenderConfig,
    /// Drafts configuration (paths are relative strings from TOML).
    drafts: DraftsConfigRaw,

    /// Resolved drafts configuration (set after loading).
    #[serde(skip)]
    pub drafts_resolved: DraftsConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Rendering configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Enable GitHub Flavored Markdown (tables, strikethrough, task lists).
    pub gfm: bool,
    /// Maximum token nesting depth rendered.
    pub max_depth: usize,
    /// Output format of `quire render`.
    pub format: OutputFormat,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            gfm: true,
            max_depth: 256,
            format: OutputFormat::Json,
        }
    }
}

/// Output format of rendered documents.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Render tree as JSON.
    #[default]
    Json,
    /// Render tree presented as HTML.
    Html,
}

/// Raw drafts configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct DraftsConfigRaw {
    dir: Option<String>,
    key: Option<String>,
    capacity: Option<usize>,
    min_length: Option<usize>,
}

/// Resolved drafts configuration with absolute paths.
#[derive(Debug)]
pub struct DraftsConfig {
    /// Directory holding draft files.
    pub dir: PathBuf,
    /// Key of the autosave history.
    pub key: String,
    /// Maximum number of drafts retained.
    pub capacity: usize,
    /// Drafts of this many characters or fewer are not autosaved.
    pub min_length: usize,
}

impl Default for DraftsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_DRAFTS_DIR),
            key: "markdown-autosave".to_owned(),
            capacity: 20,
            min_length: 10,
        }
    }
}

const DEFAULT_DRAFTS_DIR: &str = ".quire/drafts";

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
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`drafts.dir`").
        field: String,
        /// Error message (e.g., "${`QUIRE_HOME`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a numeric field to be greater than zero.
fn require_positive(value: usize, field: &str) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Validation(format!(
            "{field} must be greater than 0"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `quire.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values. The result is
    /// validated once more after overrides.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or a value is invalid.
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
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(gfm) = settings.gfm {
            self.render.gfm = gfm;
        }
        if let Some(max_depth) = settings.max_depth {
            self.render.max_depth = max_depth;
        }
        if let Some(format) = settings.format {
            self.render.format = format;
        }
        if let Some(drafts_dir) = &settings.drafts_dir {
            self.drafts_resolved.dir.clone_from(drafts_dir);
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let cwd = std::env::current_dir().ok()?;
        discover_from(&cwd)
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            render: RenderConfig::default(),
            drafts: DraftsConfigRaw::default(),
            drafts_resolved: DraftsConfig {
                dir: base.join(DEFAULT_DRAFTS_DIR),
                ..DraftsConfig::default()
            },
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file and after CLI overrides.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive(self.render.max_depth, "render.max_depth")?;
        require_non_empty(&self.drafts_resolved.key, "drafts.key")?;
        require_positive(self.drafts_resolved.capacity, "drafts.capacity")?;
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(ref dir) = self.drafts.dir {
            self.drafts.dir = Some(expand::expand_env(dir, "drafts.dir")?);
        }
        if let Some(ref key) = self.drafts.key {
            self.drafts.key = Some(expand::expand_env(key, "drafts.key")?);
        }
        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let defaults = DraftsConfig::default();
        self.drafts_resolved = DraftsConfig {
            dir: config_dir.join(self.drafts.dir.as_deref().unwrap_or(DEFAULT_DRAFTS_DIR)),
            key: self.drafts.key.clone().unwrap_or(defaults.key),
            capacity: self.drafts.capacity.unwrap_or(defaults.capacity),
            min_length: self.drafts.min_length.unwrap_or(defaults.min_length),
        };
    }
}

/// Walk from `start` up through its parents looking for a config file.
fn discover_from(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
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
