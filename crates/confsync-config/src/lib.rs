//! Configuration management for confsync.
//!
//! Parses `confsync.toml` configuration files with serde and provides
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
//! - `docs.root_title`
//! - `publish.root_page_id`

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override docs source directory.
    pub source_dir: Option<PathBuf>,
    /// Override state ledger file.
    pub state_file: Option<PathBuf>,
    /// Override staging directory for published pages.
    pub out_dir: Option<PathBuf>,
    /// Override hard line break rendering.
    pub hard_line_break: Option<bool>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "confsync.toml";

/// Directory for confsync data, relative to the config file.
const PROJECT_DIR: &str = ".confsync";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Documentation configuration (paths are relative strings from TOML).
    docs: DocsConfigRaw,
    /// Rendering configuration.
    pub render: RenderConfig,
    /// State ledger configuration (paths are relative strings from TOML).
    state: StateConfigRaw,
    /// Publishing configuration (paths are relative strings from TOML).
    publish: PublishConfigRaw,

    /// Resolved docs configuration (set after loading).
    #[serde(skip)]
    pub docs_resolved: DocsConfig,
    /// Resolved state configuration (set after loading).
    #[serde(skip)]
    pub state_resolved: StateConfig,
    /// Resolved publish configuration (set after loading).
    #[serde(skip)]
    pub publish_resolved: PublishConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Raw docs configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct DocsConfigRaw {
    source_dir: Option<String>,
    attachments_dir: Option<String>,
    index_name: Option<String>,
    root_title: Option<String>,
}

/// Resolved documentation configuration with absolute paths.
#[derive(Debug, Default)]
pub struct DocsConfig {
    /// Source directory for markdown files.
    pub source_dir: PathBuf,
    /// Name of the folder that collects a page's attachments.
    pub attachments_dir: String,
    /// File name of a directory's index document.
    pub index_name: String,
    /// Explicit title for the page of the source root.
    pub root_title: Option<String>,
}

impl DocsConfig {
    /// Title of the page representing the source root.
    ///
    /// Falls back to the source directory's name, then to `"Docs"`.
    #[must_use]
    pub fn root_title(&self) -> String {
        if let Some(title) = &self.root_title {
            return title.clone();
        }
        self.source_dir
            .file_name()
            .map_or_else(|| "Docs".to_owned(), |n| n.to_string_lossy().into_owned())
    }
}

/// Rendering configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Render soft line breaks as `<br />`.
    pub hard_line_break: bool,
    /// Code block language passed through to the default renderer.
    pub diagram_language: String,
    /// Title of the tip macro wrapping block quotes.
    pub tip_title: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            hard_line_break: false,
            diagram_language: "mermaid".to_owned(),
            tip_title: "提示".to_owned(),
        }
    }
}

/// Raw state configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct StateConfigRaw {
    file: Option<String>,
}

/// Resolved state ledger configuration.
#[derive(Debug, Default)]
pub struct StateConfig {
    /// Path to the JSON state ledger.
    pub file: PathBuf,
}

/// Raw publish configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct PublishConfigRaw {
    root_page_id: Option<String>,
    out_dir: Option<String>,
}

/// Resolved publishing configuration.
#[derive(Debug, Default)]
pub struct PublishConfig {
    /// Page id under which top-level pages are created (empty for none).
    pub root_page_id: String,
    /// Directory where staged pages are written.
    pub out_dir: PathBuf,
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
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`publish.root_page_id`").
        field: String,
        /// Error message (e.g., "${`ROOT_PAGE_ID`} not set").
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

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `confsync.toml` in current directory and parents.
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
        if let Some(source_dir) = &settings.source_dir {
            self.docs_resolved.source_dir.clone_from(source_dir);
        }
        if let Some(state_file) = &settings.state_file {
            self.state_resolved.file.clone_from(state_file);
        }
        if let Some(out_dir) = &settings.out_dir {
            self.publish_resolved.out_dir.clone_from(out_dir);
        }
        if let Some(hard_line_break) = settings.hard_line_break {
            self.render.hard_line_break = hard_line_break;
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
        let mut config = Self {
            docs: DocsConfigRaw::default(),
            render: RenderConfig::default(),
            state: StateConfigRaw::default(),
            publish: PublishConfigRaw::default(),
            docs_resolved: DocsConfig::default(),
            state_resolved: StateConfig::default(),
            publish_resolved: PublishConfig::default(),
            config_path: None,
        };
        config.resolve_paths(base);
        config
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
    /// Called automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_docs()?;
        require_non_empty(&self.render.diagram_language, "render.diagram_language")?;
        Ok(())
    }

    /// Validate docs configuration.
    fn validate_docs(&self) -> Result<(), ConfigError> {
        let docs = &self.docs_resolved;

        require_non_empty(&docs.attachments_dir, "docs.attachments_dir")?;
        if docs.attachments_dir.contains('/') || matches!(docs.attachments_dir.as_str(), "." | "..")
        {
            return Err(ConfigError::Validation(
                "docs.attachments_dir must be a single folder name".to_owned(),
            ));
        }

        require_non_empty(&docs.index_name, "docs.index_name")?;
        if !docs.index_name.ends_with(".md") {
            return Err(ConfigError::Validation(
                "docs.index_name must end with .md".to_owned(),
            ));
        }

        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(ref title) = self.docs.root_title {
            self.docs.root_title = Some(expand::expand_env(title, "docs.root_title")?);
        }
        if let Some(ref page_id) = self.publish.root_page_id {
            self.publish.root_page_id =
                Some(expand::expand_env(page_id, "publish.root_page_id")?);
        }
        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let resolve = |path: Option<&str>, default: &str| config_dir.join(path.unwrap_or(default));
        let project_dir = config_dir.join(PROJECT_DIR);

        self.docs_resolved = DocsConfig {
            source_dir: resolve(self.docs.source_dir.as_deref(), "docs"),
            attachments_dir: self
                .docs
                .attachments_dir
                .clone()
                .unwrap_or_else(|| "assets".to_owned()),
            index_name: self
                .docs
                .index_name
                .clone()
                .unwrap_or_else(|| "index.md".to_owned()),
            root_title: self.docs.root_title.clone(),
        };

        self.state_resolved = StateConfig {
            file: self
                .state
                .file
                .as_deref()
                .map_or_else(|| project_dir.join("state.json"), |f| config_dir.join(f)),
        };

        self.publish_resolved = PublishConfig {
            root_page_id: self.publish.root_page_id.clone().unwrap_or_default(),
            out_dir: self
                .publish
                .out_dir
                .as_deref()
                .map_or_else(|| project_dir.join("pages"), |d| config_dir.join(d)),
        };
    }
}
