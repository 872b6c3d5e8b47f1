use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::VigilError;
use crate::types::{AnchorMode, Strategy};

/// Top-level configuration loaded from `.vigil.toml`.
///
/// Supports layered resolution: CLI flags > env vars > local config > defaults.
/// The config object is threaded explicitly through the pipeline so tests can
/// inject fake credentials and endpoints.
///
/// # Examples
///
/// ```
/// use vigil_core::VigilConfig;
///
/// let config = VigilConfig::default();
/// assert_eq!(config.github.api_base, "https://api.github.com");
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VigilConfig {
    /// GitHub API settings.
    #[serde(default)]
    pub github: GithubConfig,
    /// Model endpoint settings for the classifier/generative analyzers.
    #[serde(default)]
    pub model: ModelConfig,
    /// Review behavior settings.
    #[serde(default)]
    pub review: ReviewConfig,
}

impl VigilConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`VigilError::Io`] if the file cannot be read, or
    /// [`VigilError::Toml`] if the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use vigil_core::VigilConfig;
    /// use std::path::Path;
    ///
    /// let config = VigilConfig::from_file(Path::new(".vigil.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, VigilError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`VigilError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use vigil_core::VigilConfig;
    ///
    /// let toml = r#"
    /// [review]
    /// strategy = "classifier"
    /// "#;
    /// let config = VigilConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.review.strategy.to_string(), "classifier");
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, VigilError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }
}

/// GitHub API configuration.
///
/// The token is usually supplied via the `GITHUB_TOKEN` environment variable
/// rather than the config file; `api_base` exists so tests can point the
/// client at a local server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    /// Base URL for GitHub REST calls (default: `https://api.github.com`).
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Repository owner.
    pub owner: Option<String>,
    /// Repository name.
    pub repo: Option<String>,
    /// Authentication token. Prefer the `GITHUB_TOKEN` env var.
    pub token: Option<String>,
}

fn default_api_base() -> String {
    "https://api.github.com".into()
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            owner: None,
            repo: None,
            token: None,
        }
    }
}

/// Model endpoint configuration.
///
/// Used by both the classifier analyzer (HuggingFace-style inference
/// endpoint) and the generative analyzer (OpenAI-compatible chat
/// completions).
///
/// # Examples
///
/// ```
/// use vigil_core::ModelConfig;
///
/// let config = ModelConfig::default();
/// assert_eq!(config.model, "gpt-4o-mini");
/// assert_eq!(config.max_input_chars, 4000);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Base URL for model API requests.
    #[serde(default = "default_model_base")]
    pub base_url: String,
    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,
    /// API key for the model provider.
    pub api_key: Option<String>,
    /// Maximum input characters to send per request (default: 4000).
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,
}

fn default_model_base() -> String {
    "https://api.openai.com".into()
}

fn default_model() -> String {
    "gpt-4o-mini".into()
}

fn default_max_input_chars() -> usize {
    4000
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: default_model_base(),
            model: default_model(),
            api_key: None,
            max_input_chars: default_max_input_chars(),
        }
    }
}

/// Review behavior configuration.
///
/// # Examples
///
/// ```
/// use vigil_core::{AnchorMode, ReviewConfig, Strategy};
///
/// let config = ReviewConfig::default();
/// assert_eq!(config.strategy, Strategy::Heuristic);
/// assert_eq!(config.anchor, AnchorMode::Line);
/// assert!(!config.fetch_contents);
/// assert!(!config.batch);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewConfig {
    /// Analysis strategy (default: heuristic).
    #[serde(default)]
    pub strategy: Strategy,
    /// Comment anchoring convention (default: line).
    #[serde(default)]
    pub anchor: AnchorMode,
    /// File-extension allowlist; files outside it are skipped.
    /// An empty list allows every file.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    /// Fetch and decode each file's full blob instead of analyzing the
    /// patch (default: false).
    #[serde(default)]
    pub fetch_contents: bool,
    /// Post all findings as a single review submission instead of one
    /// comment per finding (default: false).
    #[serde(default)]
    pub batch: bool,
}

fn default_extensions() -> Vec<String> {
    vec!["py".into(), "rs".into()]
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            anchor: AnchorMode::default(),
            extensions: default_extensions(),
            fetch_contents: false,
            batch: false,
        }
    }
}
