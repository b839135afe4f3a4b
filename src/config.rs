//! Server configuration
//!
//! Settings come from command line flags, then the environment (optionally
//! seeded from a `.env` file), then defaults.

use std::path::Path;

use thiserror::Error;
use tracing::{debug, warn};

/// Default GitHub REST endpoint
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// Name reported in `initialize`
pub const DEFAULT_SERVER_NAME: &str = "github-file-manager";

/// Errors that can occur while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read env file {path}: {source}")]
    EnvFile {
        path: String,
        #[source]
        source: dotenvy::Error,
    },
}

/// GitHub client settings
#[derive(Debug, Clone, PartialEq)]
pub struct GitHubConfig {
    pub token: Option<String>,
    pub api_url: String,
    pub user_agent: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_url: DEFAULT_GITHUB_API_URL.to_string(),
            user_agent: format!("github-file-manager-mcp/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Complete server configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub server_name: String,
    pub github: GitHubConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_name: DEFAULT_SERVER_NAME.to_string(),
            github: GitHubConfig::default(),
        }
    }
}

/// Overrides supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub github_token: Option<String>,
    pub github_api_url: Option<String>,
    pub server_name: Option<String>,
}

impl Config {
    /// Resolve the configuration from overrides and the process environment
    pub fn resolve(overrides: ConfigOverrides) -> Self {
        Self::resolve_with(overrides, |key| std::env::var(key).ok())
    }

    /// Resolve the configuration with an explicit environment lookup
    pub fn resolve_with<F>(overrides: ConfigOverrides, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

        let token = non_empty(overrides.github_token).or_else(|| non_empty(env("GITHUB_TOKEN")));
        let api_url = non_empty(overrides.github_api_url)
            .or_else(|| non_empty(env("GITHUB_API_URL")))
            .unwrap_or(defaults.github.api_url);

        Self {
            server_name: non_empty(overrides.server_name).unwrap_or(defaults.server_name),
            github: GitHubConfig {
                token,
                api_url,
                user_agent: defaults.github.user_agent,
            },
        }
    }
}

/// Mask a secret for logging, keeping only its length visible
pub fn mask(value: &str) -> String {
    "*".repeat(value.chars().count().min(10))
}

/// Load `KEY=VALUE` pairs from an env file into the process environment
///
/// Variables already set in the environment win. A missing file is not an
/// error. Returns the number of variables that were set.
pub fn load_env_file(path: &Path) -> Result<usize, ConfigError> {
    if !path.exists() {
        warn!("Env file {} not found, using process environment only", path.display());
        return Ok(0);
    }

    let to_error = |source: dotenvy::Error| ConfigError::EnvFile {
        path: path.display().to_string(),
        source,
    };

    let mut loaded = 0;
    for item in dotenvy::from_path_iter(path).map_err(to_error)? {
        let (key, value) = item.map_err(to_error)?;
        if std::env::var_os(&key).is_some() {
            debug!("Keeping existing environment variable {}", key);
            continue;
        }
        debug!("Loaded environment variable {} = {}...", key, mask(&value));
        std::env::set_var(&key, value);
        loaded += 1;
    }

    Ok(loaded)
}
