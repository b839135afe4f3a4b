/// Public library interface for the GitHub file manager MCP server
///
/// This module exports the server composition root and the public types
/// that can be used by other applications or tests.

use std::sync::Arc;
use thiserror::Error;

pub mod config;
pub mod github;
pub mod mcp;
pub mod spreadsheet;
pub mod tools;

// Re-export public modules and types
pub use config::{Config, ConfigError, ConfigOverrides, GitHubConfig};
pub use github::{GitHubApi, GitHubClient, GitHubError};
pub use mcp::{McpServer, ToolRegistry};
pub use spreadsheet::{SpreadsheetError, Workbook};

/// Errors that can occur during server operation
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Tool registration error: {0}")]
    Registry(#[from] mcp::RegistryError),

    #[error("GitHub client error: {0}")]
    GitHub(#[from] GitHubError),
}

/// Main file manager server that implements the MCP protocol
///
/// Exposes GitHub file tools and Excel table tools over stdin/stdout.
pub struct FileManagerServer {
    config: Config,
    registry: ToolRegistry,
}

impl FileManagerServer {
    /// Create a server backed by the real GitHub API
    pub fn new(config: Config) -> Result<Self, ServerError> {
        tracing::info!(
            "Initializing {} (GitHub API at {})",
            config.server_name,
            config.github.api_url
        );

        let github = GitHubClient::new(config.github.clone())?;
        if !github.is_authenticated() {
            tracing::warn!("No GitHub token configured; only public repositories are reachable");
        }

        Self::with_github(config, Arc::new(github))
    }

    /// Create a server with a caller-supplied GitHub backend
    pub fn with_github(config: Config, github: Arc<dyn GitHubApi>) -> Result<Self, ServerError> {
        let mut registry = ToolRegistry::new();
        tools::register_all(&mut registry, github)?;
        tracing::info!("Registered {} tools", registry.len());

        Ok(Self { config, registry })
    }

    /// Run the MCP server, handling JSON-RPC requests over stdin/stdout
    ///
    /// Returns once stdin reaches end-of-input.
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!("Starting MCP server...");

        self.into_mcp_server().run_stdio().await?;

        Ok(())
    }

    /// Turn this server into an [`McpServer`] without binding it to stdio (useful for testing)
    pub fn into_mcp_server(self) -> McpServer {
        McpServer::new(self.registry, mcp::ServerInfo::new(self.config.server_name))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get a reference to the tool registry (useful for testing)
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }
}
