//! GitHub REST collaborator
//!
//! The tools talk to GitHub through the [`GitHubApi`] trait so the transport
//! can be swapped out (tests use an in-memory implementation).

pub mod client;
pub mod csv;

pub use client::GitHubClient;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while talking to GitHub
#[derive(Error, Debug)]
pub enum GitHubError {
    #[error("GitHub connection error: {0}")]
    Connection(String),

    #[error("GitHub authentication failed (check GITHUB_TOKEN)")]
    AuthenticationFailed,

    #[error("Rate limited by GitHub API")]
    RateLimited,

    #[error("Not found on GitHub: {0}")]
    NotFound(String),

    #[error("GitHub API error: status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Failed to decode GitHub response: {0}")]
    Decode(String),

    #[error("Invalid GitHub client configuration: {0}")]
    Config(String),
}

/// One hit of a code search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchItem {
    pub name: String,
    pub path: String,
}

/// A file fetched through the contents API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileContent {
    pub path: String,
    pub sha: String,
    /// Base64 payload, possibly wrapped across lines
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub encoding: String,
}

impl FileContent {
    /// Build a file from plain text (the inverse of [`FileContent::decoded_text`])
    pub fn from_text(path: impl Into<String>, sha: impl Into<String>, text: &str) -> Self {
        Self {
            path: path.into(),
            sha: sha.into(),
            content: BASE64.encode(text.as_bytes()),
            encoding: "base64".to_string(),
        }
    }

    /// Decode the base64 payload as UTF-8 text
    pub fn decoded_text(&self) -> Result<String, GitHubError> {
        let compact: String = self.content.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = BASE64
            .decode(compact)
            .map_err(|e| GitHubError::Decode(format!("{}: {}", self.path, e)))?;
        String::from_utf8(bytes).map_err(|e| GitHubError::Decode(format!("{}: {}", self.path, e)))
    }
}

/// A directory listing entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// New content for an existing file
#[derive(Debug, Clone, PartialEq)]
pub struct FileUpdate {
    pub path: String,
    pub message: String,
    pub text: String,
    /// Blob sha of the version being replaced
    pub sha: String,
    pub branch: Option<String>,
}

/// Operations the GitHub tools need
#[async_trait]
pub trait GitHubApi: Send + Sync {
    /// Search `repo` for files whose name matches `filename`
    async fn search_files(&self, repo: &str, filename: &str) -> Result<Vec<SearchItem>, GitHubError>;

    /// Fetch a file from the default branch
    async fn get_file(&self, repo: &str, path: &str) -> Result<FileContent, GitHubError>;

    /// List a directory (`""` is the repository root)
    async fn list_directory(&self, repo: &str, path: &str) -> Result<Vec<DirectoryEntry>, GitHubError>;

    /// Commit new content for an existing file
    async fn update_file(&self, repo: &str, update: &FileUpdate) -> Result<(), GitHubError>;
}
