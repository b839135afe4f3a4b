//! reqwest-backed implementation of [`GitHubApi`]

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{DirectoryEntry, FileContent, FileUpdate, GitHubApi, GitHubError, SearchItem};
use crate::config::GitHubConfig;

/// Maximum number of code search hits fetched per query
const SEARCH_PAGE_SIZE: u32 = 10;

/// GitHub API client
pub struct GitHubClient {
    client: reqwest::Client,
    config: GitHubConfig,
}

impl GitHubClient {
    /// Create a new GitHub client
    ///
    /// Without a token the client still works against public repositories,
    /// with GitHub's anonymous rate limits (code search requires a token).
    pub fn new(config: GitHubConfig) -> Result<Self, GitHubError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github.v3+json"));

        if let Some(token) = &config.token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| GitHubError::Config(format!("invalid token: {}", e)))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()
            .map_err(|e| GitHubError::Config(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn is_authenticated(&self) -> bool {
        self.config.token.is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_url.trim_end_matches('/'), path)
    }

    fn contents_url(&self, repo: &str, path: &str) -> String {
        let path = path.trim_matches('/');
        if path.is_empty() {
            self.url(&format!("repos/{}/contents", repo))
        } else {
            self.url(&format!("repos/{}/contents/{}", repo, path))
        }
    }

    /// Map non-success statuses onto [`GitHubError`]
    async fn check(response: Response, what: &str) -> Result<Response, GitHubError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        match status {
            StatusCode::UNAUTHORIZED => Err(GitHubError::AuthenticationFailed),
            StatusCode::NOT_FOUND => Err(GitHubError::NotFound(what.to_string())),
            StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => Err(GitHubError::RateLimited),
            _ => {
                let body = response.text().await.unwrap_or_default();
                Err(GitHubError::Api {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        what: &str,
    ) -> Result<T, GitHubError> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| GitHubError::Connection(e.to_string()))?;

        Self::check(response, what)
            .await?
            .json()
            .await
            .map_err(|e| GitHubError::Decode(e.to_string()))
    }
}

#[async_trait]
impl GitHubApi for GitHubClient {
    async fn search_files(&self, repo: &str, filename: &str) -> Result<Vec<SearchItem>, GitHubError> {
        #[derive(Deserialize)]
        struct SearchResponse {
            #[serde(default)]
            items: Vec<SearchItem>,
        }

        let query = [
            ("q", format!("filename:{} repo:{}", filename, repo)),
            ("per_page", SEARCH_PAGE_SIZE.to_string()),
        ];
        let response: SearchResponse = self
            .get_json(&self.url("search/code"), &query, &format!("repository {}", repo))
            .await?;

        Ok(response.items)
    }

    async fn get_file(&self, repo: &str, path: &str) -> Result<FileContent, GitHubError> {
        self.get_json(&self.contents_url(repo, path), &[], &format!("{}/{}", repo, path))
            .await
    }

    async fn list_directory(&self, repo: &str, path: &str) -> Result<Vec<DirectoryEntry>, GitHubError> {
        self.get_json(&self.contents_url(repo, path), &[], &format!("{}/{}", repo, path))
            .await
    }

    async fn update_file(&self, repo: &str, update: &FileUpdate) -> Result<(), GitHubError> {
        let url = self.contents_url(repo, &update.path);
        let mut body = json!({
            "message": update.message,
            "content": BASE64.encode(update.text.as_bytes()),
            "sha": update.sha,
        });
        if let Some(branch) = &update.branch {
            body["branch"] = json!(branch);
        }

        debug!("PUT {}", url);
        let response = self
            .client
            .put(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| GitHubError::Connection(e.to_string()))?;

        Self::check(response, &format!("{}/{}", repo, update.path)).await?;
        Ok(())
    }
}
