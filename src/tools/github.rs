//! GitHub file tools
//!
//! `search_file_content`, `list_files` and `update_file_content`. Files are
//! treated as two-column CSV keyed by their first column.

use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::debug;

use super::input_schema;
use crate::github::{csv, FileContent, FileUpdate, GitHubApi};
use crate::mcp::{RegistryError, ToolArguments, ToolDefinition, ToolError, ToolHandler, ToolOutput, ToolRegistry};

/// Parameters for `search_file_content`
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchFileContentParams {
    /// Repository as "owner/name"
    pub repo_name: String,
    /// File name (or part of it) to search for
    pub filename: String,
    /// Value of the first column to look up
    pub search_key: String,
}

/// Parameters for `list_files`
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListFilesParams {
    /// Repository as "owner/name"
    pub repo_name: String,
    /// Directory inside the repository (defaults to the root)
    #[serde(default)]
    pub path: String,
}

/// Parameters for `update_file_content`
#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateFileContentParams {
    /// Repository as "owner/name"
    pub repo_name: String,
    /// File name (or part of it) to search for
    pub filename: String,
    /// Value of the first column identifying the row to update
    pub search_key: String,
    /// New value for the second column
    pub new_value: String,
    /// Branch to commit to (defaults to the repository's default branch)
    #[serde(default)]
    pub branch: Option<String>,
    /// Commit message (a descriptive default is used when omitted)
    #[serde(default)]
    pub commit_message: Option<String>,
}

/// Fetch the files matching `filename`, skipping any that cannot be read
async fn matching_files(
    github: &dyn GitHubApi,
    repo: &str,
    filename: &str,
) -> Result<Vec<(FileContent, String)>, ToolError> {
    let hits = github.search_files(repo, filename).await?;
    let mut files = Vec::new();

    for hit in hits {
        let fetched = match github.get_file(repo, &hit.path).await {
            Ok(file) => file.decoded_text().map(|text| (file, text)),
            Err(e) => Err(e),
        };
        match fetched {
            Ok(file) => files.push(file),
            Err(e) => debug!("Skipping {}: {}", hit.path, e),
        }
    }

    Ok(files)
}

/// Looks up a key in CSV files of a repository
pub struct SearchFileContent {
    github: Arc<dyn GitHubApi>,
}

impl SearchFileContent {
    pub fn new(github: Arc<dyn GitHubApi>) -> Self {
        Self { github }
    }

    pub fn definition() -> ToolDefinition {
        ToolDefinition::new(
            "search_file_content",
            "Search a GitHub repository for files by name and return the value stored next to a key (first column → second column)",
            input_schema::<SearchFileContentParams>(),
        )
    }
}

#[async_trait]
impl ToolHandler for SearchFileContent {
    async fn call(&self, arguments: ToolArguments) -> Result<ToolOutput, ToolError> {
        let params: SearchFileContentParams = arguments.parse()?;
        let files = matching_files(self.github.as_ref(), &params.repo_name, &params.filename).await?;

        if files.is_empty() {
            return Ok(ToolOutput::Text(format!(
                "No files matching '{}' were found in {}",
                params.filename, params.repo_name
            )));
        }

        for (file, text) in &files {
            if let Some(value) = csv::lookup_value(text, &params.search_key) {
                return Ok(ToolOutput::Text(format!(
                    "✅ Found file: {}\n🔍 {} => {}",
                    file.path, params.search_key, value
                )));
            }
        }

        Ok(ToolOutput::Text(format!(
            "❌ No value for '{}' in the {} matching file(s)",
            params.search_key,
            files.len()
        )))
    }
}

/// Lists a directory of a repository
pub struct ListFiles {
    github: Arc<dyn GitHubApi>,
}

impl ListFiles {
    pub fn new(github: Arc<dyn GitHubApi>) -> Self {
        Self { github }
    }

    pub fn definition() -> ToolDefinition {
        ToolDefinition::new(
            "list_files",
            "List the files and directories at a path of a GitHub repository",
            input_schema::<ListFilesParams>(),
        )
    }
}

#[async_trait]
impl ToolHandler for ListFiles {
    async fn call(&self, arguments: ToolArguments) -> Result<ToolOutput, ToolError> {
        let params: ListFilesParams = arguments.parse()?;
        let entries = self.github.list_directory(&params.repo_name, &params.path).await?;

        let location = if params.path.trim_matches('/').is_empty() {
            params.repo_name.clone()
        } else {
            format!("{}/{}", params.repo_name, params.path.trim_matches('/'))
        };

        if entries.is_empty() {
            return Ok(ToolOutput::Text(format!("{} is empty", location)));
        }

        let listing = entries
            .iter()
            .map(|entry| format!("📁 {} ({})", entry.name, entry.kind))
            .collect::<Vec<_>>()
            .join("\n");

        Ok(ToolOutput::Text(format!("Files in {}:\n{}", location, listing)))
    }
}

/// Rewrites the value stored next to a key and commits the change
pub struct UpdateFileContent {
    github: Arc<dyn GitHubApi>,
}

impl UpdateFileContent {
    pub fn new(github: Arc<dyn GitHubApi>) -> Self {
        Self { github }
    }

    pub fn definition() -> ToolDefinition {
        ToolDefinition::new(
            "update_file_content",
            "Update the value stored next to a key in a CSV file of a GitHub repository and commit the change",
            input_schema::<UpdateFileContentParams>(),
        )
    }
}

#[async_trait]
impl ToolHandler for UpdateFileContent {
    async fn call(&self, arguments: ToolArguments) -> Result<ToolOutput, ToolError> {
        let params: UpdateFileContentParams = arguments.parse()?;
        let files = matching_files(self.github.as_ref(), &params.repo_name, &params.filename).await?;

        for (file, text) in files {
            let Some(updated) = csv::replace_value(&text, &params.search_key, &params.new_value) else {
                continue;
            };

            let message = params.commit_message.clone().unwrap_or_else(|| {
                format!("Update {} to {} in {}", params.search_key, params.new_value, file.path)
            });
            let update = FileUpdate {
                path: file.path.clone(),
                message,
                text: updated,
                sha: file.sha.clone(),
                branch: params.branch.clone(),
            };
            self.github.update_file(&params.repo_name, &update).await?;

            return Ok(ToolOutput::Text(format!(
                "✅ Updated {} to {} in {}/{}",
                params.search_key, params.new_value, params.repo_name, file.path
            )));
        }

        Err(ToolError::Failed(format!(
            "no file matching '{}' in {} contains the key '{}'",
            params.filename, params.repo_name, params.search_key
        )))
    }
}

pub fn register(registry: &mut ToolRegistry, github: Arc<dyn GitHubApi>) -> Result<(), RegistryError> {
    registry.register(SearchFileContent::definition(), SearchFileContent::new(Arc::clone(&github)))?;
    registry.register(ListFiles::definition(), ListFiles::new(Arc::clone(&github)))?;
    registry.register(UpdateFileContent::definition(), UpdateFileContent::new(github))?;
    Ok(())
}
