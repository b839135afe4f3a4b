/// Spreadsheet tools driven through the JSON-RPC dispatcher
use async_trait::async_trait;
use github_file_manager_mcp::github::{DirectoryEntry, FileContent, FileUpdate, SearchItem};
use github_file_manager_mcp::mcp::protocol::JsonRpcRequest;
use github_file_manager_mcp::spreadsheet::Sheet;
use github_file_manager_mcp::*;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

/// GitHub backend for sessions that never reach GitHub
struct Offline;

#[async_trait]
impl GitHubApi for Offline {
    async fn search_files(&self, _repo: &str, _filename: &str) -> Result<Vec<SearchItem>, GitHubError> {
        Err(GitHubError::Connection("offline".to_string()))
    }

    async fn get_file(&self, _repo: &str, path: &str) -> Result<FileContent, GitHubError> {
        Err(GitHubError::NotFound(path.to_string()))
    }

    async fn list_directory(&self, _repo: &str, _path: &str) -> Result<Vec<DirectoryEntry>, GitHubError> {
        Err(GitHubError::Connection("offline".to_string()))
    }

    async fn update_file(&self, _repo: &str, _update: &FileUpdate) -> Result<(), GitHubError> {
        Err(GitHubError::Connection("offline".to_string()))
    }
}

fn server() -> McpServer {
    FileManagerServer::with_github(Config::default(), Arc::new(Offline))
        .expect("Failed to create server")
        .into_mcp_server()
}

async fn call_tool(server: &McpServer, name: &str, arguments: Value) -> Value {
    let request: JsonRpcRequest = serde_json::from_value(json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "tools/call",
        "params": {"name": name, "arguments": arguments}
    }))
    .unwrap();
    serde_json::to_value(server.handle_request(request).await).unwrap()
}

fn text(response: &Value) -> &str {
    response["result"]["content"][0]["text"]
        .as_str()
        .unwrap_or_else(|| panic!("not a tool result: {}", response))
}

fn write(path: &Path, rows: &[&[&str]]) -> String {
    Workbook::new(vec![Sheet::from_strings("Sheet1", rows)])
        .save(path)
        .expect("Failed to write workbook");
    path.to_str().unwrap().to_string()
}

#[cfg(test)]
mod spreadsheet_session_tests {
    use super::*;

    #[tokio::test]
    async fn test_inventory_workflow() {
        let dir = tempdir().unwrap();
        let scan = write(
            &dir.path().join("scan.xlsx"),
            &[
                &["Package Name", "Component Location", "DLT Category"],
                &["React Router", "/src/router.js", "Open Source"],
                &["Chart.js", "/src/chart.css", "Commercial"],
            ],
        );
        let inventory = write(
            &dir.path().join("inventory.xlsx"),
            &[
                &["File Path", "DLT Status", "Component Name"],
                &["/src/router.js", "Open Source", "React Router"],
                &["/src/legacy.js", "Deprecated", "Legacy"],
            ],
        );
        let snapshot = write(
            &dir.path().join("snapshot.xlsx"),
            &[
                &["File Path", "DLT Status", "Component Name"],
                &["/src/router.js", "Open Source", "React Router"],
                &["/src/legacy.js", "Deprecated", "Legacy"],
            ],
        );
        let server = server();

        let mapping = call_tool(
            &server,
            "smart_column_mapping",
            json!({"source_file": scan, "target_file": inventory}),
        )
        .await;
        assert!(text(&mapping).contains("3. DLT Category → 2. DLT Status"));

        let copied = call_tool(
            &server,
            "copy_data_by_mapping",
            json!({"source_file": scan, "target_file": inventory, "mapping_rules": {"1": 3, "2": 1, "3": 2}}),
        )
        .await;
        assert!(text(&copied).contains("Copied 2 rows"));

        let diff = call_tool(
            &server,
            "compare_excel_files",
            json!({"file1": snapshot, "file2": inventory, "key_column": "File Path"}),
        )
        .await;
        let report = text(&diff);
        assert!(report.contains("  /src/legacy.js | Deprecated | Legacy"));
        assert!(report.contains("  /src/chart.css | Commercial | Chart.js"));
        assert!(report.contains("  unchanged_count: 1"));

        let cleared = call_tool(&server, "clear_content_keep_headers", json!({"file_path": inventory})).await;
        assert!(text(&cleared).contains("Cleared 2 data rows"));

        let structure = call_tool(&server, "analyze_table_structure", json!({"file_path": inventory})).await;
        assert!(text(&structure).contains("Rows: 1 (0 data rows)"));
    }

    #[tokio::test]
    async fn test_tool_failures_become_error_envelopes() {
        let server = server();

        let missing = call_tool(&server, "analyze_table_structure", json!({"file_path": "/no/such/file.xlsx"})).await;
        assert_eq!(missing["error"]["code"], -32002);
        assert!(missing["error"]["message"]
            .as_str()
            .unwrap()
            .contains("File not found"));

        let no_args = call_tool(&server, "get_column_data_sample", json!({})).await;
        assert_eq!(no_args["error"]["code"], -32002);

        let offline = call_tool(&server, "list_files", json!({"repo_name": "acme/deploy"})).await;
        assert_eq!(offline["error"]["code"], -32002);
    }
}
