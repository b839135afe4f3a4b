/// Basic integration tests: a full server session over in-memory streams
use async_trait::async_trait;
use github_file_manager_mcp::github::{DirectoryEntry, FileContent, FileUpdate, SearchItem};
use github_file_manager_mcp::*;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

/// In-memory repository holding a single CSV file
struct FakeRepository {
    file: Mutex<FileContent>,
}

impl FakeRepository {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            file: Mutex::new(FileContent::from_text(
                "config/versions.csv",
                "sha-1",
                "service,version\napi,1.4.0\nworker,2.0.1\n",
            )),
        })
    }
}

#[async_trait]
impl GitHubApi for FakeRepository {
    async fn search_files(&self, _repo: &str, filename: &str) -> Result<Vec<SearchItem>, GitHubError> {
        let file = self.file.lock().unwrap();
        if file.path.contains(filename) {
            Ok(vec![SearchItem {
                name: "versions.csv".to_string(),
                path: file.path.clone(),
            }])
        } else {
            Ok(Vec::new())
        }
    }

    async fn get_file(&self, _repo: &str, _path: &str) -> Result<FileContent, GitHubError> {
        Ok(self.file.lock().unwrap().clone())
    }

    async fn list_directory(&self, repo: &str, _path: &str) -> Result<Vec<DirectoryEntry>, GitHubError> {
        if repo == "acme/missing" {
            return Err(GitHubError::NotFound(repo.to_string()));
        }
        Ok(vec![DirectoryEntry {
            name: "config".to_string(),
            path: "config".to_string(),
            kind: "dir".to_string(),
        }])
    }

    async fn update_file(&self, _repo: &str, update: &FileUpdate) -> Result<(), GitHubError> {
        let mut file = self.file.lock().unwrap();
        *file = FileContent::from_text(update.path.clone(), "sha-2", &update.text);
        Ok(())
    }
}

fn server(github: Arc<FakeRepository>) -> McpServer {
    let config = Config {
        server_name: "test-file-manager".to_string(),
        ..Config::default()
    };
    FileManagerServer::with_github(config, github)
        .expect("Failed to create server")
        .into_mcp_server()
}

/// Feed `input` through a server and return the decoded response lines
async fn session(server: &McpServer, input: &str) -> Vec<Value> {
    let mut output = Vec::new();
    server
        .serve(input.as_bytes(), &mut output)
        .await
        .expect("Session failed");

    String::from_utf8(output)
        .expect("Output is not UTF-8")
        .lines()
        .map(|line| serde_json::from_str(line).expect("Response is not JSON"))
        .collect()
}

fn call(id: u64, name: &str, arguments: Value) -> String {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "tools/call",
        "params": {"name": name, "arguments": arguments}
    })
    .to_string()
}

#[cfg(test)]
mod basic_integration_tests {
    use super::*;

    #[tokio::test]
    async fn test_initialize_and_list_tools() {
        let server = server(FakeRepository::new());
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05","clientInfo":{"name":"test"}}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
            "\n"
        );

        let responses = session(&server, input).await;
        assert_eq!(responses.len(), 2);

        let init = &responses[0]["result"];
        assert_eq!(init["protocolVersion"], "2024-11-05");
        assert_eq!(init["serverInfo"]["name"], "test-file-manager");
        assert_eq!(init["serverInfo"]["version"], env!("CARGO_PKG_VERSION"));

        let names: Vec<&str> = responses[1]["result"]["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|tool| tool["name"].as_str().unwrap())
            .collect();
        assert_eq!(
            names,
            vec![
                "search_file_content",
                "list_files",
                "update_file_content",
                "analyze_table_structure",
                "clear_content_keep_headers",
                "get_column_data_sample",
                "smart_column_mapping",
                "copy_data_by_mapping",
                "compare_excel_files",
            ]
        );

        for tool in responses[1]["result"]["tools"].as_array().unwrap() {
            assert_eq!(tool["inputSchema"]["type"], "object", "{}", tool["name"]);
        }
    }

    #[test]
    fn test_composed_server_exposes_config_and_tools() {
        let config = Config {
            server_name: "composed".to_string(),
            ..Config::default()
        };
        let server = FileManagerServer::with_github(config, FakeRepository::new()).expect("Failed to create server");

        assert_eq!(server.config().server_name, "composed");
        assert_eq!(server.registry().len(), 9);
        assert!(server.registry().contains("compare_excel_files"));
        assert!(!server.registry().contains("resources/list"));
    }

    #[tokio::test]
    async fn test_update_then_search_sees_new_value() {
        let github = FakeRepository::new();
        let server = server(github.clone());

        let input = [
            call(1, "update_file_content", json!({
                "repo_name": "acme/deploy",
                "filename": "versions.csv",
                "search_key": "worker",
                "new_value": "2.1.0"
            })),
            call(2, "search_file_content", json!({
                "repo_name": "acme/deploy",
                "filename": "versions.csv",
                "search_key": "worker"
            })),
        ]
        .join("\n");

        let responses = session(&server, &input).await;
        assert_eq!(responses.len(), 2);
        assert!(responses[0]["result"]["content"][0]["text"]
            .as_str()
            .unwrap()
            .contains("Updated worker to 2.1.0"));
        assert!(responses[1]["result"]["content"][0]["text"]
            .as_str()
            .unwrap()
            .contains("worker => 2.1.0"));

        let file = github.file.lock().unwrap();
        assert_eq!(file.sha, "sha-2");
    }

    #[tokio::test]
    async fn test_errors_do_not_stop_the_session() {
        let server = server(FakeRepository::new());

        let input = [
            "not json".to_string(),
            String::new(),
            r#"{"jsonrpc":"2.0","id":"a","method":"resources/list"}"#.to_string(),
            call(3, "delete_everything", json!({})),
            call(4, "list_files", json!({"repo_name": "acme/missing"})),
            call(5, "list_files", json!({})),
            call(6, "list_files", json!({"repo_name": "acme/deploy"})),
        ]
        .join("\n");

        let responses = session(&server, &input).await;
        assert_eq!(responses.len(), 6);

        assert_eq!(responses[0]["error"]["code"], -32700);
        assert_eq!(responses[0]["id"], Value::Null);

        assert_eq!(responses[1]["id"], "a");
        assert_eq!(responses[1]["error"]["code"], -32601);
        assert_eq!(responses[1]["error"]["message"], "Unknown method: resources/list");

        assert_eq!(responses[2]["error"]["code"], -32001);
        assert_eq!(responses[2]["error"]["message"], "Tool not found: delete_everything");

        assert_eq!(responses[3]["error"]["code"], -32002);
        assert!(responses[3]["error"]["message"]
            .as_str()
            .unwrap()
            .starts_with("Tool execution failed: "));

        assert_eq!(responses[4]["id"], 5);
        assert_eq!(responses[4]["error"]["code"], -32002);

        assert_eq!(responses[5]["id"], 6);
        assert_eq!(
            responses[5]["result"]["content"][0]["text"],
            "Files in acme/deploy:\n📁 config (dir)"
        );
    }
}
