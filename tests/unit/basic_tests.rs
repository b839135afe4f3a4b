/// Basic unit tests to verify core functionality
use github_file_manager_mcp::config::{Config, ConfigOverrides, DEFAULT_GITHUB_API_URL, DEFAULT_SERVER_NAME};
use github_file_manager_mcp::mcp::protocol::{decode_request, encode_response, DecodeError};
use github_file_manager_mcp::mcp::{error_codes, JsonRpcResponse, ToolDefinition, ToolRegistry};
use github_file_manager_mcp::mcp::{FnTool, RegistryError, ToolArguments, ToolError, ToolHandler, ToolOutput};
use github_file_manager_mcp::spreadsheet::Sheet;
use serde_json::{json, Value};

#[cfg(test)]
mod basic_unit_tests {
    use super::*;

    #[test]
    fn test_decode_valid_request() {
        let request = decode_request(r#"{"jsonrpc":"2.0","id":"abc","method":"tools/list"}"#).unwrap();
        assert_eq!(request.id, json!("abc"));
        assert_eq!(request.method, "tools/list");
        assert!(request.params.is_none());
    }

    #[test]
    fn test_decode_rejects_bad_input() {
        assert!(matches!(decode_request("{oops"), Err(DecodeError::Parse(_))));
        assert!(matches!(
            decode_request(r#"{"jsonrpc":"2.0","id":1}"#),
            Err(DecodeError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_encoded_error_is_single_line() {
        let response = JsonRpcResponse::error(json!(7), error_codes::TOOL_NOT_FOUND, "Tool not found: x");
        let line = encode_response(&response);
        assert!(!line.contains('\n'));

        let value: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["jsonrpc"], "2.0");
        assert_eq!(value["id"], 7);
        assert_eq!(value["error"]["code"], -32001);
        assert!(value.get("result").is_none());
    }

    #[test]
    fn test_registry_rejects_duplicates() {
        let mut registry = ToolRegistry::new();
        let echo = || FnTool::new(|_args: ToolArguments| Ok(ToolOutput::from("hi")));

        registry
            .register(ToolDefinition::without_schema("echo", "Echo"), echo())
            .unwrap();
        let err = registry
            .register(ToolDefinition::without_schema("echo", "Echo again"), echo())
            .unwrap_err();

        assert_eq!(err, RegistryError::DuplicateTool("echo".to_string()));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.list()[0].description, "Echo");
    }

    #[test]
    fn test_fn_tool_reads_arguments() {
        let greet = FnTool::new(|args: ToolArguments| match args.get("name").and_then(Value::as_str) {
            Some(name) => Ok(ToolOutput::from(format!("Hello, {}", name))),
            None => Err(ToolError::InvalidArguments("name is required".to_string())),
        });

        let arguments = ToolArguments::new(json!({"name": "Ada"}).as_object().cloned().unwrap());
        let output = tokio_test::block_on(greet.call(arguments)).unwrap();
        assert_eq!(output.into_text(), "Hello, Ada");

        let err = tokio_test::block_on(greet.call(ToolArguments::default())).unwrap_err();
        assert_eq!(err.to_string(), "invalid arguments: name is required");
    }

    #[test]
    fn test_json_output_is_pretty_printed() {
        let output = ToolOutput::Json(json!({"rows": 3}));
        assert_eq!(output.into_text(), "{\n  \"rows\": 3\n}");
    }

    #[test]
    fn test_config_defaults_and_overrides() {
        let config = Config::resolve_with(ConfigOverrides::default(), |_| None);
        assert_eq!(config.server_name, DEFAULT_SERVER_NAME);
        assert_eq!(config.github.api_url, DEFAULT_GITHUB_API_URL);
        assert!(config.github.token.is_none());

        let overrides = ConfigOverrides {
            github_token: Some("cli-token".to_string()),
            ..ConfigOverrides::default()
        };
        let config = Config::resolve_with(overrides, |key| match key {
            "GITHUB_TOKEN" => Some("env-token".to_string()),
            "GITHUB_API_URL" => Some("https://ghe.example.com/api/v3".to_string()),
            _ => None,
        });
        assert_eq!(config.github.token.as_deref(), Some("cli-token"));
        assert_eq!(config.github.api_url, "https://ghe.example.com/api/v3");
    }

    #[test]
    fn test_sheet_column_resolution() {
        let sheet = Sheet::from_strings("s", &[&["Path", "Status"], &["/a", "ok"]]);
        assert_eq!(sheet.resolve_column("2").unwrap(), 1);
        assert_eq!(sheet.resolve_column("Path").unwrap(), 0);
        assert!(sheet.resolve_column("status").is_err());
    }
}
