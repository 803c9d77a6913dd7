//! Tool handlers
//!
//! Each handler forwards to the editor through the bridge and turns the
//! result into text for the calling agent. Bridge failures become tool-level
//! errors (`is_error`) so the agent can read them.

use mcp_common::{error_text, json_success, text_success, CallToolResult, McpError};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::bridge::{BridgeError, CommandBridge};
use crate::params::*;
use crate::resources::RESOURCES;
use crate::types::{FileContents, FileListing, FileWritten, ResourceNames};

/// Send `command` and decode its result into `T`
pub(crate) async fn call<T: DeserializeOwned>(
    bridge: &CommandBridge,
    command: &str,
    params: Value,
) -> Result<T, BridgeError> {
    let result = match bridge.send_command(command, params).await? {
        // `success: true` with no result still decodes into all-default fields
        Value::Null => json!({}),
        result => result,
    };
    serde_json::from_value(result)
        .map_err(|e| BridgeError::Protocol(format!("unexpected {} result: {}", command, e)))
}

fn failure(action: &str, err: BridgeError) -> CallToolResult {
    tracing::debug!("Tool failed to {}: {}", action, err);
    error_text(format!("Failed to {}: {}", action, err))
}

pub async fn read_file(
    bridge: &CommandBridge,
    params: ReadFileParams,
) -> Result<CallToolResult, McpError> {
    let request = json!({ "identifier": params.identifier });
    match call::<FileContents>(bridge, "read_file", request).await {
        Ok(file) => {
            let identifier = file.identifier.as_deref().unwrap_or(&params.identifier);
            Ok(text_success(format!(
                "File contents of {} ({} bytes):\n\n{}",
                identifier, file.file_size, file.content
            )))
        }
        Err(e) => Ok(failure("read file", e)),
    }
}

pub async fn write_file(
    bridge: &CommandBridge,
    params: WriteFileParams,
) -> Result<CallToolResult, McpError> {
    let request = json!({
        "identifier": params.identifier,
        "content": params.content,
    });
    match call::<FileWritten>(bridge, "write_file", request).await {
        Ok(written) => {
            let identifier = written.identifier.as_deref().unwrap_or(&params.identifier);
            Ok(text_success(format!(
                "Successfully wrote to file: {}",
                identifier
            )))
        }
        Err(e) => Ok(failure("write file", e)),
    }
}

pub async fn list_files(
    bridge: &CommandBridge,
    params: ListFilesParams,
) -> Result<CallToolResult, McpError> {
    let request = json!({
        "directory": params.directory,
        "extensions": params.extensions,
        "recursive": params.recursive,
    });
    let listing = match call::<FileListing>(bridge, "list_project_files", request).await {
        Ok(listing) => listing,
        Err(e) => return Ok(failure("list files", e)),
    };

    if listing.files.is_empty() {
        let mut text = format!("No files found in {}", params.directory);
        if !params.extensions.is_empty() {
            text.push_str(&format!(" with extensions: {}", params.extensions.join(", ")));
        }
        return Ok(text_success(text));
    }

    Ok(text_success(format!(
        "Files in {}:\n\n{}",
        params.directory,
        listing.files.join("\n")
    )))
}

pub async fn list_mcp_resources() -> Result<CallToolResult, McpError> {
    let data: Vec<String> = RESOURCES.iter().map(|def| def.name.to_string()).collect();
    let message = if data.is_empty() {
        "No MCP resources are currently registered.".to_string()
    } else {
        format!("Found {} registered MCP resources.", data.len())
    };

    json_success(&ResourceNames {
        success: true,
        message,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::testing::fake_godot;
    use crate::bridge::BridgeConfig;

    fn text(result: &CallToolResult) -> String {
        result.content[0].as_text().unwrap().text.clone()
    }

    #[tokio::test]
    async fn test_read_file_formats_contents() {
        let (connector, mut godot) = fake_godot();
        let bridge = CommandBridge::new(connector, BridgeConfig::default());
        let task = {
            let bridge = bridge.clone();
            tokio::spawn(async move {
                read_file(
                    &bridge,
                    ReadFileParams {
                        identifier: "res://a.txt".into(),
                    },
                )
                .await
            })
        };
        let _godot = godot.accept().await.serve(|_, params| {
            Ok(json!({"identifier": params["identifier"], "content": "X", "file_size": 1}))
        });

        let result = task.await.unwrap().unwrap();
        assert_eq!(text(&result), "File contents of res://a.txt (1 bytes):\n\nX");
        assert_ne!(result.is_error, Some(true));
    }

    #[tokio::test]
    async fn test_read_file_reports_remote_error() {
        let (connector, mut godot) = fake_godot();
        let bridge = CommandBridge::new(connector, BridgeConfig::default());
        bridge.connect().await.unwrap();
        let _godot = godot
            .accept()
            .await
            .serve(|_, _| Err("File not found: res://missing.gd".to_string()));

        let result = read_file(
            &bridge,
            ReadFileParams {
                identifier: "res://missing.gd".into(),
            },
        )
        .await
        .unwrap();
        assert_eq!(result.is_error, Some(true));
        assert_eq!(
            text(&result),
            "Failed to read file: File not found: res://missing.gd"
        );
    }

    #[tokio::test]
    async fn test_write_file_confirms_identifier() {
        let (connector, mut godot) = fake_godot();
        let bridge = CommandBridge::new(connector, BridgeConfig::default());
        bridge.connect().await.unwrap();
        let _godot = godot.accept().await.serve(|command, params| {
            assert_eq!(command, "write_file");
            assert_eq!(params["content"], "hello");
            Ok(json!({}))
        });

        let result = write_file(
            &bridge,
            WriteFileParams {
                identifier: "user://note.txt".into(),
                content: "hello".into(),
            },
        )
        .await
        .unwrap();
        assert_eq!(text(&result), "Successfully wrote to file: user://note.txt");
    }

    #[tokio::test]
    async fn test_list_files_empty_mentions_extensions() {
        let (connector, mut godot) = fake_godot();
        let bridge = CommandBridge::new(connector, BridgeConfig::default());
        bridge.connect().await.unwrap();
        let _godot = godot
            .accept()
            .await
            .serve(|_, _| Ok(json!({"files": []})));

        let result = list_files(
            &bridge,
            ListFilesParams {
                directory: "res://scenes".into(),
                extensions: vec![".tscn".into(), ".gd".into()],
                recursive: true,
            },
        )
        .await
        .unwrap();
        assert_eq!(
            text(&result),
            "No files found in res://scenes with extensions: .tscn, .gd"
        );
    }

    #[tokio::test]
    async fn test_list_files_one_per_line() {
        let (connector, mut godot) = fake_godot();
        let bridge = CommandBridge::new(connector, BridgeConfig::default());
        bridge.connect().await.unwrap();
        let _godot = godot.accept().await.serve(|command, params| {
            assert_eq!(command, "list_project_files");
            assert_eq!(params["recursive"], true);
            Ok(json!({"files": ["res://a.gd", "res://b.gd"]}))
        });

        let params: ListFilesParams = serde_json::from_value(json!({})).unwrap();
        let result = list_files(&bridge, params).await.unwrap();
        assert_eq!(text(&result), "Files in res://:\n\nres://a.gd\nres://b.gd");
    }

    #[tokio::test]
    async fn test_unreachable_editor_is_tool_error() {
        let (connector, godot) = fake_godot();
        godot.refuse_connections(true);
        let bridge = CommandBridge::new(connector, BridgeConfig::default());

        let result = list_files(
            &bridge,
            serde_json::from_value(json!({"directory": "res://"})).unwrap(),
        )
        .await
        .unwrap();
        assert_eq!(result.is_error, Some(true));
        assert!(text(&result).starts_with("Failed to list files: Could not connect to Godot"));
    }

    #[tokio::test]
    async fn test_list_mcp_resources_names_catalog() {
        let result = list_mcp_resources().await.unwrap();
        let body: Value = serde_json::from_str(&text(&result)).unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Found 4 registered MCP resources.");
        assert_eq!(body["data"][3], "Godot Project Logs");
    }
}
