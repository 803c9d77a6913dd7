//! Parameter types for Godot MCP tools

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ReadFileParams {
    #[schemars(
        description = "Path to the file (e.g. \"user://logs/godot.log\" or \"res://scripts/player.gd\")"
    )]
    pub identifier: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct WriteFileParams {
    #[schemars(
        description = "Path to the file (e.g. \"user://config.json\" or \"res://data/settings.cfg\")"
    )]
    pub identifier: String,

    #[schemars(description = "Content to write to the file")]
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ListFilesParams {
    #[schemars(
        description = "Directory to list files from (e.g. \"res://scenes\" or \"user://logs\"). Default: res://"
    )]
    #[serde(default = "default_directory")]
    pub directory: String,

    #[schemars(description = "File extensions to filter by (e.g. [\".tscn\", \".gd\"])")]
    #[serde(default)]
    pub extensions: Vec<String>,

    #[schemars(description = "Whether to search recursively through subdirectories (default: true)")]
    #[serde(default = "default_recursive")]
    pub recursive: bool,
}

fn default_directory() -> String {
    "res://".to_string()
}

fn default_recursive() -> bool {
    true
}

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct ListMcpResourcesParams {}
