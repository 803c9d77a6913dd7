//! Shapes of the results Godot sends back

use serde::{Deserialize, Serialize};

/// Result of the `read_file` command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileContents {
    /// Path as resolved by the editor; absent in older plugin versions
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub file_size: u64,
}

/// Result of the `write_file` command
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileWritten {
    #[serde(default)]
    pub identifier: Option<String>,
}

/// Result of the `list_project_files` command
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileListing {
    #[serde(default)]
    pub files: Vec<String>,
}

/// Body of `list_mcp_resources`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceNames {
    pub success: bool,
    pub message: String,
    pub data: Vec<String>,
}
