//! Read-only project resources served from the editor

use rmcp::model::{AnnotateAble, RawResource, Resource};
use serde_json::{json, Value};

use crate::bridge::{BridgeError, CommandBridge};
use crate::handlers;
use crate::types::FileContents;

/// How a resource's content is fetched
#[derive(Debug, Clone, Copy)]
pub enum ResourceLoad {
    /// Send `command` with no parameters and return the result as JSON text
    Json { command: &'static str },
    /// Read a project file and return its text content
    FileText { identifier: &'static str },
}

#[derive(Debug, Clone, Copy)]
pub struct ResourceDef {
    pub uri: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub mime_type: &'static str,
    pub load: ResourceLoad,
}

pub const RESOURCES: &[ResourceDef] = &[
    ResourceDef {
        uri: "godot/project/structure",
        name: "Godot Project Structure",
        description: "Directory layout and file counts of the open project",
        mime_type: "application/json",
        load: ResourceLoad::Json {
            command: "get_project_structure",
        },
    },
    ResourceDef {
        uri: "godot/project/settings",
        name: "Godot Project Settings",
        description: "Project settings of the open project",
        mime_type: "application/json",
        load: ResourceLoad::Json {
            command: "get_project_settings",
        },
    },
    ResourceDef {
        uri: "godot/project/resources",
        name: "Godot Project Resources",
        description: "Every resource file in the open project",
        mime_type: "application/json",
        load: ResourceLoad::Json {
            command: "list_project_resources",
        },
    },
    ResourceDef {
        uri: "godot/project/logs",
        name: "Godot Project Logs",
        description: "The editor's current log file",
        mime_type: "text/plain",
        load: ResourceLoad::FileText {
            identifier: "user://logs/godot.log",
        },
    },
];

pub fn find(uri: &str) -> Option<&'static ResourceDef> {
    RESOURCES.iter().find(|def| def.uri == uri)
}

impl ResourceDef {
    pub fn to_resource(&self) -> Resource {
        let mut raw = RawResource::new(self.uri, self.name);
        raw.description = Some(self.description.to_string());
        raw.mime_type = Some(self.mime_type.to_string());
        raw.no_annotation()
    }

    /// Fetch the current content through the bridge
    pub async fn load(&self, bridge: &CommandBridge) -> Result<String, BridgeError> {
        match self.load {
            ResourceLoad::Json { command } => {
                let result = bridge.send_command(command, json!({})).await?;
                Ok(render_json(&result))
            }
            ResourceLoad::FileText { identifier } => {
                let file: FileContents =
                    handlers::call(bridge, "read_file", json!({ "identifier": identifier })).await?;
                Ok(file.content)
            }
        }
    }
}

fn render_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
