use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A flow plugin source file being edited
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginModel {
    pub plugin_path: PathBuf,
    /// Declared type of the plugin, usually its file name (e.g. `content.sjs`)
    pub plugin_type: String,
    pub file_contents: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleType {
    Javascript,
    Xquery,
}

impl ModuleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleType::Javascript => "javascript",
            ModuleType::Xquery => "xquery",
        }
    }
}

/// Request sent to the server-side user module validator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleValidationRequest {
    pub entity_name: String,
    pub flow_name: String,
    pub module_name: String,
    pub module_type: ModuleType,
    pub contents: String,
}
