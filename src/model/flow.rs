use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::model::{CodeFormat, DataFormat, FlowType};

/// A flow belonging to one entity, as reported by the flow lister
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowDefinition {
    pub entity_name: String,
    pub flow_name: String,
    pub flow_type: FlowType,
    #[serde(default)]
    pub code_format: CodeFormat,
    #[serde(default)]
    pub data_format: DataFormat,
    #[serde(default)]
    pub use_es_model: bool,
    /// Location of the flow on disk, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_dir: Option<PathBuf>,
}

impl FlowDefinition {
    pub fn new(entity_name: &str, flow_name: &str, flow_type: FlowType) -> Self {
        Self {
            entity_name: entity_name.to_string(),
            flow_name: flow_name.to_string(),
            flow_type,
            code_format: CodeFormat::default(),
            data_format: DataFormat::default(),
            use_es_model: false,
            flow_dir: None,
        }
    }
}

/// Input model for scaffolding a new flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFlow {
    pub flow_name: String,
    #[serde(default)]
    pub code_format: CodeFormat,
    #[serde(default)]
    pub data_format: DataFormat,
    #[serde(default)]
    pub use_es_model: bool,
}

impl NewFlow {
    pub fn new(flow_name: &str, code_format: CodeFormat, data_format: DataFormat) -> Self {
        Self {
            flow_name: flow_name.to_string(),
            code_format,
            data_format,
            use_es_model: false,
        }
    }
}

impl From<&FlowDefinition> for NewFlow {
    fn from(flow: &FlowDefinition) -> Self {
        Self {
            flow_name: flow.flow_name.clone(),
            code_format: flow.code_format,
            data_format: flow.data_format,
            use_es_model: flow.use_es_model,
        }
    }
}
