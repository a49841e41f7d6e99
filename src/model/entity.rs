use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use crate::model::{FlowDefinition, HubUiData, NewFlow};

const INFO_KEY: &str = "info";
const TITLE_KEY: &str = "title";
const DEFINITIONS_KEY: &str = "definitions";

/// The `info` block of a new entity; `title` is the entity's identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfoType {
    pub title: String,
    /// Any other info keys, kept as written
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl InfoType {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            extra: Map::new(),
        }
    }
}

/// An entity definition enriched with its flows and UI overlay.
///
/// `document` is the structural content of the `*.entity.json` file, kept
/// as an ordered JSON object and never reinterpreted. Only `info.title` is
/// read out of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityDefinition {
    /// Absolute path of the backing file; `None` until first save
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<PathBuf>,
    #[serde(default)]
    pub hub_ui: HubUiData,
    #[serde(default)]
    pub input_flows: Vec<FlowDefinition>,
    #[serde(default)]
    pub harmonize_flows: Vec<FlowDefinition>,
    #[serde(flatten)]
    pub document: Map<String, Value>,
}

impl EntityDefinition {
    /// Bare record for a legacy entity, known only by its directory name
    pub fn named(title: &str) -> Self {
        let mut entity = Self::from_document(Map::new());
        entity.set_title(title);
        entity
    }

    fn from_document(document: Map<String, Value>) -> Self {
        Self {
            filename: None,
            hub_ui: HubUiData::default(),
            input_flows: Vec::new(),
            harmonize_flows: Vec::new(),
            document,
        }
    }

    /// Build a record from the contents of a definition file
    pub fn from_json(path: &Path, node: Value) -> Result<Self, serde_json::Error> {
        let Value::Object(document) = node else {
            return Err(serde_json::Error::custom(
                "entity definition must be a JSON object",
            ));
        };
        let has_title = document
            .get(INFO_KEY)
            .and_then(|info| info.get(TITLE_KEY))
            .map_or(false, Value::is_string);
        if !has_title {
            return Err(serde_json::Error::custom(
                "entity definition has no string info.title",
            ));
        }

        let mut entity = Self::from_document(document);
        entity.filename = Some(path.to_path_buf());
        Ok(entity)
    }

    /// Current-format structural document, without flows, UI data or filename
    pub fn to_json(&self) -> Value {
        Value::Object(self.document.clone())
    }

    pub fn name(&self) -> &str {
        self.document
            .get(INFO_KEY)
            .and_then(|info| info.get(TITLE_KEY))
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Set `info.title`, creating the `info` block when it is missing or not an object
    pub fn set_title(&mut self, title: &str) {
        let info = self
            .document
            .entry(INFO_KEY)
            .or_insert_with(|| Value::Object(Map::new()));
        if !info.is_object() {
            *info = Value::Object(Map::new());
        }
        if let Value::Object(info) = info {
            info.insert(TITLE_KEY.to_string(), Value::String(title.to_string()));
        }
    }

    pub fn info(&self) -> Option<&Value> {
        self.document.get(INFO_KEY)
    }

    /// Opaque structural schema, if the document has one
    pub fn definitions(&self) -> Option<&Value> {
        self.document.get(DEFINITIONS_KEY)
    }

    pub fn set_definitions(&mut self, definitions: Value) {
        self.document.insert(DEFINITIONS_KEY.to_string(), definitions);
    }
}

/// Input model for creating a new entity together with its initial flows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEntity {
    pub info: InfoType,
    #[serde(default)]
    pub input_flows: Vec<NewFlow>,
    #[serde(default)]
    pub harmonize_flows: Vec<NewFlow>,
}

impl NewEntity {
    pub fn new(title: &str) -> Self {
        Self {
            info: InfoType::new(title),
            input_flows: Vec::new(),
            harmonize_flows: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.info.title
    }

    /// Skeleton definition written for a freshly created entity
    pub fn to_entity(&self) -> EntityDefinition {
        let mut info = Map::new();
        info.insert(TITLE_KEY.to_string(), Value::String(self.info.title.clone()));
        info.extend(self.info.extra.clone());

        let mut document = Map::new();
        document.insert(INFO_KEY.to_string(), Value::Object(info));
        EntityDefinition::from_document(document)
    }
}
