use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Presentation-only metadata for one entity, stored in the shared layout file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HubUiData(pub Value);

impl HubUiData {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn is_empty(&self) -> bool {
        match &self.0 {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            _ => false,
        }
    }

    pub fn to_json(&self) -> Value {
        self.0.clone()
    }
}

impl Default for HubUiData {
    fn default() -> Self {
        Self(Value::Object(serde_json::Map::new()))
    }
}

impl From<Value> for HubUiData {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
