use anyhow::{anyhow, Context, Result};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::model::{EntityDefinition, EnvironmentConfig, HubUiData};
use crate::store::entity_files::path_exists;

/// The shared `entities.layout.json` document, mapping entity title to UI metadata.
///
/// Every write re-reads the whole document and only replaces the entries of the
/// entities being saved, so titles written by someone else survive.
#[derive(Debug, Clone, Default)]
pub struct UiLayoutStore;

impl UiLayoutStore {
    pub fn new() -> Self {
        Self
    }

    /// All UI metadata keyed by title; a missing file yields an empty map
    pub async fn load_all(&self, env: &EnvironmentConfig) -> Result<BTreeMap<String, HubUiData>> {
        let document = self.load_document(env).await?.unwrap_or_default();
        Ok(document
            .into_iter()
            .filter(|(_, node)| !node.is_null())
            .map(|(title, node)| (title, HubUiData::new(node)))
            .collect())
    }

    pub async fn save_one(&self, env: &EnvironmentConfig, entity: &EntityDefinition) -> Result<()> {
        self.save_all(env, std::slice::from_ref(entity)).await
    }

    pub async fn save_all(&self, env: &EnvironmentConfig, entities: &[EntityDefinition]) -> Result<()> {
        let mut document = self.load_document(env).await?.unwrap_or_default();
        for entity in entities {
            document.insert(entity.name().to_string(), entity.hub_ui.to_json());
        }

        let file = env.ui_layout_file();
        if let Some(dir) = file.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        let json = serde_json::to_string_pretty(&Value::Object(document))
            .context("Failed to serialize UI layout")?;
        tokio::fs::write(&file, json)
            .await
            .with_context(|| format!("Failed to write {}", file.display()))?;

        log::debug!("Saved UI layout for {} entities", entities.len());
        Ok(())
    }

    async fn load_document(&self, env: &EnvironmentConfig) -> Result<Option<Map<String, Value>>> {
        let file = env.ui_layout_file();
        if !path_exists(&file).await? {
            return Ok(None);
        }

        let contents = tokio::fs::read(&file)
            .await
            .with_context(|| format!("Failed to read {}", file.display()))?;
        let node: Value = serde_json::from_slice(&contents)
            .with_context(|| format!("Malformed UI layout file {}", file.display()))?;
        match node {
            Value::Object(map) => Ok(Some(map)),
            _ => Err(anyhow!(
                "UI layout file {} must contain a JSON object",
                file.display()
            )),
        }
    }
}
