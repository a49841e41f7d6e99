use anyhow::{Context, Result};
use serde_json::Value;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;

use crate::model::{EnvironmentConfig, ModuleType, ModuleValidationRequest, PluginModel};
use crate::store::traits::ModuleValidator;

const SCRIPT_EXTENSIONS: [&str; 2] = [".sjs", ".xqy"];

/// Validates and saves flow plugin sources, addressed by their explicit path
#[derive(Clone)]
pub struct PluginEditor {
    validator: Arc<dyn ModuleValidator>,
}

impl PluginEditor {
    pub fn new(validator: Arc<dyn ModuleValidator>) -> Self {
        Self { validator }
    }

    pub async fn validate(
        &self,
        env: &EnvironmentConfig,
        entity_name: &str,
        flow_name: &str,
        plugin: &PluginModel,
    ) -> Result<Value> {
        let request = ModuleValidationRequest {
            entity_name: entity_name.to_string(),
            flow_name: flow_name.to_string(),
            module_name: module_name(plugin),
            module_type: module_type(plugin),
            contents: plugin.file_contents.clone(),
        };
        self.validator
            .validate_user_module(&env.admin, &request)
            .await
            .with_context(|| format!("Failed to validate plugin {}", plugin.plugin_path.display()))
    }

    /// Overwrite the existing plugin file with the edited contents
    pub async fn save(&self, plugin: &PluginModel) -> Result<()> {
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&plugin.plugin_path)
            .await
            .with_context(|| format!("Failed to open plugin {}", plugin.plugin_path.display()))?;
        file.write_all(plugin.file_contents.as_bytes()).await?;
        file.flush().await?;

        log::info!("Saved plugin {}", plugin.plugin_path.display());
        Ok(())
    }
}

/// File name of the plugin with script extensions removed
pub fn module_name(plugin: &PluginModel) -> String {
    let declared = plugin
        .plugin_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| plugin.plugin_type.clone());
    SCRIPT_EXTENSIONS
        .iter()
        .fold(declared, |name, ext| name.replace(ext, ""))
}

pub fn module_type(plugin: &PluginModel) -> ModuleType {
    if plugin.plugin_type.ends_with("sjs") {
        ModuleType::Javascript
    } else {
        ModuleType::Xquery
    }
}
