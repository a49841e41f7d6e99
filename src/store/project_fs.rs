use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::model::{
    check_name, CodeFormat, DataFormat, FlowDefinition, FlowType, NewFlow, ENTITIES_DIR,
    PLUGINS_DIR,
};
use crate::store::entity_files::{list_direct_folders, path_exists};
use crate::store::traits::{DirectoryWatcher, FlowLister, Scaffolder};

/// `<project>/plugins/entities/<entity>/<flowType>/<flowName>`
fn flow_path(project_dir: &Path, entity_name: &str, flow_type: FlowType, flow_name: &str) -> PathBuf {
    flow_type_dir(project_dir, entity_name, flow_type).join(flow_name)
}

fn flow_type_dir(project_dir: &Path, entity_name: &str, flow_type: FlowType) -> PathBuf {
    project_dir
        .join(PLUGINS_DIR)
        .join(ENTITIES_DIR)
        .join(entity_name)
        .join(flow_type.as_str())
}

fn properties_file(flow_dir: &Path, flow_name: &str) -> PathBuf {
    flow_dir.join(format!("{}.properties", flow_name))
}

fn parse_properties(contents: &str) -> HashMap<String, String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect()
}

/// Lists flows from the project's flow directories
#[derive(Debug, Clone, Default)]
pub struct DirectoryFlowLister;

#[async_trait::async_trait]
impl FlowLister for DirectoryFlowLister {
    async fn get_flows(
        &self,
        project_dir: &Path,
        entity_name: &str,
        flow_type: FlowType,
    ) -> Result<Vec<FlowDefinition>> {
        let type_dir = flow_type_dir(project_dir, entity_name, flow_type);
        let mut flows = Vec::new();

        for flow_name in list_direct_folders(&type_dir).await? {
            let flow_dir = type_dir.join(&flow_name);
            let mut flow = FlowDefinition::new(entity_name, &flow_name, flow_type);

            let properties = properties_file(&flow_dir, &flow_name);
            if path_exists(&properties).await? {
                let contents = tokio::fs::read_to_string(&properties)
                    .await
                    .with_context(|| format!("Failed to read {}", properties.display()))?;
                let values = parse_properties(&contents);
                if let Some(format) = values.get("codeFormat").and_then(|v| v.parse::<CodeFormat>().ok()) {
                    flow.code_format = format;
                }
                if let Some(format) = values.get("dataFormat").and_then(|v| v.parse::<DataFormat>().ok()) {
                    flow.data_format = format;
                }
                flow.use_es_model = values.get("useEsModel").map(|v| v == "true").unwrap_or(false);
            }

            flow.flow_dir = Some(flow_dir);
            flows.push(flow);
        }

        Ok(flows)
    }
}

/// Creates minimal entity and flow skeletons in the project directory
#[derive(Debug, Clone, Default)]
pub struct DirectoryScaffolder;

#[async_trait::async_trait]
impl Scaffolder for DirectoryScaffolder {
    async fn create_entity(&self, project_dir: &Path, entity_name: &str) -> Result<()> {
        check_name(entity_name)?;
        for flow_type in [FlowType::Input, FlowType::Harmonize] {
            let dir = flow_type_dir(project_dir, entity_name, flow_type);
            tokio::fs::create_dir_all(&dir)
                .await
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        log::info!("Scaffolded entity '{}'", entity_name);
        Ok(())
    }

    async fn create_flow(
        &self,
        project_dir: &Path,
        entity_name: &str,
        flow_type: FlowType,
        flow: &NewFlow,
    ) -> Result<()> {
        check_name(entity_name)?;
        check_name(&flow.flow_name)?;
        let dir = flow_path(project_dir, entity_name, flow_type, &flow.flow_name);
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create {}", dir.display()))?;

        let properties = format!(
            "codeFormat={}\ndataFormat={}\nuseEsModel={}\nmainModule=main.{}\n",
            flow.code_format.extension(),
            flow.data_format.as_str(),
            flow.use_es_model,
            flow.code_format.extension()
        );
        tokio::fs::write(properties_file(&dir, &flow.flow_name), properties).await?;

        let main_module = dir.join(format!("main.{}", flow.code_format.extension()));
        if !path_exists(&main_module).await? {
            tokio::fs::write(&main_module, "").await?;
        }

        log::info!(
            "Scaffolded {} flow '{}' for entity '{}'",
            flow_type,
            flow.flow_name,
            entity_name
        );
        Ok(())
    }

    fn flow_dir(
        &self,
        project_dir: &Path,
        entity_name: &str,
        flow_type: FlowType,
        flow_name: &str,
    ) -> PathBuf {
        flow_path(project_dir, entity_name, flow_type, flow_name)
    }
}

/// Watcher used when nothing is monitoring the project
#[derive(Debug, Clone, Default)]
pub struct NoopWatcher;

impl DirectoryWatcher for NoopWatcher {
    fn unwatch(&self, path: &Path) {
        log::debug!("Unwatch requested for {}", path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scaffolded_flows_are_listed() {
        let project = tempfile::tempdir().unwrap();
        let scaffolder = DirectoryScaffolder;

        scaffolder.create_entity(project.path(), "Order").await.unwrap();
        scaffolder
            .create_flow(
                project.path(),
                "Order",
                FlowType::Harmonize,
                &NewFlow::new("canonicalize", CodeFormat::Xqy, DataFormat::Xml),
            )
            .await
            .unwrap();

        let lister = DirectoryFlowLister;
        let input = lister
            .get_flows(project.path(), "Order", FlowType::Input)
            .await
            .unwrap();
        let harmonize = lister
            .get_flows(project.path(), "Order", FlowType::Harmonize)
            .await
            .unwrap();

        assert!(input.is_empty());
        assert_eq!(harmonize.len(), 1);
        assert_eq!(harmonize[0].flow_name, "canonicalize");
        assert_eq!(harmonize[0].code_format, CodeFormat::Xqy);
        assert_eq!(harmonize[0].data_format, DataFormat::Xml);
        assert_eq!(
            harmonize[0].flow_dir.as_deref(),
            Some(scaffolder.flow_dir(project.path(), "Order", FlowType::Harmonize, "canonicalize").as_path())
        );
        assert!(harmonize[0]
            .flow_dir
            .as_ref()
            .unwrap()
            .join("main.xqy")
            .exists());
    }

    #[tokio::test]
    async fn test_scaffolder_rejects_escaping_names() {
        let project = tempfile::tempdir().unwrap();
        let scaffolder = DirectoryScaffolder;

        assert!(scaffolder.create_entity(project.path(), "..").await.is_err());
        assert!(scaffolder
            .create_flow(
                project.path(),
                "Order",
                FlowType::Input,
                &NewFlow::new("../../../outside", CodeFormat::Sjs, DataFormat::Json),
            )
            .await
            .is_err());
        assert!(!project.path().join("outside").exists());
        assert!(!project.path().join("plugins").exists());
    }

    #[test]
    fn test_parse_properties_skips_comments() {
        let values = parse_properties("# generated\ncodeFormat = sjs\n\ndataFormat=json\n");
        assert_eq!(values.get("codeFormat").map(String::as_str), Some("sjs"));
        assert_eq!(values.get("dataFormat").map(String::as_str), Some("json"));
        assert_eq!(values.len(), 2);
    }
}
