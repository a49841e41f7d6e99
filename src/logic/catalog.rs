use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

use crate::logic::flow_linker::FlowLinker;
use crate::model::{
    check_name, EntityDefinition, EntityFormat, EnvironmentConfig, FlowDefinition, FlowType,
    NewEntity, NewFlow,
};
use crate::store::entity_files::{path_exists, EntityFileStore};
use crate::store::traits::{DirectoryWatcher, FlowLister, Scaffolder};
use crate::store::ui_layout::UiLayoutStore;

/// Entity and flow CRUD over the project directory.
///
/// Combines the definition files, the shared UI layout and the flow directories
/// into one view. The layout is picked per call from the environment's server
/// version: legacy servers only get directory names and flows, never UI data.
#[derive(Clone)]
pub struct EntityCatalog {
    files: EntityFileStore,
    ui: UiLayoutStore,
    linker: FlowLinker,
    scaffolder: Arc<dyn Scaffolder>,
}

impl EntityCatalog {
    pub fn new(
        lister: Arc<dyn FlowLister>,
        scaffolder: Arc<dyn Scaffolder>,
        watcher: Arc<dyn DirectoryWatcher>,
    ) -> Self {
        Self {
            files: EntityFileStore::new(watcher),
            ui: UiLayoutStore::new(),
            linker: FlowLinker::new(lister),
            scaffolder,
        }
    }

    pub fn files(&self) -> &EntityFileStore {
        &self.files
    }

    pub async fn get_entities(&self, env: &EnvironmentConfig) -> Result<Vec<EntityDefinition>> {
        match env.format() {
            EntityFormat::Legacy => self.get_legacy_entities(env).await,
            EntityFormat::Current => self.get_current_entities(env).await,
        }
    }

    async fn get_legacy_entities(&self, env: &EnvironmentConfig) -> Result<Vec<EntityDefinition>> {
        let mut entities = self.files.list_legacy(env).await?;
        for entity in &mut entities {
            let dir_name = entity.name().to_string();
            self.linker.attach(env, entity, &dir_name).await?;
        }
        Ok(entities)
    }

    async fn get_current_entities(&self, env: &EnvironmentConfig) -> Result<Vec<EntityDefinition>> {
        let ui_data = self.ui.load_all(env).await?;
        let mut entities = Vec::new();

        for listing in self.files.list_current(env).await? {
            // Unreadable files were already logged by the store
            for mut entity in listing.definitions.into_iter().flatten() {
                entity.hub_ui = ui_data.get(entity.name()).cloned().unwrap_or_default();
                self.linker.attach(env, &mut entity, &listing.dir_name).await?;
                entities.push(entity);
            }
        }

        Ok(entities)
    }

    pub async fn get_entity(
        &self,
        env: &EnvironmentConfig,
        name: &str,
    ) -> Result<Option<EntityDefinition>> {
        let entities = self.get_entities(env).await?;
        Ok(entities.into_iter().find(|entity| entity.name() == name))
    }

    /// Scaffold the entity and every flow named in the template, then read it back
    pub async fn create_entity(
        &self,
        env: &EnvironmentConfig,
        template: &NewEntity,
    ) -> Result<Option<EntityDefinition>> {
        let name = check_name(template.name())?;
        self.scaffolder
            .create_entity(&env.project_dir, name)
            .await
            .with_context(|| format!("Failed to scaffold entity '{}'", name))?;

        let flows = template
            .input_flows
            .iter()
            .map(|flow| (FlowType::Input, flow))
            .chain(template.harmonize_flows.iter().map(|flow| (FlowType::Harmonize, flow)));
        for (flow_type, flow) in flows {
            self.scaffolder
                .create_flow(&env.project_dir, name, flow_type, flow)
                .await
                .with_context(|| {
                    format!("Failed to scaffold {} flow '{}'", flow_type, flow.flow_name)
                })?;
        }

        // The current layout needs a definition file before the entity is listed
        if env.format() == EntityFormat::Current && self.get_entity(env, name).await?.is_none() {
            self.files.save(env, template.to_entity()).await?;
        }

        self.get_entity(env, name).await
    }

    pub async fn save_entity(
        &self,
        env: &EnvironmentConfig,
        entity: EntityDefinition,
    ) -> Result<EntityDefinition> {
        self.files.save(env, entity).await
    }

    pub async fn save_entity_ui(&self, env: &EnvironmentConfig, entity: &EntityDefinition) -> Result<()> {
        self.ui.save_one(env, entity).await
    }

    pub async fn save_all_ui(&self, env: &EnvironmentConfig, entities: &[EntityDefinition]) -> Result<()> {
        self.ui.save_all(env, entities).await
    }

    pub async fn delete_entity(&self, env: &EnvironmentConfig, title: &str) -> Result<()> {
        self.files.delete(env, title).await
    }

    pub async fn get_flow(
        &self,
        env: &EnvironmentConfig,
        entity_name: &str,
        flow_type: FlowType,
        flow_name: &str,
    ) -> Result<Option<FlowDefinition>> {
        let Some(entity) = self.get_entity(env, entity_name).await? else {
            return Ok(None);
        };

        let flows = match flow_type {
            FlowType::Input => entity.input_flows,
            FlowType::Harmonize => entity.harmonize_flows,
        };
        Ok(flows.into_iter().find(|flow| flow.flow_name == flow_name))
    }

    /// Scaffold a flow under an existing entity; `None` when the entity is unknown
    pub async fn create_flow(
        &self,
        env: &EnvironmentConfig,
        entity_name: &str,
        flow_type: FlowType,
        flow: &NewFlow,
    ) -> Result<Option<FlowDefinition>> {
        check_name(&flow.flow_name)?;
        if self.get_entity(env, entity_name).await?.is_none() {
            return Ok(None);
        }

        self.scaffolder
            .create_flow(&env.project_dir, entity_name, flow_type, flow)
            .await
            .with_context(|| format!("Failed to scaffold {} flow '{}'", flow_type, flow.flow_name))?;

        self.get_flow(env, entity_name, flow_type, &flow.flow_name).await
    }

    pub async fn delete_flow(
        &self,
        env: &EnvironmentConfig,
        entity_name: &str,
        flow_type: FlowType,
        flow_name: &str,
    ) -> Result<()> {
        let dir = self.flow_dir(env, entity_name, flow_type, flow_name)?;
        if !path_exists(&dir).await? {
            return Ok(());
        }

        tokio::fs::remove_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to delete flow directory {}", dir.display()))?;
        log::info!("Deleted {} flow '{}' of '{}'", flow_type, flow_name, entity_name);
        Ok(())
    }

    /// Where a flow lives on disk; both names must be single path segments
    pub fn flow_dir(
        &self,
        env: &EnvironmentConfig,
        entity_name: &str,
        flow_type: FlowType,
        flow_name: &str,
    ) -> Result<PathBuf> {
        check_name(entity_name)?;
        check_name(flow_name)?;
        Ok(self
            .scaffolder
            .flow_dir(&env.project_dir, entity_name, flow_type, flow_name))
    }
}
