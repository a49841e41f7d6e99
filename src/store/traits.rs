use crate::model::{ConnectionConfig, FlowDefinition, FlowType, ModuleValidationRequest, NewFlow};
use anyhow::Result;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Lists the flows of one type that belong to an entity
#[async_trait::async_trait]
pub trait FlowLister: Send + Sync {
    async fn get_flows(
        &self,
        project_dir: &Path,
        entity_name: &str,
        flow_type: FlowType,
    ) -> Result<Vec<FlowDefinition>>;
}

/// Creates on-disk skeletons for entities and flows
#[async_trait::async_trait]
pub trait Scaffolder: Send + Sync {
    async fn create_entity(&self, project_dir: &Path, entity_name: &str) -> Result<()>;
    async fn create_flow(
        &self,
        project_dir: &Path,
        entity_name: &str,
        flow_type: FlowType,
        flow: &NewFlow,
    ) -> Result<()>;
    /// Resolve where a flow lives without creating anything
    fn flow_dir(
        &self,
        project_dir: &Path,
        entity_name: &str,
        flow_type: FlowType,
        flow_name: &str,
    ) -> PathBuf;
}

/// File-system watcher that must release a directory before it is removed
pub trait DirectoryWatcher: Send + Sync {
    fn unwatch(&self, path: &Path);
}

/// Server-side REST resource extensions
#[async_trait::async_trait]
pub trait ResourceServices: Send + Sync {
    /// POST a JSON body to a named resource, returning the result items as text
    async fn post(
        &self,
        connection: &ConnectionConfig,
        resource: &str,
        body: &Value,
    ) -> Result<Vec<String>>;
}

/// Deploys generated modules to a server
#[async_trait::async_trait]
pub trait ModuleInstaller: Send + Sync {
    async fn install_query_options(&self, connection: &ConnectionConfig, file: &Path) -> Result<()>;
}

/// Compiles a user module on the server and reports problems
#[async_trait::async_trait]
pub trait ModuleValidator: Send + Sync {
    async fn validate_user_module(
        &self,
        connection: &ConnectionConfig,
        request: &ModuleValidationRequest,
    ) -> Result<Value>;
}
