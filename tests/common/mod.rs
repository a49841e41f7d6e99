//! Shared project fixtures and in-memory collaborators for integration tests.

#![allow(dead_code)]

use anyhow::{anyhow, Result};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use entity_hub::{
    ConnectionConfig, DirectoryFlowLister, DirectoryScaffolder, DirectoryWatcher, EntityCatalog,
    EnvironmentConfig, HubPaths, ModuleInstaller, ModuleValidationRequest, ModuleValidator,
    ResourceServices,
};

pub const CURRENT_VERSION: &str = "9.0.3";
pub const LEGACY_VERSION: &str = "8.0-7";

pub fn environment(project_dir: &Path, server_version: &str) -> EnvironmentConfig {
    EnvironmentConfig {
        project_dir: project_dir.to_path_buf(),
        server_version: server_version.to_string(),
        staging: ConnectionConfig::new("http://staging.test:8010"),
        final_db: ConnectionConfig::new("http://final.test:8011"),
        admin: ConnectionConfig::new("http://admin.test:8002"),
        paths: HubPaths::default(),
    }
}

/// Write `<entities>/<dir>/<file>.entity.json` with a minimal structural document
pub fn write_definition(env: &EnvironmentConfig, dir: &str, title: &str) -> PathBuf {
    let document = json!({
        "info": { "title": title, "version": "0.0.1" },
        "definitions": { title: { "properties": { "id": { "datatype": "string" } } } }
    });
    write_raw_definition(env, dir, title, &document.to_string())
}

pub fn write_raw_definition(env: &EnvironmentConfig, dir: &str, file: &str, contents: &str) -> PathBuf {
    let dir = env.entity_dir(dir).unwrap();
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(format!("{}.entity.json", file));
    std::fs::write(&path, contents).unwrap();
    path
}

pub fn write_ui_layout(env: &EnvironmentConfig, layout: &Value) {
    let file = env.ui_layout_file();
    std::fs::create_dir_all(file.parent().unwrap()).unwrap();
    std::fs::write(file, serde_json::to_string_pretty(layout).unwrap()).unwrap();
}

/// Create `<entities>/<entity>/<flowType>/<flow>` without a properties file
pub fn create_flow_dir(env: &EnvironmentConfig, entity: &str, flow_type: &str, flow: &str) {
    std::fs::create_dir_all(env.entity_dir(entity).unwrap().join(flow_type).join(flow)).unwrap();
}

pub fn catalog(watcher: Arc<RecordingWatcher>) -> EntityCatalog {
    EntityCatalog::new(
        Arc::new(DirectoryFlowLister),
        Arc::new(DirectoryScaffolder),
        watcher,
    )
}

#[derive(Default)]
pub struct RecordingWatcher {
    pub unwatched: Mutex<Vec<PathBuf>>,
}

impl DirectoryWatcher for RecordingWatcher {
    fn unwatch(&self, path: &Path) {
        self.unwatched.lock().unwrap().push(path.to_path_buf());
    }
}

#[derive(Debug, Clone)]
pub struct ResourceCall {
    pub url: String,
    pub resource: String,
    pub body: Value,
}

/// Answers every resource call with a fixed reply and records the request
pub struct FakeResources {
    reply: std::result::Result<Vec<String>, String>,
    pub calls: Mutex<Vec<ResourceCall>>,
}

impl FakeResources {
    pub fn replying(items: &[&str]) -> Self {
        Self {
            reply: Ok(items.iter().map(|item| item.to_string()).collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<ResourceCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ResourceServices for FakeResources {
    async fn post(
        &self,
        connection: &ConnectionConfig,
        resource: &str,
        body: &Value,
    ) -> Result<Vec<String>> {
        self.calls.lock().unwrap().push(ResourceCall {
            url: connection.url.clone(),
            resource: resource.to_string(),
            body: body.clone(),
        });
        self.reply.clone().map_err(|message| anyhow!(message))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Installation {
    pub url: String,
    pub file_name: String,
    pub contents: String,
}

/// Records what was deployed; fails every install when `rejecting`
#[derive(Default)]
pub struct RecordingInstaller {
    rejecting: bool,
    pub installed: Mutex<Vec<Installation>>,
}

impl RecordingInstaller {
    pub fn rejecting() -> Self {
        Self {
            rejecting: true,
            installed: Mutex::new(Vec::new()),
        }
    }

    pub fn installed(&self) -> Vec<Installation> {
        self.installed.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ModuleInstaller for RecordingInstaller {
    async fn install_query_options(&self, connection: &ConnectionConfig, file: &Path) -> Result<()> {
        if self.rejecting {
            return Err(anyhow!("server rejected {}", file.display()));
        }
        let contents = tokio::fs::read_to_string(file).await?;
        self.installed.lock().unwrap().push(Installation {
            url: connection.url.clone(),
            file_name: file.file_name().unwrap().to_string_lossy().into_owned(),
            contents,
        });
        Ok(())
    }
}

/// Accepts every module and echoes the request back
#[derive(Default)]
pub struct EchoValidator {
    pub requests: Mutex<Vec<ModuleValidationRequest>>,
}

#[async_trait::async_trait]
impl ModuleValidator for EchoValidator {
    async fn validate_user_module(
        &self,
        _connection: &ConnectionConfig,
        request: &ModuleValidationRequest,
    ) -> Result<Value> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(json!({
            "errors": {},
            "module": request.module_name,
            "type": request.module_type.as_str()
        }))
    }
}
