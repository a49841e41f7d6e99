use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::logic::module_pool::{ModuleLoadPool, DEFAULT_POOL_SIZE, DEFAULT_SHUTDOWN_WAIT};
use crate::model::{ConnectionConfig, EnvironmentConfig};
use crate::store::entity_files::EntityFileStore;
use crate::store::traits::{ModuleInstaller, ResourceServices};

pub const SEARCH_OPTIONS_RESOURCE: &str = "search-options-generator";
pub const DB_CONFIGS_RESOURCE: &str = "db-configs";
pub const FINAL_DATABASE_FILE: &str = "final-database.json";
pub const STAGING_DATABASE_FILE: &str = "staging-database.json";

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("unable to read entity definitions: {0}")]
    Entities(String),

    #[error("resource '{resource}' failed: {message}")]
    Remote { resource: String, message: String },

    #[error("resource '{0}' returned no result")]
    EmptyResponse(String),

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("module deployment failed: {0}")]
    Deploy(String),
}

/// What a generation entry point actually did
#[derive(Debug)]
pub enum GenerationOutcome {
    /// Artifacts were written to these files
    Written(Vec<PathBuf>),
    /// Nothing to generate; no request was made and no file touched
    Skipped,
    /// Generation failed; existing artifacts were left as they were
    Failed(GenerationError),
}

impl GenerationOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, GenerationOutcome::Written(_))
    }

    pub fn files(&self) -> &[PathBuf] {
        match self {
            GenerationOutcome::Written(files) => files,
            _ => &[],
        }
    }
}

/// Serializable view of an outcome for API responses
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    pub status: String,
    pub files: Vec<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&GenerationOutcome> for GenerationReport {
    fn from(outcome: &GenerationOutcome) -> Self {
        match outcome {
            GenerationOutcome::Written(files) => Self {
                status: "written".to_string(),
                files: files.clone(),
                error: None,
            },
            GenerationOutcome::Skipped => Self {
                status: "skipped".to_string(),
                files: Vec::new(),
                error: None,
            },
            GenerationOutcome::Failed(e) => Self {
                status: "failed".to_string(),
                files: Vec::new(),
                error: Some(e.to_string()),
            },
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GenerationSettings {
    pub module_pool_size: usize,
    pub shutdown_wait: Duration,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            module_pool_size: DEFAULT_POOL_SIZE,
            shutdown_wait: DEFAULT_SHUTDOWN_WAIT,
        }
    }
}

/// Regenerates the server-side search options and index configuration from
/// the raw entity definitions.
///
/// Neither entry point returns an error: failures are logged and reported as
/// `GenerationOutcome::Failed` so the editor keeps running.
#[derive(Clone)]
pub struct ArtifactGenerator {
    files: EntityFileStore,
    resources: Arc<dyn ResourceServices>,
    installer: Arc<dyn ModuleInstaller>,
    settings: GenerationSettings,
}

impl ArtifactGenerator {
    pub fn new(
        files: EntityFileStore,
        resources: Arc<dyn ResourceServices>,
        installer: Arc<dyn ModuleInstaller>,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            files,
            resources,
            installer,
            settings,
        }
    }

    /// Structural documents only, no flows or UI metadata
    pub async fn raw_entities(&self, env: &EnvironmentConfig) -> Result<Vec<Value>, GenerationError> {
        self.files
            .list_raw(env)
            .await
            .map_err(|e| GenerationError::Entities(format!("{:#}", e)))
    }

    pub async fn save_search_options(&self, env: &EnvironmentConfig) -> GenerationOutcome {
        match self.generate_search_options(env).await {
            Ok(outcome) => {
                log::info!("Search options generation: {:?}", outcome);
                outcome
            }
            Err(e) => {
                log::error!("Search options generation failed: {}", e);
                GenerationOutcome::Failed(e)
            }
        }
    }

    pub async fn save_db_indexes(&self, env: &EnvironmentConfig) -> GenerationOutcome {
        match self.generate_db_indexes(env).await {
            Ok(outcome) => {
                log::info!("Database index generation: {:?}", outcome);
                outcome
            }
            Err(e) => {
                log::error!("Database index generation failed: {}", e);
                GenerationOutcome::Failed(e)
            }
        }
    }

    async fn generate_search_options(
        &self,
        env: &EnvironmentConfig,
    ) -> Result<GenerationOutcome, GenerationError> {
        // Forget previous deployments so every module is pushed again
        let timestamps = env.modules_deploy_timestamp_file();
        match tokio::fs::remove_file(&timestamps).await {
            Ok(()) => log::debug!("Removed {}", timestamps.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(GenerationError::Io {
                    path: timestamps,
                    source,
                })
            }
        }

        let entities = self.raw_entities(env).await?;
        if entities.is_empty() {
            return Ok(GenerationOutcome::Skipped);
        }

        let options = self
            .generate(&env.staging, SEARCH_OPTIONS_RESOURCE, entities)
            .await?;
        let staged = StagedArtifact::write(&env.search_options_path(), &options).await?;

        let mut pool = ModuleLoadPool::new(self.settings.module_pool_size, self.settings.shutdown_wait);
        let installer = Arc::clone(&self.installer);
        let connection = env.final_db.clone();
        let options_file = staged.staged.clone();
        pool.submit(async move {
            installer
                .install_query_options(&connection, &options_file)
                .await
        });
        if let Err(e) = pool.shutdown().await {
            staged.discard().await;
            return Err(GenerationError::Deploy(format!("{:#}", e)));
        }

        let file = staged.commit().await?;
        Ok(GenerationOutcome::Written(vec![file]))
    }

    async fn generate_db_indexes(
        &self,
        env: &EnvironmentConfig,
    ) -> Result<GenerationOutcome, GenerationError> {
        let entities = self.raw_entities(env).await?;
        let indexes = self
            .generate(&env.final_db, DB_CONFIGS_RESOURCE, entities)
            .await?;

        // Both databases get the same index configuration
        let dir = env.entity_database_dir();
        let final_db = StagedArtifact::write(&dir.join(FINAL_DATABASE_FILE), &indexes).await?;
        let staging_db = match StagedArtifact::write(&dir.join(STAGING_DATABASE_FILE), &indexes).await {
            Ok(staged) => staged,
            Err(e) => {
                final_db.discard().await;
                return Err(e);
            }
        };

        let final_file = final_db.commit().await?;
        let staging_file = staging_db.commit().await?;
        Ok(GenerationOutcome::Written(vec![final_file, staging_file]))
    }

    /// POST the entity array to a resource and take the first result item
    async fn generate(
        &self,
        connection: &ConnectionConfig,
        resource: &str,
        entities: Vec<Value>,
    ) -> Result<String, GenerationError> {
        let body = Value::Array(entities);
        let items = self
            .resources
            .post(connection, resource, &body)
            .await
            .map_err(|e| GenerationError::Remote {
                resource: resource.to_string(),
                message: format!("{:#}", e),
            })?;

        items
            .into_iter()
            .next()
            .ok_or_else(|| GenerationError::EmptyResponse(resource.to_string()))
    }
}

const STAGING_DIR: &str = ".staging";

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> GenerationError {
    let path = path.to_path_buf();
    move |source| GenerationError::Io { path, source }
}

/// Generated content written beside its destination and moved into place only
/// once every step of the run has succeeded.
///
/// The staged copy keeps the destination's file name, so it can be deployed
/// under the same module name before it replaces anything.
struct StagedArtifact {
    staged: PathBuf,
    target: PathBuf,
}

impl StagedArtifact {
    async fn write(target: &Path, contents: &str) -> Result<Self, GenerationError> {
        let (Some(dir), Some(name)) = (target.parent(), target.file_name()) else {
            return Err(GenerationError::Io {
                path: target.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a file path"),
            });
        };

        let staging_dir = dir.join(STAGING_DIR);
        tokio::fs::create_dir_all(&staging_dir)
            .await
            .map_err(io_error(&staging_dir))?;
        let staged = staging_dir.join(name);
        tokio::fs::write(&staged, contents)
            .await
            .map_err(io_error(&staged))?;

        Ok(Self {
            staged,
            target: target.to_path_buf(),
        })
    }

    async fn commit(self) -> Result<PathBuf, GenerationError> {
        tokio::fs::rename(&self.staged, &self.target)
            .await
            .map_err(|source| GenerationError::Io {
                path: self.target.clone(),
                source,
            })?;
        self.remove_staging_dir().await;
        Ok(self.target)
    }

    async fn discard(self) {
        if let Err(e) = tokio::fs::remove_file(&self.staged).await {
            log::warn!("Could not remove {}: {}", self.staged.display(), e);
        }
        self.remove_staging_dir().await;
    }

    /// Only succeeds once the last staged file is gone
    async fn remove_staging_dir(&self) {
        if let Some(dir) = self.staged.parent() {
            if let Err(e) = tokio::fs::remove_dir(dir).await {
                log::debug!("Keeping {}: {}", dir.display(), e);
            }
        }
    }
}
