use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::model::{
    check_within, EntityDefinition, EnvironmentConfig, PathError, ENTITY_FILE_EXTENSION,
};
use crate::store::traits::DirectoryWatcher;

/// Failure to load a single entity definition file
#[derive(Debug, Error)]
pub enum EntityFileError {
    #[error("failed to read entity definition {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed entity definition {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// All definition files found in one entity directory
#[derive(Debug)]
pub struct EntityListing {
    /// Directory name, used as the flow context for every definition inside it
    pub dir_name: String,
    pub definitions: Vec<Result<EntityDefinition, EntityFileError>>,
}

/// Reads and writes entity definition files under `plugins/entities`
#[derive(Clone)]
pub struct EntityFileStore {
    watcher: Arc<dyn DirectoryWatcher>,
}

impl EntityFileStore {
    pub fn new(watcher: Arc<dyn DirectoryWatcher>) -> Self {
        Self { watcher }
    }

    /// Legacy layout: one bare entity per directory name
    pub async fn list_legacy(&self, env: &EnvironmentConfig) -> Result<Vec<EntityDefinition>> {
        let names = list_direct_folders(&env.entities_dir()).await?;
        Ok(names
            .iter()
            .map(|name| EntityDefinition::named(name))
            .collect())
    }

    /// Current layout: every `*.entity.json` file of every entity directory
    pub async fn list_current(&self, env: &EnvironmentConfig) -> Result<Vec<EntityListing>> {
        let entities_dir = env.entities_dir();
        let mut listings = Vec::new();

        for dir_name in list_direct_folders(&entities_dir).await? {
            let mut definitions = Vec::new();
            for path in definition_files(&entities_dir.join(&dir_name)).await? {
                let definition = read_document(&path).await.and_then(|node| {
                    EntityDefinition::from_json(&path, node).map_err(|source| {
                        EntityFileError::Parse {
                            path: path.clone(),
                            source,
                        }
                    })
                });
                if let Err(e) = &definition {
                    log::warn!("Skipping entity definition: {}", e);
                }
                definitions.push(definition);
            }
            listings.push(EntityListing {
                dir_name,
                definitions,
            });
        }

        Ok(listings)
    }

    /// Unparsed structural documents of every definition file
    pub async fn list_raw(&self, env: &EnvironmentConfig) -> Result<Vec<Value>> {
        let entities_dir = env.entities_dir();
        let mut documents = Vec::new();

        for dir_name in list_direct_folders(&entities_dir).await? {
            for path in definition_files(&entities_dir.join(&dir_name)).await? {
                documents.push(read_document(&path).await?);
            }
        }

        Ok(documents)
    }

    /// Write the structural document, deriving the file name from the title if needed.
    ///
    /// An explicit filename must point at a definition file below the entities directory.
    pub async fn save(
        &self,
        env: &EnvironmentConfig,
        mut entity: EntityDefinition,
    ) -> Result<EntityDefinition> {
        let filename = match &entity.filename {
            Some(filename) => {
                check_within(&env.entities_dir(), filename)?;
                if !filename.to_string_lossy().ends_with(ENTITY_FILE_EXTENSION) {
                    return Err(PathError::NotDefinitionFile(filename.clone()).into());
                }
                filename.clone()
            }
            None => {
                let title = entity.name().to_string();
                let dir = env.entity_dir(&title)?;
                tokio::fs::create_dir_all(&dir)
                    .await
                    .with_context(|| format!("Failed to create entity directory {}", dir.display()))?;
                dir.join(format!("{}{}", title, ENTITY_FILE_EXTENSION))
            }
        };

        let json = serde_json::to_string_pretty(&entity.to_json())
            .context("Failed to serialize entity definition")?;
        tokio::fs::write(&filename, json)
            .await
            .with_context(|| format!("Failed to write entity definition {}", filename.display()))?;

        log::info!("Saved entity '{}' to {}", entity.name(), filename.display());
        entity.filename = Some(filename);
        Ok(entity)
    }

    /// Remove an entity directory; absent directories are left alone
    pub async fn delete(&self, env: &EnvironmentConfig, title: &str) -> Result<()> {
        let dir = env.entity_dir(title)?;
        if !path_exists(&dir).await? {
            return Ok(());
        }

        if let Some(parent) = dir.parent() {
            self.watcher.unwatch(parent);
        }
        tokio::fs::remove_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to delete entity directory {}", dir.display()))?;

        log::info!("Deleted entity '{}'", title);
        Ok(())
    }
}

/// Names of the immediate subdirectories, sorted; a missing directory has none
pub async fn list_direct_folders(dir: &Path) -> Result<Vec<String>> {
    if !path_exists(dir).await? {
        return Ok(Vec::new());
    }

    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("Failed to list {}", dir.display()))?;
    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();

    Ok(names)
}

/// Existence check that reports stat failures instead of treating them as absence
pub async fn path_exists(path: &Path) -> Result<bool> {
    tokio::fs::try_exists(path)
        .await
        .with_context(|| format!("Failed to check {}", path.display()))
}

async fn definition_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("Failed to list {}", dir.display()))?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        if name.to_string_lossy().ends_with(ENTITY_FILE_EXTENSION) && entry.file_type().await?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();

    Ok(files)
}

async fn read_document(path: &Path) -> Result<Value, EntityFileError> {
    let contents = tokio::fs::read(path)
        .await
        .map_err(|source| EntityFileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    serde_json::from_slice(&contents).map_err(|source| EntityFileError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
