use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

pub const PLUGINS_DIR: &str = "plugins";
pub const ENTITIES_DIR: &str = "entities";
pub const ENTITY_FILE_EXTENSION: &str = ".entity.json";
pub const UI_LAYOUT_FILE: &str = "entities.layout.json";

/// A client-supplied name or path that would escape its project directory
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("'{0}' is not a valid name")]
    InvalidName(String),

    #[error("{path} is not inside {base}")]
    OutsideDirectory { path: PathBuf, base: PathBuf },

    #[error("{0} is not an entity definition file")]
    NotDefinitionFile(PathBuf),
}

/// Accept a name only if it is exactly one normal path segment
pub fn check_name(name: &str) -> Result<&str, PathError> {
    let invalid = || PathError::InvalidName(name.to_string());
    if name.is_empty() || name.contains(['\\', '\0']) || name.chars().any(std::path::is_separator) {
        return Err(invalid());
    }
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(name),
        _ => Err(invalid()),
    }
}

/// `path` must lie strictly below `base` without any `..` or `.` hops
pub fn check_within(base: &Path, path: &Path) -> Result<(), PathError> {
    let outside = || PathError::OutsideDirectory {
        path: path.to_path_buf(),
        base: base.to_path_buf(),
    };
    let relative = path.strip_prefix(base).map_err(|_| outside())?;
    let mut components = relative.components().peekable();
    if components.peek().is_none() || !components.all(|c| matches!(c, Component::Normal(_))) {
        return Err(outside());
    }
    Ok(())
}

/// Entity definition layout, chosen from the target server's version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityFormat {
    /// Directory-only entities, no structural payload and no UI overlay
    Legacy,
    /// `*.entity.json` files with UI overlay
    Current,
}

impl EntityFormat {
    pub fn for_version(server_version: &str) -> Self {
        if server_version.trim().starts_with('8') {
            EntityFormat::Legacy
        } else {
            EntityFormat::Current
        }
    }
}

/// Connection settings for one server endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub url: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl ConnectionConfig {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            username: None,
            password: None,
        }
    }
}

/// Project-relative locations of the hub's configuration artifacts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubPaths {
    pub user_config_dir: PathBuf,
    pub entity_config_dir: PathBuf,
    pub search_options_file: String,
    pub entity_database_dir: PathBuf,
    pub modules_deploy_timestamp_file: PathBuf,
}

impl Default for HubPaths {
    fn default() -> Self {
        Self {
            user_config_dir: PathBuf::from("user-config"),
            entity_config_dir: PathBuf::from("entity-config"),
            search_options_file: "final-entity-options.xml".to_string(),
            entity_database_dir: PathBuf::from("user-config").join("databases"),
            modules_deploy_timestamp_file: PathBuf::from(".tmp")
                .join("hub-modules-deploy-timestamps.properties"),
        }
    }
}

/// The resolved project/environment every entity operation runs against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    pub project_dir: PathBuf,
    pub server_version: String,
    pub staging: ConnectionConfig,
    #[serde(rename = "final")]
    pub final_db: ConnectionConfig,
    pub admin: ConnectionConfig,
    #[serde(default)]
    pub paths: HubPaths,
}

impl EnvironmentConfig {
    pub fn format(&self) -> EntityFormat {
        EntityFormat::for_version(&self.server_version)
    }

    pub fn entities_dir(&self) -> PathBuf {
        self.project_dir.join(PLUGINS_DIR).join(ENTITIES_DIR)
    }

    /// Directory of one entity; names that are not a single path segment are rejected
    pub fn entity_dir(&self, entity_name: &str) -> Result<PathBuf, PathError> {
        Ok(self.entities_dir().join(check_name(entity_name)?))
    }

    pub fn ui_layout_file(&self) -> PathBuf {
        self.resolve(&self.paths.user_config_dir).join(UI_LAYOUT_FILE)
    }

    pub fn search_options_path(&self) -> PathBuf {
        self.resolve(&self.paths.entity_config_dir)
            .join(&self.paths.search_options_file)
    }

    pub fn entity_database_dir(&self) -> PathBuf {
        self.resolve(&self.paths.entity_database_dir)
    }

    pub fn modules_deploy_timestamp_file(&self) -> PathBuf {
        self.resolve(&self.paths.modules_deploy_timestamp_file)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_dir.join(path)
        }
    }
}
