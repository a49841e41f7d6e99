use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::logic::GenerationSettings;
use crate::model::{ConnectionConfig, EnvironmentConfig, HubPaths};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub project: ProjectConfig,
    pub connections: ConnectionsConfig,
    pub generation: GenerationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub dir: PathBuf,
    pub server_version: String,
    #[serde(default)]
    pub paths: HubPaths,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionsConfig {
    pub staging: ConnectionConfig,
    #[serde(rename = "final")]
    pub final_db: ConnectionConfig,
    pub admin: ConnectionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub module_pool_size: usize,
    pub shutdown_wait_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            server_version: "9.0".to_string(),
            paths: HubPaths::default(),
        }
    }
}

impl Default for ConnectionsConfig {
    fn default() -> Self {
        Self {
            staging: ConnectionConfig::new("http://localhost:8010"),
            final_db: ConnectionConfig::new("http://localhost:8011"),
            admin: ConnectionConfig::new("http://localhost:8002"),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            module_pool_size: 16,
            shutdown_wait_secs: 60 * 10,
            request_timeout_secs: 120,
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, an optional `config` file and `HUB__*` environment variables
    pub fn load() -> anyhow::Result<Self> {
        let mut config = config::Config::builder();

        // Add default configuration
        config = config.add_source(config::Config::try_from(&AppConfig::default())?);

        // Add config file if it exists
        config = config.add_source(config::File::with_name("config").required(false));

        // e.g. HUB__PROJECT__SERVER_VERSION=8.0-7
        config = config.add_source(
            config::Environment::with_prefix("HUB")
                .prefix_separator("__")
                .separator("__"),
        );

        let config = config.build()?;
        let app_config: AppConfig = config.try_deserialize()?;

        Ok(app_config)
    }

    /// The environment every entity operation runs against
    pub fn environment(&self) -> EnvironmentConfig {
        EnvironmentConfig {
            project_dir: self.project.dir.clone(),
            server_version: self.project.server_version.clone(),
            staging: self.connections.staging.clone(),
            final_db: self.connections.final_db.clone(),
            admin: self.connections.admin.clone(),
            paths: self.project.paths.clone(),
        }
    }

    pub fn generation_settings(&self) -> GenerationSettings {
        GenerationSettings {
            module_pool_size: self.generation.module_pool_size,
            shutdown_wait: Duration::from_secs(self.generation.shutdown_wait_secs),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.generation.request_timeout_secs)
    }

    /// Get the server bind address
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
