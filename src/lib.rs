pub mod api;
pub mod config;
pub mod logic;
pub mod model;
pub mod store;

use std::sync::Arc;

// Export API types
pub use api::handlers;
pub use api::routes;

pub use logic::{
    ArtifactGenerator, EntityCatalog, FlowLinker, GenerationError, GenerationOutcome,
    GenerationReport, GenerationSettings, ModuleLoadPool, PluginEditor,
};

// Export all model types
pub use model::*;

// Export store types
pub use store::{
    DirectoryFlowLister, DirectoryScaffolder, DirectoryWatcher, EntityFileError, EntityFileStore,
    FlowLister, ModuleInstaller, ModuleValidator, NoopWatcher, ResourceServices, RestClient,
    Scaffolder, UiLayoutStore,
};

/// Wire the default collaborators: project directories on disk and the server REST API
pub fn build_state(config: &config::AppConfig) -> anyhow::Result<api::AppState> {
    let rest = Arc::new(RestClient::new(config.request_timeout())?);
    let catalog = EntityCatalog::new(
        Arc::new(DirectoryFlowLister),
        Arc::new(DirectoryScaffolder),
        Arc::new(NoopWatcher),
    );
    let generator = ArtifactGenerator::new(
        catalog.files().clone(),
        rest.clone(),
        rest.clone(),
        config.generation_settings(),
    );

    Ok(Arc::new(api::HubState {
        env: config.environment(),
        catalog,
        generator,
        plugins: PluginEditor::new(rest),
    }))
}
