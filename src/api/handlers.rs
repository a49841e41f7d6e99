use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    Json as RequestJson,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::logic::{ArtifactGenerator, EntityCatalog, GenerationReport, PluginEditor};
use crate::model::{
    check_within, EntityDefinition, EnvironmentConfig, FlowDefinition, FlowType, NewEntity,
    NewFlow, PathError, PluginModel,
};

/// Everything the entity endpoints need, resolved once at startup
#[derive(Clone)]
pub struct HubState {
    pub env: EnvironmentConfig,
    pub catalog: EntityCatalog,
    pub generator: ArtifactGenerator,
    pub plugins: PluginEditor,
}

pub type AppState = Arc<HubState>;

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

/// Simple health check endpoint
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: &str) -> Self {
        Self {
            error: message.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub total: usize,
}

/// Names or paths that leave the project are the client's fault; anything else is ours
fn internal_error(e: anyhow::Error) -> (StatusCode, Json<ErrorResponse>) {
    if let Some(path_error) = e.downcast_ref::<PathError>() {
        log::warn!("Rejected request: {}", path_error);
        return bad_request(&path_error.to_string());
    }
    log::error!("Request failed: {:#}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(&format!("{:#}", e))),
    )
}

fn bad_request(message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(message)))
}

fn not_found(message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (StatusCode::NOT_FOUND, Json(ErrorResponse::new(message)))
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

pub async fn list_entities(State(state): State<AppState>) -> ApiResult<ListResponse<EntityDefinition>> {
    let entities = state
        .catalog
        .get_entities(&state.env)
        .await
        .map_err(internal_error)?;
    let total = entities.len();
    Ok(Json(ListResponse {
        items: entities,
        total,
    }))
}

pub async fn get_entity(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<EntityDefinition> {
    match state.catalog.get_entity(&state.env, &name).await {
        Ok(Some(entity)) => Ok(Json(entity)),
        Ok(None) => Err(not_found(&format!("Entity '{}' not found", name))),
        Err(e) => Err(internal_error(e)),
    }
}

pub async fn create_entity(
    State(state): State<AppState>,
    RequestJson(template): RequestJson<NewEntity>,
) -> ApiResult<EntityDefinition> {
    match state.catalog.create_entity(&state.env, &template).await {
        Ok(Some(entity)) => Ok(Json(entity)),
        Ok(None) => Err(not_found(&format!(
            "Entity '{}' was scaffolded but could not be read back",
            template.name()
        ))),
        Err(e) => Err(internal_error(e)),
    }
}

pub async fn save_entity(
    State(state): State<AppState>,
    Path(name): Path<String>,
    RequestJson(mut entity): RequestJson<EntityDefinition>,
) -> ApiResult<EntityDefinition> {
    let title = entity.name().to_string();
    if title.is_empty() {
        entity.set_title(&name);
    } else if title != name {
        return Err(bad_request(&format!(
            "Entity title '{}' does not match '{}'",
            title, name
        )));
    }
    state
        .catalog
        .save_entity(&state.env, entity)
        .await
        .map(Json)
        .map_err(internal_error)
}

pub async fn delete_entity(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    state
        .catalog
        .delete_entity(&state.env, &name)
        .await
        .map_err(internal_error)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn save_entity_ui(
    State(state): State<AppState>,
    Path(name): Path<String>,
    RequestJson(ui): RequestJson<Value>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    let mut entity = EntityDefinition::named(&name);
    entity.hub_ui = ui.into();
    state
        .catalog
        .save_entity_ui(&state.env, &entity)
        .await
        .map_err(internal_error)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn save_all_ui(
    State(state): State<AppState>,
    RequestJson(entities): RequestJson<Vec<EntityDefinition>>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    state
        .catalog
        .save_all_ui(&state.env, &entities)
        .await
        .map_err(internal_error)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_flow(
    State(state): State<AppState>,
    Path((name, flow_type, flow_name)): Path<(String, FlowType, String)>,
) -> ApiResult<FlowDefinition> {
    match state
        .catalog
        .get_flow(&state.env, &name, flow_type, &flow_name)
        .await
    {
        Ok(Some(flow)) => Ok(Json(flow)),
        Ok(None) => Err(not_found(&format!(
            "Flow '{}' of type {} not found for entity '{}'",
            flow_name, flow_type, name
        ))),
        Err(e) => Err(internal_error(e)),
    }
}

pub async fn create_flow(
    State(state): State<AppState>,
    Path((name, flow_type)): Path<(String, FlowType)>,
    RequestJson(flow): RequestJson<NewFlow>,
) -> ApiResult<FlowDefinition> {
    match state
        .catalog
        .create_flow(&state.env, &name, flow_type, &flow)
        .await
    {
        Ok(Some(flow)) => Ok(Json(flow)),
        Ok(None) => Err(not_found(&format!("Entity '{}' not found", name))),
        Err(e) => Err(internal_error(e)),
    }
}

pub async fn delete_flow(
    State(state): State<AppState>,
    Path((name, flow_type, flow_name)): Path<(String, FlowType, String)>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    state
        .catalog
        .delete_flow(&state.env, &name, flow_type, &flow_name)
        .await
        .map_err(internal_error)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn validate_plugin(
    State(state): State<AppState>,
    Path((name, _flow_type, flow_name)): Path<(String, FlowType, String)>,
    RequestJson(plugin): RequestJson<PluginModel>,
) -> ApiResult<Value> {
    state
        .plugins
        .validate(&state.env, &name, &flow_name, &plugin)
        .await
        .map(Json)
        .map_err(internal_error)
}

pub async fn save_plugin(
    State(state): State<AppState>,
    Path((name, flow_type, flow_name)): Path<(String, FlowType, String)>,
    RequestJson(plugin): RequestJson<PluginModel>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    // Only files of the addressed flow may be overwritten
    let flow_dir = state
        .catalog
        .flow_dir(&state.env, &name, flow_type, &flow_name)
        .map_err(internal_error)?;
    check_within(&flow_dir, &plugin.plugin_path).map_err(|e| bad_request(&e.to_string()))?;

    state.plugins.save(&plugin).await.map_err(internal_error)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn generate_search_options(State(state): State<AppState>) -> Json<GenerationReport> {
    let outcome = state.generator.save_search_options(&state.env).await;
    Json(GenerationReport::from(&outcome))
}

pub async fn generate_indexes(State(state): State<AppState>) -> Json<GenerationReport> {
    let outcome = state.generator.save_db_indexes(&state.env).await;
    Json(GenerationReport::from(&outcome))
}
