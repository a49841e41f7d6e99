use axum::{
    routing::{get, post, put},
    Router,
};

use crate::api::handlers::{self, AppState};

pub fn create_router() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Entities
        .route(
            "/entities",
            get(handlers::list_entities).post(handlers::create_entity),
        )
        .route(
            "/entities/:name",
            get(handlers::get_entity)
                .put(handlers::save_entity)
                .delete(handlers::delete_entity),
        )
        .route("/entities/:name/ui", put(handlers::save_entity_ui))
        .route("/ui-layout", put(handlers::save_all_ui))
        // Flows
        .route("/entities/:name/flows/:flow_type", post(handlers::create_flow))
        .route(
            "/entities/:name/flows/:flow_type/:flow_name",
            get(handlers::get_flow).delete(handlers::delete_flow),
        )
        .route(
            "/entities/:name/flows/:flow_type/:flow_name/plugins/validate",
            post(handlers::validate_plugin),
        )
        .route(
            "/entities/:name/flows/:flow_type/:flow_name/plugins/save",
            put(handlers::save_plugin),
        )
        // Generated server artifacts
        .route(
            "/generate/search-options",
            post(handlers::generate_search_options),
        )
        .route("/generate/indexes", post(handlers::generate_indexes))
}
