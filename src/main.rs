use axum::serve;
use entity_hub::api::routes::create_router;
use entity_hub::build_state;
use entity_hub::config::AppConfig;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    // Info by default, RUST_LOG overrides
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .filter_module("hyper", log::LevelFilter::Warn)
        .filter_module("reqwest", log::LevelFilter::Warn)
        .init();

    let config = AppConfig::load()?;
    let env = config.environment();
    log::info!(
        "Entity hub for project {} (server {}, {:?} entity format)",
        env.project_dir.display(),
        env.server_version,
        env.format()
    );

    let state = build_state(&config)?;
    let app = create_router().with_state(state);

    let bind_address = config.server_address();
    let listener = TcpListener::bind(&bind_address).await?;
    log::info!("Entity hub running on http://{}", bind_address);

    serve(listener, app).await?;

    Ok(())
}
