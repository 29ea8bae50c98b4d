//! Forge Registry - Main Entry Point

use std::sync::Arc;

use forge_registry::{
    api::{routes, AppState},
    config::Config,
    db,
    error::Result,
    services::{
        api_key_service::ApiKeyService, identity_service::GithubIdentityResolver,
        package_service::PackageService,
    },
    store::postgres::PgStore,
    telemetry,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    telemetry::init_tracing();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Starting Forge Registry");

    // Connect to database
    let db_pool = db::create_pool(&config.database_url).await?;
    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("./migrations").run(&db_pool).await?;
    tracing::info!("Database migrations complete");

    // Wire up stores and services
    let store = Arc::new(PgStore::new(db_pool.clone()));
    let api_keys = ApiKeyService::new(store.clone());
    let identity = Arc::new(GithubIdentityResolver::new(
        config.github_api_url.clone(),
        config.github_token.clone(),
    ));
    let packages = Arc::new(PackageService::new(
        store,
        api_keys.clone(),
        identity,
        config.staging_path.clone(),
    ));

    let state = Arc::new(AppState {
        config: config.clone(),
        db: Some(db_pool),
        packages,
        api_keys,
    });

    let router = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    tracing::info!("Listening on {}", config.bind_address);
    axum::serve(listener, router).await?;

    Ok(())
}
