//! API module - HTTP handlers and routing.

pub mod dto;
pub mod handlers;
pub mod routes;

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::services::api_key_service::ApiKeyService;
use crate::services::package_service::PackageService;

/// Application state shared across handlers
pub struct AppState {
    pub config: Config,
    /// Present when running against Postgres; absent for in-memory runs.
    pub db: Option<PgPool>,
    pub packages: Arc<PackageService>,
    pub api_keys: ApiKeyService,
}

/// Shared application state wrapped in Arc
pub type SharedState = Arc<AppState>;
