//! Application configuration loaded from environment variables.

use crate::error::{AppError, Result};
use std::env;

/// Maximum accepted upload size for a package archive (10 MiB).
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Content type required for uploaded package archives.
pub const ARCHIVE_CONTENT_TYPE: &str = "application/gzip";

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Server bind address (host:port)
    pub bind_address: String,

    /// Base directory for per-publish archive staging
    pub staging_path: String,

    /// GitHub API base URL (overridable for testing)
    pub github_api_url: String,

    /// GitHub API token used for identity lookups (optional)
    pub github_token: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| AppError::Config("DATABASE_URL not set".into()))?,
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            staging_path: env::var("REGISTRY_STAGING_PATH")
                .unwrap_or_else(|_| "/var/lib/forge-registry/staging".into()),
            github_api_url: env::var("GITHUB_API_URL")
                .unwrap_or_else(|_| "https://api.github.com".into()),
            github_token: env::var("GITHUB_ACCESS_TOKEN").ok(),
        })
    }
}
