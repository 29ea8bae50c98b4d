//! Shared response DTOs for API handlers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::services::package_service::{DownloadEntry, VersionSummary};

/// Query parameters for package listings.
#[derive(Debug, Deserialize)]
pub struct ListPackagesQuery {
    pub limit: Option<i64>,
}

/// Query parameters for download listings.
#[derive(Debug, Deserialize)]
pub struct ListDownloadsQuery {
    /// "asc" or "desc" (default) by download timestamp.
    pub sort_by: Option<String>,
}

/// Query parameters for the download endpoint.
#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    /// When true, yanked versions may still be fetched.
    #[serde(default)]
    pub yanked: bool,
}

/// Aggregate download count for a package.
#[derive(Debug, Serialize)]
pub struct DownloadsCountResponse {
    pub count: i64,
}

/// Download timestamps of one version, newest first.
#[derive(Debug, Serialize)]
pub struct DownloadHistoryResponse {
    pub download_dates: Vec<DateTime<Utc>>,
}

/// All download records plus the grand total.
#[derive(Debug, Serialize)]
pub struct AllDownloadsResponse {
    pub data: Vec<DownloadEntry>,
    pub total: i64,
}

/// Latest-version lookup response.
#[derive(Debug, Serialize)]
pub struct LatestVersionResponse {
    pub latest_version: VersionSummary,
}
