//! Package endpoints: publish, yank, queries, and downloads.

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;

use super::{bearer_api_key, session_user};
use crate::api::dto::{
    AllDownloadsResponse, DownloadHistoryResponse, DownloadQuery, DownloadsCountResponse,
    LatestVersionResponse, ListDownloadsQuery, ListPackagesQuery,
};
use crate::api::SharedState;
use crate::config::MAX_UPLOAD_BYTES;
use crate::error::Result;
use crate::services::package_service::{PackageListing, VersionDetail, VersionSummary};

/// Create package routes
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(list_packages))
        .route("/downloads", get(list_all_downloads))
        .route("/user", get(user_packages))
        .route("/:name/versions/latest", get(latest_version))
        .route("/:name/versions/all", get(all_versions))
        .route("/:name/downloads/count", get(download_count))
        .route("/:name/:version", get(get_version))
        .route("/:name/:version/download", get(download))
        .route("/:name/:version/downloads", get(download_history))
        .route("/:name/:version/publish", post(publish))
        .route("/:name/:version/yank", post(yank))
        // Leave headroom above the archive ceiling so oversized uploads reach
        // the size check and get a proper validation message.
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES * 2))
}

async fn list_packages(
    State(state): State<SharedState>,
    Query(query): Query<ListPackagesQuery>,
) -> Result<Json<Vec<PackageListing>>> {
    let listings = state.packages.list_packages(query.limit).await?;
    Ok(Json(listings))
}

async fn user_packages(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Json<Vec<PackageListing>>> {
    let user_id = session_user(&headers)?;
    let listings = state.packages.user_packages(&user_id).await?;
    Ok(Json(listings))
}

async fn latest_version(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Result<Json<LatestVersionResponse>> {
    let latest = state.packages.latest_version(&name).await?;
    Ok(Json(LatestVersionResponse {
        latest_version: latest,
    }))
}

async fn all_versions(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Result<Json<Vec<VersionSummary>>> {
    let versions = state.packages.all_versions(&name).await?;
    Ok(Json(versions))
}

async fn get_version(
    State(state): State<SharedState>,
    Path((name, version)): Path<(String, String)>,
) -> Result<Json<VersionDetail>> {
    let detail = state.packages.get_version(&name, &version).await?;
    Ok(Json(detail))
}

async fn download(
    State(state): State<SharedState>,
    Path((name, version)): Path<(String, String)>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response> {
    let payload = state
        .packages
        .download(&name, &version, query.yanked)
        .await?;

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", payload.file_name),
        )
        .header(header::CONTENT_LENGTH, payload.data.len())
        .body(Body::from(payload.data))
        .map_err(|e| crate::error::AppError::Internal(format!("Failed to build response: {}", e)))?;

    Ok(response)
}

async fn download_history(
    State(state): State<SharedState>,
    Path((name, version)): Path<(String, String)>,
) -> Result<Json<DownloadHistoryResponse>> {
    let dates = state
        .packages
        .version_download_history(&name, &version)
        .await?;
    Ok(Json(DownloadHistoryResponse {
        download_dates: dates,
    }))
}

async fn download_count(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Result<Json<DownloadsCountResponse>> {
    let count = state.packages.package_download_count(&name).await?;
    Ok(Json(DownloadsCountResponse { count }))
}

async fn list_all_downloads(
    State(state): State<SharedState>,
    Query(query): Query<ListDownloadsQuery>,
) -> Result<Json<AllDownloadsResponse>> {
    let newest_first = !matches!(query.sort_by.as_deref(), Some("asc"));
    let (data, total) = state.packages.list_all_downloads(newest_first).await?;
    Ok(Json(AllDownloadsResponse { data, total }))
}

async fn publish(
    State(state): State<SharedState>,
    Path((name, version)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode> {
    let api_key = bearer_api_key(&headers)?;
    let mime_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    state
        .packages
        .publish(&name, &version, body, &mime_type, &api_key)
        .await
        .inspect_err(|e| {
            tracing::error!(package = %name, version = %version, "Failed to publish: {}", e);
        })?;

    Ok(StatusCode::CREATED)
}

async fn yank(
    State(state): State<SharedState>,
    Path((name, version)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<impl IntoResponse> {
    let api_key = bearer_api_key(&headers)?;
    state.packages.yank(&name, &version, &api_key).await?;
    Ok(StatusCode::NO_CONTENT)
}
