//! Publisher identity resolution.
//!
//! The registry snapshots a human-readable display name onto each published
//! version. Resolution goes through the `IdentityResolver` trait so the core
//! never depends on a specific identity provider.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{AppError, Result};

/// Resolves an owner id to a display name.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve_display_name(&self, user_id: &str) -> Result<String>;
}

/// GitHub-backed resolver: looks up the user's login via the REST API.
pub struct GithubIdentityResolver {
    client: reqwest::Client,
    api_base: String,
    token: Option<String>,
}

#[derive(Deserialize)]
struct GithubUser {
    login: String,
}

impl GithubIdentityResolver {
    pub fn new(api_base: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.into(),
            token,
        }
    }
}

#[async_trait]
impl IdentityResolver for GithubIdentityResolver {
    async fn resolve_display_name(&self, user_id: &str) -> Result<String> {
        let url = format!("{}/user/{}", self.api_base.trim_end_matches('/'), user_id);

        let mut request = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github.v3+json")
            .header("User-Agent", "forge-registry");
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("token {}", token));
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::IdentityLookup(format!("GitHub request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::IdentityLookup(format!(
                "GitHub API error: {} for user {}",
                response.status(),
                user_id
            )));
        }

        let user: GithubUser = response
            .json()
            .await
            .map_err(|e| AppError::IdentityLookup(format!("Malformed GitHub response: {}", e)))?;

        Ok(user.login)
    }
}
