//! API handlers.

pub mod api_keys;
pub mod health;
pub mod packages;

use axum::http::HeaderMap;

use crate::error::{AppError, Result};

/// Identity of the session user, injected by the fronting identity proxy.
///
/// Session handling itself (login, OAuth) terminates before the registry;
/// handlers only trust this header from the internal hop.
pub const USER_ID_HEADER: &str = "x-registry-user-id";

/// Extract the authenticated user's id from the proxy-provided header.
pub fn session_user(headers: &HeaderMap) -> Result<String> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::Unauthorized("Not logged in".into()))
}

/// Extract the API key secret from the `Authorization: Bearer` header.
pub fn bearer_api_key(headers: &HeaderMap) -> Result<String> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer ").or_else(|| v.strip_prefix("bearer ")))
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::Unauthorized("API key required".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_api_key_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_static("Bearer secret-123"),
        );
        assert_eq!(bearer_api_key(&headers).unwrap(), "secret-123");
    }

    #[test]
    fn test_bearer_api_key_missing() {
        let headers = HeaderMap::new();
        assert!(matches!(
            bearer_api_key(&headers),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_session_user_requires_header() {
        let mut headers = HeaderMap::new();
        assert!(session_user(&headers).is_err());

        headers.insert(USER_ID_HEADER, HeaderValue::from_static("42"));
        assert_eq!(session_user(&headers).unwrap(), "42");
    }
}
