//! API key authentication for the power-up backend.

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::Response,
};

/// Who may call the API and from where.
#[derive(Clone, Debug, Default)]
pub struct SecurityConfig {
    /// Bearer key every protected route requires (`SPRINT_TRACKER_API_KEY`).
    /// `None` leaves the API open, which is only sensible on localhost.
    pub api_key: Option<String>,
    /// Origins allowed by CORS (`SPRINT_TRACKER_CORS_ORIGINS`, comma-separated).
    /// The power-up iframe is served from the host, e.g. `https://trello.com`.
    pub cors_origins: Option<Vec<String>>,
}

impl SecurityConfig {
    pub fn from_env() -> Self {
        let api_key = std::env::var("SPRINT_TRACKER_API_KEY")
            .ok()
            .filter(|key| !key.is_empty());

        let cors_origins = std::env::var("SPRINT_TRACKER_CORS_ORIGINS")
            .ok()
            .map(|raw| parse_origins(&raw))
            .filter(|origins| !origins.is_empty());

        Self {
            api_key,
            cors_origins,
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn with_api_key(key: impl Into<String>) -> Self {
        Self {
            api_key: Some(key.into()),
            cors_origins: None,
        }
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(String::from)
        .collect()
}

/// The token of an `Authorization: Bearer <token>` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

/// Reject requests without the configured bearer key.
pub async fn auth_middleware(
    State(config): State<SecurityConfig>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(expected) = config.api_key.as_deref() else {
        return Ok(next.run(request).await);
    };

    match bearer_token(request.headers()) {
        Some(token) if token == expected => Ok(next.run(request).await),
        Some(_) => {
            tracing::warn!("Rejected {} {}: invalid API key", request.method(), request.uri());
            Err(StatusCode::UNAUTHORIZED)
        }
        None => {
            tracing::warn!(
                "Rejected {} {}: missing bearer token",
                request.method(),
                request.uri()
            );
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}
