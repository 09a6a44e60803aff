// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use crate::services::spotify::SpotifyError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

const LOGIN_HINT: &str = "Visit /login to connect a Spotify account";

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// No refresh token is available; the user has to log in.
    #[error("Spotify authorization required")]
    NotAuthorized,

    /// The authorization code could not be exchanged for tokens.
    #[error("Authorization code exchange failed: {0}")]
    AuthExchange(String),

    /// Spotify rejected the refresh token itself. Local credentials were cleared.
    #[error("Refresh token rejected by Spotify: {0}")]
    TokenInvalid(String),

    /// Network failure, timeout, rate limit or 5xx from Spotify.
    #[error("Spotify temporarily unavailable: {0}")]
    TransientProvider(String),

    #[error("Spotify API error: {0}")]
    ExternalApi(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// True when the only way forward is a fresh `/login`.
    pub fn requires_login(&self) -> bool {
        matches!(self, AppError::NotAuthorized | AppError::TokenInvalid(_))
    }
}

impl From<SpotifyError> for AppError {
    fn from(err: SpotifyError) -> Self {
        if err.is_transient() {
            AppError::TransientProvider(err.to_string())
        } else {
            AppError::ExternalApi(err.to_string())
        }
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Provider text goes to the log, never into the response body.
        let (status, error, details) = match &self {
            AppError::NotAuthorized => (
                StatusCode::UNAUTHORIZED,
                "not_authorized",
                Some(LOGIN_HINT.to_string()),
            ),
            AppError::AuthExchange(msg) => {
                tracing::error!(error = %msg, "Spotify token exchange failed");
                (StatusCode::BAD_GATEWAY, "auth_exchange_failed", None)
            }
            AppError::TokenInvalid(msg) => {
                tracing::warn!(error = %msg, "Spotify refresh token no longer valid");
                (
                    StatusCode::UNAUTHORIZED,
                    "token_invalid",
                    Some(LOGIN_HINT.to_string()),
                )
            }
            AppError::TransientProvider(msg) => {
                tracing::warn!(error = %msg, "Spotify unavailable");
                (StatusCode::SERVICE_UNAVAILABLE, "spotify_unavailable", None)
            }
            AppError::ExternalApi(msg) => {
                tracing::warn!(error = %msg, "Spotify API error");
                (StatusCode::BAD_GATEWAY, "spotify_error", None)
            }
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
