// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Spotify OAuth authentication routes.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::services::spotify::SPOTIFY_SCOPES;
use crate::services::AuthStatus;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/login", get(login))
        .route("/callback", get(callback))
        .route("/auth/status", get(auth_status))
        .route("/logout", post(logout))
}

/// Plain acknowledgement body for the auth endpoints.
#[derive(Debug, Serialize)]
pub struct AuthMessage {
    pub success: bool,
    pub message: String,
}

impl AuthMessage {
    fn ok(message: &str) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.to_string(),
        })
    }
}

#[derive(Deserialize)]
pub struct LoginParams {
    /// Send the user through the consent screen even if already connected.
    #[serde(default)]
    force: bool,
}

/// Start OAuth flow - redirect to Spotify authorization (302).
async fn login(State(state): State<Arc<AppState>>, Query(params): Query<LoginParams>) -> Response {
    if !params.force && state.tokens.is_authorized().await {
        return AuthMessage::ok("Already connected to Spotify").into_response();
    }

    let auth_url = state.tokens.authorization_url(SPOTIFY_SCOPES);
    tracing::info!(
        client_id = %state.config.spotify_client_id,
        force = params.force,
        "Starting OAuth flow, redirecting to Spotify"
    );

    (StatusCode::FOUND, [(header::LOCATION, auth_url)]).into_response()
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    /// Set by Spotify when the user declines consent
    #[serde(default)]
    error: Option<String>,
}

/// OAuth callback - exchange code for tokens.
async fn callback(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CallbackParams>,
) -> Result<Json<AuthMessage>> {
    if let Some(error) = params.error {
        tracing::warn!(error = %error, "OAuth error from Spotify");
        return Err(AppError::BadRequest(format!(
            "Spotify authorization failed: {}",
            error
        )));
    }

    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing authorization code".to_string()))?;

    tracing::info!("Exchanging authorization code for tokens");
    state.tokens.exchange_code(&code).await?;

    Ok(AuthMessage::ok(
        "Authentication successful. Tokens stored. You can now use Spotify API endpoints.",
    ))
}

/// Whether an account is connected and when the current access token lapses.
async fn auth_status(State(state): State<Arc<AppState>>) -> Json<AuthStatus> {
    Json(state.tokens.status().await)
}

/// Disconnect the Spotify account and forget its tokens.
async fn logout(State(state): State<Arc<AppState>>) -> Json<AuthMessage> {
    state.tokens.logout().await;
    AuthMessage::ok("Logged out. Visit /login to connect again.")
}
