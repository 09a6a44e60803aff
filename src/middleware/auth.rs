// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Login gate for the Spotify passthrough routes.

use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Middleware that requires a connected Spotify account.
///
/// Rejects with `not_authorized` when no refresh token is held, so handlers
/// only ever run when a token can be obtained.
pub async fn require_spotify_login(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !state.tokens.is_authorized().await {
        tracing::debug!(path = %request.uri().path(), "Rejecting request, Spotify not connected");
        return Err(AppError::NotAuthorized);
    }

    Ok(next.run(request).await)
}
