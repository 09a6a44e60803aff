// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Spotify passthrough routes (require a connected account).

use crate::error::{AppError, Result};
use crate::models::{
    CursorPaging, Paging, PlayHistory, PlaybackStatus, TimeRange, Track, UserProfile,
};
use crate::services::spotify::MAX_PAGE_LIMIT;
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

const DEFAULT_LIMIT: u32 = 10;

/// API routes.
/// The login gate is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/currently-playing", get(get_currently_playing))
        .route("/api/me", get(get_me))
        .route("/api/top-tracks", get(get_top_tracks))
        .route("/api/recent", get(get_recently_played))
}

fn validate_limit(limit: Option<u32>) -> Result<u32> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT);
    if limit == 0 || limit > MAX_PAGE_LIMIT {
        return Err(AppError::BadRequest(format!(
            "limit must be between 1 and {}",
            MAX_PAGE_LIMIT
        )));
    }
    Ok(limit)
}

// ─── Playback ────────────────────────────────────────────────

/// What is playing right now. Provider trouble yields a status, not an error.
async fn get_currently_playing(State(state): State<Arc<AppState>>) -> Result<Json<PlaybackStatus>> {
    Ok(Json(state.spotify.currently_playing().await?))
}

// ─── User Profile ────────────────────────────────────────────

async fn get_me(State(state): State<Arc<AppState>>) -> Result<Json<UserProfile>> {
    Ok(Json(state.spotify.current_user().await?))
}

// ─── Listening History ───────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TopTracksParams {
    limit: Option<u32>,
    #[serde(default)]
    time_range: TimeRange,
}

async fn get_top_tracks(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TopTracksParams>,
) -> Result<Json<Paging<Track>>> {
    let limit = validate_limit(params.limit)?;
    Ok(Json(state.spotify.top_tracks(limit, params.time_range).await?))
}

#[derive(Debug, Deserialize)]
pub struct RecentParams {
    limit: Option<u32>,
}

async fn get_recently_played(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RecentParams>,
) -> Result<Json<CursorPaging<PlayHistory>>> {
    let limit = validate_limit(params.limit)?;
    Ok(Json(state.spotify.recently_played(limit).await?))
}
