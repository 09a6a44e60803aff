// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Wire-level tests for the reqwest Spotify client against a local stub server.

use axum::{
    extract::{Form, Query},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use spotify_status::config::Config;
use spotify_status::models::TimeRange;
use spotify_status::services::{SpotifyApi, SpotifyClient, SpotifyError};
use std::collections::HashMap;

/// base64("test_client_id:test_secret")
const EXPECTED_BASIC: &str = "Basic dGVzdF9jbGllbnRfaWQ6dGVzdF9zZWNyZXQ=";

fn bearer(headers: &HeaderMap) -> &str {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or("")
}

async fn token_endpoint(
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if auth != EXPECTED_BASIC {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "invalid_client", "error_description": "Invalid client" })),
        )
            .into_response();
    }

    match form.get("grant_type").map(String::as_str) {
        Some("authorization_code")
            if form.get("code").map(String::as_str) == Some("good-code")
                && form.get("redirect_uri").map(String::as_str)
                    == Some("http://127.0.0.1:8080/callback") =>
        {
            Json(json!({
                "access_token": "wire-access",
                "token_type": "Bearer",
                "expires_in": 3600,
                "refresh_token": "wire-refresh",
                "scope": "user-top-read"
            }))
            .into_response()
        }
        Some("refresh_token") if form.get("refresh_token").map(String::as_str) == Some("wire-refresh") => {
            Json(json!({
                "access_token": "wire-access-2",
                "token_type": "Bearer",
                "expires_in": 3600
            }))
            .into_response()
        }
        _ => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "invalid_grant", "error_description": "Invalid refresh token" })),
        )
            .into_response(),
    }
}

async fn currently_playing(headers: HeaderMap) -> Response {
    match bearer(&headers) {
        "idle" => StatusCode::NO_CONTENT.into_response(),
        "empty" => StatusCode::OK.into_response(),
        "playing" => Json(json!({
            "is_playing": true,
            "progress_ms": 5000,
            "item": {
                "type": "track",
                "id": "abc",
                "name": "Windowlicker",
                "artists": [{ "name": "Aphex Twin" }],
                "album": { "name": "Windowlicker" },
                "duration_ms": 367000
            }
        }))
        .into_response(),
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": { "status": 401, "message": "The access token expired" } })),
        )
            .into_response(),
    }
}

async fn me() -> Response {
    (StatusCode::SERVICE_UNAVAILABLE, "upstream connect error").into_response()
}

async fn top_tracks(Query(query): Query<HashMap<String, String>>) -> Json<serde_json::Value> {
    // Echo the query back through the first item's name
    let name = format!(
        "{}:{}",
        query.get("limit").cloned().unwrap_or_default(),
        query.get("time_range").cloned().unwrap_or_default()
    );
    Json(json!({
        "items": [{ "id": "t1", "name": name, "artists": [], "duration_ms": 1 }],
        "total": 1,
        "limit": 1,
        "offset": 0
    }))
}

async fn recently_played() -> Json<serde_json::Value> {
    Json(json!({ "items": "not a list" }))
}

/// Start the stub and return a client pointed at it.
async fn stub_client() -> SpotifyClient {
    let app = Router::new()
        .route("/accounts/api/token", post(token_endpoint))
        .route("/v1/me/player/currently-playing", get(currently_playing))
        .route("/v1/me", get(me))
        .route("/v1/me/top/tracks", get(top_tracks))
        .route("/v1/me/player/recently-played", get(recently_played));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    SpotifyClient::from_config(&Config::default())
        .unwrap()
        .with_base_urls(
            format!("http://{}/v1", addr),
            format!("http://{}/accounts", addr),
        )
}

#[tokio::test]
async fn test_exchange_code_sends_form_and_basic_auth() {
    let client = stub_client().await;

    let tokens = client.exchange_code("good-code").await.unwrap();

    assert_eq!(tokens.access_token, "wire-access");
    assert_eq!(tokens.refresh_token.as_deref(), Some("wire-refresh"));
    assert_eq!(tokens.expires_in, 3600);
}

#[tokio::test]
async fn test_refresh_without_rotation() {
    let client = stub_client().await;

    let tokens = client.refresh_token("wire-refresh").await.unwrap();

    assert_eq!(tokens.access_token, "wire-access-2");
    assert!(tokens.refresh_token.is_none());
}

#[tokio::test]
async fn test_rejected_refresh_token_is_classified() {
    let client = stub_client().await;

    let err = client.refresh_token("revoked").await.unwrap_err();

    assert_eq!(
        err,
        SpotifyError::Status {
            status: 400,
            message: "invalid_grant: Invalid refresh token".to_string(),
        }
    );
    assert!(err.is_refresh_token_rejected());
    assert!(!err.is_transient());
}

#[tokio::test]
async fn test_currently_playing_no_content() {
    let client = stub_client().await;

    assert!(client.currently_playing("idle").await.unwrap().is_none());
    assert!(client.currently_playing("empty").await.unwrap().is_none());
}

#[tokio::test]
async fn test_currently_playing_parses_track() {
    let client = stub_client().await;

    let current = client.currently_playing("playing").await.unwrap().unwrap();

    assert!(current.is_playing);
    assert_eq!(current.progress_ms, Some(5000));
    assert!(current.item.is_some());
}

#[tokio::test]
async fn test_expired_access_token_is_classified() {
    let client = stub_client().await;

    let err = client.currently_playing("stale").await.unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert_eq!(err.to_string(), "HTTP 401: The access token expired");
    assert!(err.is_access_token_rejected());
}

#[tokio::test]
async fn test_plain_text_5xx_is_transient() {
    let client = stub_client().await;

    let err = client.current_user("any").await.unwrap_err();

    assert_eq!(
        err,
        SpotifyError::Status {
            status: 503,
            message: "upstream connect error".to_string(),
        }
    );
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_top_tracks_sends_query() {
    let client = stub_client().await;

    let page = client
        .top_tracks("any", 25, TimeRange::LongTerm)
        .await
        .unwrap();

    assert_eq!(page.items[0].name, "25:long_term");
}

#[tokio::test]
async fn test_unexpected_body_is_decode_error() {
    let client = stub_client().await;

    let err = client.recently_played("any", 5).await.unwrap_err();

    assert!(matches!(err, SpotifyError::Decode(_)), "got {:?}", err);
    assert!(!err.is_transient());
}

#[tokio::test]
async fn test_unreachable_host_is_transport_error() {
    // Bind then drop to get a port nothing listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = SpotifyClient::from_config(&Config::default())
        .unwrap()
        .with_base_urls(format!("http://{}/v1", addr), format!("http://{}", addr));

    let err = client.current_user("any").await.unwrap_err();
    assert!(err.is_transient(), "got {:?}", err);
}
