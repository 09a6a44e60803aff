// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Spotify Web API client and the passthrough service built on it.
//!
//! Handles:
//! - Authorization URL construction and the OAuth token endpoint
//! - The handful of Web API reads this service exposes
//! - Classification of provider errors (expired access token, rejected
//!   refresh token, transient failure)
//! - One reactive refresh-and-retry per request

use crate::config::Config;
use crate::error::AppError;
use crate::models::{CurrentlyPlaying, CursorPaging, Paging, PlayHistory, PlaybackStatus};
use crate::models::{TimeRange, Track, UserProfile};
use crate::services::tokens::TokenManager;
use async_trait::async_trait;
use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

pub const SPOTIFY_ACCOUNTS_BASE: &str = "https://accounts.spotify.com";
pub const SPOTIFY_API_BASE: &str = "https://api.spotify.com/v1";

/// Scopes requested at login. Covers every endpoint this service proxies.
pub const SPOTIFY_SCOPES: &[&str] = &[
    "user-read-currently-playing",
    "user-read-playback-state",
    "user-read-recently-played",
    "user-top-read",
];

/// Largest page Spotify serves for top items and recently played.
pub const MAX_PAGE_LIMIT: u32 = 50;

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Failure talking to Spotify.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpotifyError {
    #[error("request to Spotify timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl SpotifyError {
    pub fn status(&self) -> Option<u16> {
        match self {
            SpotifyError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The access token was refused by the Web API and a refresh may help.
    ///
    /// Uses the HTTP status when there is one; only transport errors fall
    /// back to scanning the message. A decode error follows a 2xx, so the
    /// token was accepted.
    pub fn is_access_token_rejected(&self) -> bool {
        match self {
            SpotifyError::Status { status, .. } => *status == 401,
            SpotifyError::Timeout | SpotifyError::Decode(_) => false,
            SpotifyError::Transport(msg) => {
                let msg = msg.to_lowercase();
                msg.contains("invalid") || msg.contains("expired") || msg.contains("401")
            }
        }
    }

    /// The token endpoint refused the refresh token (revoked, expired or
    /// issued to another client). Retrying will not help.
    pub fn is_refresh_token_rejected(&self) -> bool {
        match self {
            SpotifyError::Status { status, .. } => *status == 400 || *status == 401,
            SpotifyError::Timeout | SpotifyError::Decode(_) => false,
            SpotifyError::Transport(msg) => {
                let msg = msg.to_lowercase();
                msg.contains("invalid_client")
                    || msg.contains("invalid client")
                    || msg.contains("invalid_grant")
            }
        }
    }

    /// Worth one more attempt: timeouts, connection failures, rate limits, 5xx.
    pub fn is_transient(&self) -> bool {
        match self {
            SpotifyError::Timeout | SpotifyError::Transport(_) => true,
            SpotifyError::Status { status, .. } => *status == 429 || *status >= 500,
            SpotifyError::Decode(_) => false,
        }
    }
}

impl From<reqwest::Error> for SpotifyError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SpotifyError::Timeout
        } else if err.is_decode() {
            SpotifyError::Decode(err.to_string())
        } else {
            SpotifyError::Transport(err.to_string())
        }
    }
}

/// Run a Spotify call under a deadline; an elapsed deadline is a [`SpotifyError::Timeout`].
pub async fn with_timeout<T, F>(timeout: Duration, fut: F) -> Result<T, SpotifyError>
where
    F: Future<Output = Result<T, SpotifyError>>,
{
    tokio::time::timeout(timeout, fut)
        .await
        .unwrap_or(Err(SpotifyError::Timeout))
}

/// Pull a human-readable message out of either Spotify error body shape:
/// `{"error": {"status": 401, "message": "..."}}` from the Web API, or
/// `{"error": "invalid_grant", "error_description": "..."}` from the accounts service.
fn provider_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ApiErrorBody {
        error: ApiErrorObject,
    }
    #[derive(Deserialize)]
    struct ApiErrorObject {
        message: String,
    }
    #[derive(Deserialize)]
    struct AuthErrorBody {
        error: String,
        #[serde(default)]
        error_description: Option<String>,
    }

    if let Ok(parsed) = serde_json::from_str::<ApiErrorBody>(body) {
        return parsed.error.message;
    }
    if let Ok(parsed) = serde_json::from_str::<AuthErrorBody>(body) {
        return match parsed.error_description {
            Some(description) => format!("{}: {}", parsed.error, description),
            None => parsed.error,
        };
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        "empty response body".to_string()
    } else {
        trimmed.chars().take(200).collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SpotifyApi - the external collaborator seam
// ─────────────────────────────────────────────────────────────────────────────

/// Token endpoint response (code exchange and refresh).
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    pub expires_in: u64,
    /// Always present on code exchange; only present on refresh when rotated
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// Operations this service needs from Spotify.
#[async_trait]
pub trait SpotifyApi: Send + Sync {
    /// URL of Spotify's consent page for the given scopes.
    fn authorize_url(&self, scopes: &[&str]) -> String;

    async fn exchange_code(&self, code: &str) -> Result<TokenResponse, SpotifyError>;

    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenResponse, SpotifyError>;

    async fn current_user(&self, access_token: &str) -> Result<UserProfile, SpotifyError>;

    /// `Ok(None)` when nothing is playing (204 No Content).
    async fn currently_playing(
        &self,
        access_token: &str,
    ) -> Result<Option<CurrentlyPlaying>, SpotifyError>;

    async fn top_tracks(
        &self,
        access_token: &str,
        limit: u32,
        time_range: TimeRange,
    ) -> Result<Paging<Track>, SpotifyError>;

    async fn recently_played(
        &self,
        access_token: &str,
        limit: u32,
    ) -> Result<CursorPaging<PlayHistory>, SpotifyError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// SpotifyClient - reqwest implementation
// ─────────────────────────────────────────────────────────────────────────────

/// Spotify Web API client.
#[derive(Clone)]
pub struct SpotifyClient {
    http: reqwest::Client,
    api_base: String,
    accounts_base: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

impl SpotifyClient {
    /// Create a new Spotify client with OAuth credentials.
    pub fn new(
        client_id: String,
        client_secret: String,
        redirect_uri: String,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_base: SPOTIFY_API_BASE.to_string(),
            accounts_base: SPOTIFY_ACCOUNTS_BASE.to_string(),
            client_id,
            client_secret,
            redirect_uri,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        Self::new(
            config.spotify_client_id.clone(),
            config.spotify_client_secret.clone(),
            config.spotify_redirect_uri.clone(),
            config.spotify_timeout,
        )
    }

    /// Point the client at other hosts (local stand-ins in tests).
    pub fn with_base_urls(
        mut self,
        api_base: impl Into<String>,
        accounts_base: impl Into<String>,
    ) -> Self {
        self.api_base = api_base.into();
        self.accounts_base = accounts_base.into();
        self
    }

    /// POST a form to the accounts service token endpoint.
    async fn token_request(&self, form: &[(&str, &str)]) -> Result<TokenResponse, SpotifyError> {
        let response = self
            .http
            .post(format!("{}/api/token", self.accounts_base))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(form)
            .send()
            .await?;

        Self::check_response_json(response).await
    }

    /// Generic authenticated GET with JSON response.
    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        access_token: &str,
        query: &[(&str, String)],
    ) -> Result<T, SpotifyError> {
        let response = self
            .http
            .get(format!("{}{}", self.api_base, path))
            .bearer_auth(access_token)
            .query(query)
            .send()
            .await?;

        Self::check_response_json(response).await
    }

    /// Turn a non-success status into [`SpotifyError::Status`].
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, SpotifyError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if status.as_u16() == 429 {
            tracing::warn!("Spotify rate limit hit (429)");
        }

        Err(SpotifyError::Status {
            status: status.as_u16(),
            message: provider_message(&body),
        })
    }

    /// Check response and parse JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        response: reqwest::Response,
    ) -> Result<T, SpotifyError> {
        let response = Self::check_status(response).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| SpotifyError::Decode(e.to_string()))
    }
}

#[async_trait]
impl SpotifyApi for SpotifyClient {
    fn authorize_url(&self, scopes: &[&str]) -> String {
        format!(
            "{}/authorize?\
             client_id={}&\
             response_type=code&\
             redirect_uri={}&\
             scope={}&\
             show_dialog=true",
            self.accounts_base,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(&scopes.join(" ")),
        )
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenResponse, SpotifyError> {
        self.token_request(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
        ])
        .await
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenResponse, SpotifyError> {
        self.token_request(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .await
    }

    async fn current_user(&self, access_token: &str) -> Result<UserProfile, SpotifyError> {
        self.get_json("/me", access_token, &[]).await
    }

    async fn currently_playing(
        &self,
        access_token: &str,
    ) -> Result<Option<CurrentlyPlaying>, SpotifyError> {
        let response = self
            .http
            .get(format!("{}/me/player/currently-playing", self.api_base))
            .bearer_auth(access_token)
            .send()
            .await?;

        let response = Self::check_status(response).await?;
        if response.status() == reqwest::StatusCode::NO_CONTENT {
            return Ok(None);
        }

        // Spotify occasionally answers 200 with an empty body instead of 204.
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str(&body)
            .map(Some)
            .map_err(|e| SpotifyError::Decode(e.to_string()))
    }

    async fn top_tracks(
        &self,
        access_token: &str,
        limit: u32,
        time_range: TimeRange,
    ) -> Result<Paging<Track>, SpotifyError> {
        self.get_json(
            "/me/top/tracks",
            access_token,
            &[
                ("limit", limit.to_string()),
                ("time_range", time_range.as_str().to_string()),
            ],
        )
        .await
    }

    async fn recently_played(
        &self,
        access_token: &str,
        limit: u32,
    ) -> Result<CursorPaging<PlayHistory>, SpotifyError> {
        self.get_json(
            "/me/player/recently-played",
            access_token,
            &[("limit", limit.to_string())],
        )
        .await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SpotifyService - passthrough calls with reactive token refresh
// ─────────────────────────────────────────────────────────────────────────────

/// High-level service that runs Web API reads with the current access token.
///
/// Every read goes through [`SpotifyService::call`], which owns the
/// reactive refresh policy:
/// - access token rejected (401): one coalesced refresh, then one retry
/// - transient failure (timeout, 5xx, 429): one retry with the same token
/// - anything else: no retry
#[derive(Clone)]
pub struct SpotifyService {
    api: Arc<dyn SpotifyApi>,
    tokens: Arc<TokenManager>,
    call_timeout: Duration,
}

impl SpotifyService {
    pub fn new(api: Arc<dyn SpotifyApi>, tokens: Arc<TokenManager>, call_timeout: Duration) -> Self {
        Self {
            api,
            tokens,
            call_timeout,
        }
    }

    /// Run `op` with a valid access token, refreshing and retrying at most once.
    async fn call<T, F, Fut>(&self, name: &'static str, op: F) -> Result<T, AppError>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<T, SpotifyError>>,
    {
        let token = self.tokens.access_token().await?;

        let err = match with_timeout(self.call_timeout, op(token.clone())).await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        let retry_token = if err.is_access_token_rejected() {
            tracing::info!(op = name, error = %err, "Access token rejected, refreshing before retry");
            self.tokens.refresh_if_stale(&token).await?
        } else if err.is_transient() {
            tracing::warn!(op = name, error = %err, "Transient Spotify failure, retrying once");
            token
        } else {
            return Err(err.into());
        };

        with_timeout(self.call_timeout, op(retry_token))
            .await
            .map_err(|err| {
                tracing::warn!(op = name, error = %err, "Spotify call failed after retry");
                AppError::from(err)
            })
    }

    /// Current playback, degraded to a "no playback"/"unavailable" status on
    /// any provider failure. Only login-required errors propagate.
    pub async fn currently_playing(&self) -> Result<PlaybackStatus, AppError> {
        let api = &self.api;
        let result = self
            .call("currently_playing", |token| async move {
                api.currently_playing(&token).await
            })
            .await;

        match result {
            Ok(Some(current)) => Ok(current.into()),
            Ok(None) => Ok(PlaybackStatus::no_playback()),
            Err(e) if e.requires_login() => Err(e),
            Err(e) => {
                tracing::warn!(error = %e, "Reporting playback as unavailable");
                Ok(PlaybackStatus::unavailable())
            }
        }
    }

    pub async fn current_user(&self) -> Result<UserProfile, AppError> {
        let api = &self.api;
        self.call("current_user", |token| async move {
            api.current_user(&token).await
        })
        .await
    }

    pub async fn top_tracks(
        &self,
        limit: u32,
        time_range: TimeRange,
    ) -> Result<Paging<Track>, AppError> {
        let api = &self.api;
        self.call("top_tracks", |token| async move {
            api.top_tracks(&token, limit, time_range).await
        })
        .await
    }

    pub async fn recently_played(&self, limit: u32) -> Result<CursorPaging<PlayHistory>, AppError> {
        let api = &self.api;
        self.call("recently_played", |token| async move {
            api.recently_played(&token, limit).await
        })
        .await
    }
}
