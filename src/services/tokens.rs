// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OAuth token lifecycle for the single Spotify account this service fronts.
//!
//! One credentials slot per process. Reads go through an `RwLock` and never
//! wait on the network; every mutation (code exchange, refresh, logout)
//! holds `update_lock`, so two refreshes can never race and the token file
//! is only ever written by one task at a time.

use crate::error::AppError;
use crate::services::spotify::{with_timeout, SpotifyApi, TokenResponse};
use crate::services::store::TokenStore;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

const MAX_TOKEN_LIFETIME_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, Clone, Default)]
struct Credentials {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_at: Option<DateTime<Utc>>,
}

impl Credentials {
    fn has_refresh_token(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// Snapshot for `/auth/status`.
#[derive(Debug, Clone, Serialize)]
pub struct AuthStatus {
    pub authorized: bool,
    pub access_token_expires_at: Option<DateTime<Utc>>,
}

/// Owns the access/refresh token pair and every operation that changes it.
pub struct TokenManager {
    api: Arc<dyn SpotifyApi>,
    store: Option<TokenStore>,
    credentials: RwLock<Credentials>,
    /// Serializes all writers (and the network calls that feed them).
    update_lock: Mutex<()>,
    call_timeout: Duration,
}

impl TokenManager {
    /// `store: None` keeps tokens in memory only.
    pub fn new(api: Arc<dyn SpotifyApi>, store: Option<TokenStore>, call_timeout: Duration) -> Self {
        Self {
            api,
            store,
            credentials: RwLock::new(Credentials::default()),
            update_lock: Mutex::new(()),
            call_timeout,
        }
    }

    pub async fn is_authorized(&self) -> bool {
        self.credentials.read().await.has_refresh_token()
    }

    pub async fn status(&self) -> AuthStatus {
        let creds = self.credentials.read().await;
        AuthStatus {
            authorized: creds.has_refresh_token(),
            access_token_expires_at: creds.expires_at,
        }
    }

    /// Spotify consent URL. Pure function of the client configuration.
    pub fn authorization_url(&self, scopes: &[&str]) -> String {
        self.api.authorize_url(scopes)
    }

    // ─── Startup ─────────────────────────────────────────────────────────────

    /// Pick up the refresh token left by a previous run.
    ///
    /// A corrupt or empty file is deleted and we start unauthenticated.
    pub async fn load_persisted(&self) {
        let Some(store) = &self.store else {
            return;
        };

        let _guard = self.update_lock.lock().await;
        match store.load().await {
            Ok(Some(refresh_token)) => {
                self.credentials.write().await.refresh_token = Some(refresh_token);
                tracing::info!(path = %store.path().display(), "Loaded refresh token");
            }
            Ok(None) => {
                tracing::info!(path = %store.path().display(), "No stored refresh token, login required");
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    path = %store.path().display(),
                    "Stored refresh token unusable, deleting"
                );
                self.delete_stored().await;
            }
        }
    }

    // ─── Authorization Code Exchange ─────────────────────────────────────────

    /// Trade the one-time code from `/callback` for tokens.
    pub async fn exchange_code(&self, code: &str) -> Result<(), AppError> {
        let access_token = {
            let _guard = self.update_lock.lock().await;

            let response = with_timeout(self.call_timeout, self.api.exchange_code(code))
                .await
                .map_err(|e| AppError::AuthExchange(e.to_string()))?;

            let access_token = response.access_token.clone();
            self.apply(response).await;
            tracing::info!("Authorization code exchanged for tokens");
            access_token
        };

        // Best effort: identify who just logged in.
        match with_timeout(self.call_timeout, self.api.current_user(&access_token)).await {
            Ok(user) => tracing::info!(
                user_id = %user.id,
                display_name = user.display_name.as_deref().unwrap_or(""),
                "Logged in Spotify user"
            ),
            Err(e) => tracing::warn!(error = %e, "Could not fetch profile after login"),
        }

        Ok(())
    }

    // ─── Token Refresh ───────────────────────────────────────────────────────

    /// Mint a new access token from the refresh token, unconditionally.
    pub async fn refresh_access_token(&self) -> Result<(), AppError> {
        let _guard = self.update_lock.lock().await;
        self.refresh_locked().await.map(|_| ())
    }

    /// Reactive refresh after `stale` was rejected by Spotify.
    ///
    /// If another task already replaced `stale` while we waited for the
    /// lock, its token is returned without calling Spotify again.
    pub async fn refresh_if_stale(&self, stale: &str) -> Result<String, AppError> {
        let _guard = self.update_lock.lock().await;

        {
            let creds = self.credentials.read().await;
            if !creds.has_refresh_token() {
                return Err(AppError::NotAuthorized);
            }
            if let Some(current) = creds.access_token.as_deref() {
                if current != stale {
                    tracing::debug!("Access token already refreshed by another task");
                    return Ok(current.to_string());
                }
            }
        }

        self.refresh_locked().await
    }

    /// Current access token, minting one first if only a refresh token is held
    /// (e.g. right after a restart).
    pub async fn access_token(&self) -> Result<String, AppError> {
        {
            let creds = self.credentials.read().await;
            if !creds.has_refresh_token() {
                return Err(AppError::NotAuthorized);
            }
            if let Some(token) = &creds.access_token {
                return Ok(token.clone());
            }
        }

        let _guard = self.update_lock.lock().await;

        // Re-check: another task may have refreshed while we waited.
        {
            let creds = self.credentials.read().await;
            if !creds.has_refresh_token() {
                return Err(AppError::NotAuthorized);
            }
            if let Some(token) = &creds.access_token {
                return Ok(token.clone());
            }
        }

        self.refresh_locked().await
    }

    /// Refresh against Spotify. Caller must hold `update_lock`.
    async fn refresh_locked(&self) -> Result<String, AppError> {
        let stored = self.credentials.read().await.refresh_token.clone();
        let refresh_token = match stored {
            Some(t) if !t.is_empty() => t,
            _ => {
                tracing::warn!("No refresh token available, user must log in");
                return Err(AppError::NotAuthorized);
            }
        };

        tracing::info!("Refreshing Spotify access token");
        match with_timeout(self.call_timeout, self.api.refresh_token(&refresh_token)).await {
            Ok(response) => {
                let access_token = response.access_token.clone();
                self.apply(response).await;
                tracing::info!("Access token refreshed");
                Ok(access_token)
            }
            Err(e) if e.is_refresh_token_rejected() => {
                tracing::error!(error = %e, "Refresh token rejected, clearing stored credentials");
                self.clear_locked().await;
                Err(AppError::TokenInvalid(e.to_string()))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh failed, keeping current credentials");
                Err(e.into())
            }
        }
    }

    /// Store a token endpoint response. Caller must hold `update_lock`.
    async fn apply(&self, response: TokenResponse) {
        // Spotify issues one-hour tokens; the clamp only guards the arithmetic.
        let lifetime = response.expires_in.min(MAX_TOKEN_LIFETIME_SECS) as i64;
        let expires_at = Utc::now() + ChronoDuration::seconds(lifetime);

        let rotated = {
            let mut creds = self.credentials.write().await;
            creds.access_token = Some(response.access_token);
            creds.expires_at = Some(expires_at);

            match response.refresh_token.filter(|t| !t.is_empty()) {
                Some(new) if creds.refresh_token.as_deref() != Some(new.as_str()) => {
                    creds.refresh_token = Some(new.clone());
                    Some(new)
                }
                _ => None,
            }
        };

        if let (Some(refresh_token), Some(store)) = (rotated, &self.store) {
            // In-memory credentials stay valid either way; a failed write only
            // means the next restart needs a fresh login.
            if let Err(e) = store.save(&refresh_token).await {
                tracing::error!(error = %e, path = %store.path().display(), "Failed to persist refresh token");
            } else {
                tracing::info!(path = %store.path().display(), "Refresh token persisted");
            }
        }
    }

    // ─── Logout / Invalidation ───────────────────────────────────────────────

    /// Forget both tokens and the stored record.
    pub async fn logout(&self) {
        let _guard = self.update_lock.lock().await;
        self.clear_locked().await;
        tracing::info!("Spotify credentials cleared on logout");
    }

    async fn clear_locked(&self) {
        *self.credentials.write().await = Credentials::default();
        self.delete_stored().await;
    }

    async fn delete_stored(&self) {
        if let Some(store) = &self.store {
            if let Err(e) = store.delete().await {
                tracing::error!(error = %e, path = %store.path().display(), "Failed to delete token file");
            }
        }
    }
}
