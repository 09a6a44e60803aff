// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Proactive access token refresh on a fixed interval.

use crate::services::tokens::TokenManager;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Background task that keeps the access token fresh while a refresh token is held.
///
/// The first tick fires immediately, so a refresh token loaded from disk
/// yields a usable access token right at startup.
pub struct TokenRefresher {
    tokens: Arc<TokenManager>,
    interval: Duration,
}

impl TokenRefresher {
    pub fn new(tokens: Arc<TokenManager>, interval: Duration) -> Self {
        Self { tokens, interval }
    }

    /// Start the refresh loop; it exits once `shutdown` is cancelled.
    #[must_use]
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(shutdown).await })
    }

    async fn run(self, shutdown: CancellationToken) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            "Token refresh loop started"
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("Shutdown, stopping token refresh loop");
                    return;
                }
                _ = ticker.tick() => {}
            }

            // Must run to completion; the call timeout bounds it.
            self.tick().await;
        }
    }

    /// One pass: refresh if authorized. Failures are logged, never fatal.
    pub async fn tick(&self) {
        if !self.tokens.is_authorized().await {
            tracing::debug!("No refresh token available, skipping scheduled refresh");
            return;
        }

        match self.tokens.refresh_access_token().await {
            Ok(()) => tracing::info!("Access token refreshed by scheduler"),
            Err(e) if e.requires_login() => {
                tracing::warn!(error = %e, "Scheduled refresh needs a new login")
            }
            Err(e) => tracing::error!(error = %e, "Scheduled token refresh failed"),
        }
    }
}
