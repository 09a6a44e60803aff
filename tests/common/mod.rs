// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use serde_json::json;
use spotify_status::config::Config;
use spotify_status::models::{CurrentlyPlaying, CursorPaging, Paging, PlayHistory, TimeRange};
use spotify_status::models::{Track, UserProfile};
use spotify_status::routes::create_router;
use spotify_status::services::{SpotifyApi, SpotifyError, TokenResponse};
use spotify_status::AppState;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Script<T> = Mutex<VecDeque<Result<T, SpotifyError>>>;

/// Scripted stand-in for the Spotify Web API.
///
/// Each operation pops its next scripted result; once a script is empty the
/// operation succeeds with a canned value. Every call is counted.
#[derive(Default)]
pub struct FakeSpotify {
    pub exchange: Script<TokenResponse>,
    pub refresh: Script<TokenResponse>,
    pub playing: Script<Option<CurrentlyPlaying>>,
    pub profile: Script<UserProfile>,
    pub top: Script<Paging<Track>>,
    pub recent: Script<CursorPaging<PlayHistory>>,

    pub exchange_calls: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    pub playing_calls: AtomicUsize,
    pub profile_calls: AtomicUsize,
    pub top_calls: AtomicUsize,
    pub recent_calls: AtomicUsize,

    /// Access tokens seen by Web API reads, in order.
    pub seen_tokens: Mutex<Vec<String>>,

    /// Artificial latency for refreshes and playback reads.
    pub refresh_delay: Option<Duration>,
    pub playing_delay: Option<Duration>,
}

#[allow(dead_code)]
impl FakeSpotify {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_refresh_delay(mut self, delay: Duration) -> Self {
        self.refresh_delay = Some(delay);
        self
    }

    pub fn with_playing_delay(mut self, delay: Duration) -> Self {
        self.playing_delay = Some(delay);
        self
    }

    pub fn script_exchange(&self, result: Result<TokenResponse, SpotifyError>) {
        self.exchange.lock().unwrap().push_back(result);
    }

    pub fn script_refresh(&self, result: Result<TokenResponse, SpotifyError>) {
        self.refresh.lock().unwrap().push_back(result);
    }

    pub fn script_playing(&self, result: Result<Option<CurrentlyPlaying>, SpotifyError>) {
        self.playing.lock().unwrap().push_back(result);
    }

    pub fn script_profile(&self, result: Result<UserProfile, SpotifyError>) {
        self.profile.lock().unwrap().push_back(result);
    }

    pub fn script_top(&self, result: Result<Paging<Track>, SpotifyError>) {
        self.top.lock().unwrap().push_back(result);
    }

    pub fn refreshes(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn playing_reads(&self) -> usize {
        self.playing_calls.load(Ordering::SeqCst)
    }

    fn record(&self, token: &str) {
        self.seen_tokens.lock().unwrap().push(token.to_string());
    }

    fn next<T>(script: &Script<T>, fallback: impl FnOnce() -> T) -> Result<T, SpotifyError> {
        script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(fallback()))
    }
}

#[async_trait]
impl SpotifyApi for FakeSpotify {
    fn authorize_url(&self, scopes: &[&str]) -> String {
        format!(
            "https://accounts.spotify.com/authorize?client_id=test_client_id&response_type=code&scope={}",
            scopes.join("%20")
        )
    }

    async fn exchange_code(&self, _code: &str) -> Result<TokenResponse, SpotifyError> {
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);
        Self::next(&self.exchange, || token_response("access-1", Some("refresh-1")))
    }

    async fn refresh_token(&self, _refresh_token: &str) -> Result<TokenResponse, SpotifyError> {
        let n = self.refresh_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(delay) = self.refresh_delay {
            tokio::time::sleep(delay).await;
        }
        Self::next(&self.refresh, || {
            token_response(&format!("access-refreshed-{}", n), None)
        })
    }

    async fn current_user(&self, access_token: &str) -> Result<UserProfile, SpotifyError> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        self.record(access_token);
        Self::next(&self.profile, sample_user)
    }

    async fn currently_playing(
        &self,
        access_token: &str,
    ) -> Result<Option<CurrentlyPlaying>, SpotifyError> {
        self.playing_calls.fetch_add(1, Ordering::SeqCst);
        self.record(access_token);
        if let Some(delay) = self.playing_delay {
            tokio::time::sleep(delay).await;
        }
        Self::next(&self.playing, || None)
    }

    async fn top_tracks(
        &self,
        access_token: &str,
        _limit: u32,
        _time_range: TimeRange,
    ) -> Result<Paging<Track>, SpotifyError> {
        self.top_calls.fetch_add(1, Ordering::SeqCst);
        self.record(access_token);
        Self::next(&self.top, sample_top_tracks)
    }

    async fn recently_played(
        &self,
        access_token: &str,
        _limit: u32,
    ) -> Result<CursorPaging<PlayHistory>, SpotifyError> {
        self.recent_calls.fetch_add(1, Ordering::SeqCst);
        self.record(access_token);
        Self::next(&self.recent, sample_recent)
    }
}

#[allow(dead_code)]
pub fn token_response(access_token: &str, refresh_token: Option<&str>) -> TokenResponse {
    TokenResponse {
        access_token: access_token.to_string(),
        token_type: Some("Bearer".to_string()),
        expires_in: 3600,
        refresh_token: refresh_token.map(str::to_string),
        scope: None,
    }
}

#[allow(dead_code)]
pub fn status_error(status: u16, message: &str) -> SpotifyError {
    SpotifyError::Status {
        status,
        message: message.to_string(),
    }
}

#[allow(dead_code)]
pub fn sample_user() -> UserProfile {
    serde_json::from_value(json!({
        "id": "listener42",
        "display_name": "Test Listener",
        "country": "US",
        "product": "premium",
        "followers": { "total": 7 },
        "images": [],
        "external_urls": { "spotify": "https://open.spotify.com/user/listener42" }
    }))
    .unwrap()
}

#[allow(dead_code)]
pub fn sample_playing() -> CurrentlyPlaying {
    serde_json::from_value(json!({
        "is_playing": true,
        "progress_ms": 1000,
        "item": {
            "type": "track",
            "name": "Paranoid Android",
            "artists": [{ "name": "Radiohead" }],
            "album": { "name": "OK Computer" },
            "duration_ms": 387000
        }
    }))
    .unwrap()
}

#[allow(dead_code)]
pub fn sample_top_tracks() -> Paging<Track> {
    serde_json::from_value(json!({
        "items": [
            { "id": "t1", "name": "Track One", "artists": [{ "name": "Artist" }], "duration_ms": 200000 }
        ],
        "total": 1,
        "limit": 10,
        "offset": 0,
        "next": null,
        "previous": null
    }))
    .unwrap()
}

#[allow(dead_code)]
pub fn sample_recent() -> CursorPaging<PlayHistory> {
    serde_json::from_value(json!({
        "items": [{
            "track": { "id": "t2", "name": "Track Two", "artists": [{ "name": "Band" }], "duration_ms": 180000 },
            "played_at": "2026-01-15T08:30:00.123Z"
        }],
        "limit": 10,
        "next": null,
        "cursors": { "after": "1768465800123", "before": "1768465800123" }
    }))
    .unwrap()
}

/// Test config; `token_file: None` keeps tokens in memory.
#[allow(dead_code)]
pub fn test_config(token_file: Option<PathBuf>) -> Config {
    Config {
        token_file,
        ..Config::default()
    }
}

/// Build shared state around a fake Spotify.
#[allow(dead_code)]
pub fn test_state(fake: Arc<FakeSpotify>, token_file: Option<PathBuf>) -> Arc<AppState> {
    Arc::new(AppState::new(test_config(token_file), fake))
}

/// Build state that has already completed the OAuth exchange.
#[allow(dead_code)]
pub async fn authorized_state(fake: Arc<FakeSpotify>) -> Arc<AppState> {
    let state = test_state(fake, None);
    state
        .tokens
        .exchange_code("test-code")
        .await
        .expect("exchange should succeed against the fake");
    state
}

/// Create a test app with the fake Spotify.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app(state: Arc<AppState>) -> axum::Router {
    create_router(state)
}
