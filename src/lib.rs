// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Spotify-Status: a small REST facade over the Spotify Web API
//!
//! This crate logs one Spotify account in through OAuth, keeps its access
//! token fresh, and exposes playback status, profile, top tracks and
//! recently played tracks over HTTP.

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use services::{SpotifyApi, SpotifyService, TokenManager, TokenStore};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub tokens: Arc<TokenManager>,
    pub spotify: SpotifyService,
}

impl AppState {
    /// Wire the token manager and passthrough service around one Spotify client.
    ///
    /// The token file named in `config` is not read here; call
    /// [`TokenManager::load_persisted`] before serving.
    pub fn new(config: Config, api: Arc<dyn SpotifyApi>) -> Self {
        let store = config.token_file.clone().map(TokenStore::new);
        let tokens = Arc::new(TokenManager::new(
            api.clone(),
            store,
            config.spotify_timeout,
        ));
        let spotify = SpotifyService::new(api, tokens.clone(), config.spotify_timeout);

        Self {
            config,
            tokens,
            spotify,
        }
    }
}
