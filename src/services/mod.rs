// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - token lifecycle and Spotify access.

pub mod refresher;
pub mod spotify;
pub mod store;
pub mod tokens;

pub use refresher::TokenRefresher;
pub use spotify::{SpotifyApi, SpotifyClient, SpotifyError, SpotifyService, TokenResponse};
pub use store::{StoreError, TokenStore};
pub use tokens::{AuthStatus, TokenManager};
