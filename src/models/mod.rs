// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for Spotify payloads and API responses.

pub mod playback;
pub mod track;
pub mod user;

pub use playback::{CurrentlyPlaying, NowPlaying, PlaybackState, PlaybackStatus, PlayingItem};
pub use track::{CursorPaging, Episode, Paging, PlayHistory, TimeRange, Track};
pub use user::UserProfile;
