// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Playback state: Spotify's currently-playing object and the status we report.

use serde::{Deserialize, Serialize};

use super::track::{Episode, Track};

/// Response body of `GET /me/player/currently-playing`.
#[derive(Debug, Clone, Deserialize)]
pub struct CurrentlyPlaying {
    #[serde(default)]
    pub is_playing: bool,
    #[serde(default)]
    pub progress_ms: Option<u64>,
    /// `null` during ads or when Spotify can't resolve the item
    #[serde(default)]
    pub item: Option<PlayingItem>,
}

/// The item being played, discriminated by Spotify's `type` field.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PlayingItem {
    Track(Track),
    Episode(Episode),
    #[serde(other)]
    Unknown,
}

/// Coarse playback state exposed to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlaybackState {
    Playing,
    Paused,
    NoPlayback,
    /// Spotify could not be reached; the state is unknown.
    Unavailable,
}

/// Details of the track or episode in the player.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NowPlaying {
    pub title: String,
    pub artists: Vec<String>,
    pub album: Option<String>,
    pub progress_ms: Option<u64>,
    pub duration_ms: u64,
    pub url: Option<String>,
}

/// Body of `GET /api/currently-playing`. Always well-formed, never an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackStatus {
    pub status: PlaybackState,
    pub message: String,
    /// "Title - Artist" line, present while something is loaded
    pub song: Option<String>,
    pub track: Option<NowPlaying>,
}

impl PlaybackStatus {
    pub fn no_playback() -> Self {
        Self {
            status: PlaybackState::NoPlayback,
            message: "No active Spotify playback detected".to_string(),
            song: None,
            track: None,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            status: PlaybackState::Unavailable,
            message: "Error fetching playback".to_string(),
            song: None,
            track: None,
        }
    }
}

impl From<CurrentlyPlaying> for PlaybackStatus {
    fn from(current: CurrentlyPlaying) -> Self {
        let now_playing = match current.item {
            Some(PlayingItem::Track(track)) => NowPlaying {
                artists: track.artists.iter().map(|a| a.name.clone()).collect(),
                album: track.album.map(|a| a.name),
                progress_ms: current.progress_ms,
                duration_ms: track.duration_ms,
                url: track.external_urls.spotify,
                title: track.name,
            },
            Some(PlayingItem::Episode(episode)) => NowPlaying {
                artists: episode.show.iter().map(|s| s.name.clone()).collect(),
                album: None,
                progress_ms: current.progress_ms,
                duration_ms: episode.duration_ms,
                url: episode.external_urls.spotify,
                title: episode.name,
            },
            Some(PlayingItem::Unknown) | None => return Self::no_playback(),
        };

        let song = match now_playing.artists.first() {
            Some(artist) => format!("{} - {}", now_playing.title, artist),
            None => now_playing.title.clone(),
        };

        let (status, message) = if current.is_playing {
            (PlaybackState::Playing, "Now Playing")
        } else {
            (PlaybackState::Paused, "Spotify is paused")
        };

        Self {
            status,
            message: message.to_string(),
            song: Some(song),
            track: Some(now_playing),
        }
    }
}
