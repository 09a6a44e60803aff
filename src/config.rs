// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Everything here is fixed for the lifetime of the process. A `.env` file
//! in the working directory is honored for local development.

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Default location of the single-record refresh token file.
pub const DEFAULT_TOKEN_FILE: &str = "spotify_tokens.json";

/// Proactive refresh interval, comfortably under the ~60 minute access token lifetime.
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 44 * 60;

/// Upper bound on any single call to Spotify.
pub const DEFAULT_SPOTIFY_TIMEOUT_SECS: u64 = 5;

/// Application configuration, loaded once at startup.
#[derive(Clone)]
pub struct Config {
    /// Spotify OAuth client ID
    pub spotify_client_id: String,
    /// Spotify OAuth client secret
    pub spotify_client_secret: String,
    /// Redirect URI registered with the Spotify app (points at `/callback`)
    pub spotify_redirect_uri: String,
    /// Frontend origin allowed by CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// Refresh token file; `None` keeps tokens in memory only
    pub token_file: Option<PathBuf>,
    /// How often the background task refreshes the access token
    pub refresh_interval: Duration,
    /// Timeout applied around every Spotify call
    pub spotify_timeout: Duration,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("spotify_client_id", &self.spotify_client_id)
            .field("spotify_client_secret", &"<redacted>")
            .field("spotify_redirect_uri", &self.spotify_redirect_uri)
            .field("frontend_url", &self.frontend_url)
            .field("port", &self.port)
            .field("token_file", &self.token_file)
            .field("refresh_interval", &self.refresh_interval)
            .field("spotify_timeout", &self.spotify_timeout)
            .finish()
    }
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            spotify_client_id: "test_client_id".to_string(),
            spotify_client_secret: "test_secret".to_string(),
            spotify_redirect_uri: "http://127.0.0.1:8080/callback".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            port: 8080,
            token_file: None,
            refresh_interval: Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS),
            spotify_timeout: Duration::from_secs(DEFAULT_SPOTIFY_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let token_file = match env::var("TOKEN_FILE") {
            Ok(path) if path.trim().is_empty() => None,
            Ok(path) => Some(PathBuf::from(path.trim())),
            Err(_) => Some(PathBuf::from(DEFAULT_TOKEN_FILE)),
        };

        let config = Self {
            spotify_client_id: required("SPOTIFY_CLIENT_ID")?,
            spotify_client_secret: required("SPOTIFY_CLIENT_SECRET")?,
            spotify_redirect_uri: required("SPOTIFY_REDIRECT_URI")?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: parse_or("PORT", 8080)?,
            token_file,
            refresh_interval: Duration::from_secs(parse_or(
                "TOKEN_REFRESH_INTERVAL_SECS",
                DEFAULT_REFRESH_INTERVAL_SECS,
            )?),
            spotify_timeout: Duration::from_secs(parse_or(
                "SPOTIFY_TIMEOUT_SECS",
                DEFAULT_SPOTIFY_TIMEOUT_SECS,
            )?),
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that would start a server unable to do anything useful.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.spotify_client_id.is_empty() {
            return Err(ConfigError::Missing("SPOTIFY_CLIENT_ID"));
        }
        if self.spotify_client_secret.is_empty() {
            return Err(ConfigError::Missing("SPOTIFY_CLIENT_SECRET"));
        }
        if self.spotify_redirect_uri.is_empty() {
            return Err(ConfigError::Missing("SPOTIFY_REDIRECT_URI"));
        }
        if self.refresh_interval.is_zero() {
            return Err(ConfigError::Invalid {
                name: "TOKEN_REFRESH_INTERVAL_SECS",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.spotify_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                name: "SPOTIFY_TIMEOUT_SECS",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .map(|v| v.trim().to_string())
        .map_err(|_| ConfigError::Missing(name))
}

fn parse_or<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}
