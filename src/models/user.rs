//! Spotify user profile as returned by `GET /me`.

use serde::{Deserialize, Serialize};

use super::track::{ExternalUrls, Image};

/// Current user's profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// Spotify user ID
    pub id: String,
    /// Display name (absent for some accounts)
    #[serde(default)]
    pub display_name: Option<String>,
    /// Email address (requires `user-read-email`, so usually absent)
    #[serde(default)]
    pub email: Option<String>,
    /// ISO 3166-1 alpha-2 country code
    #[serde(default)]
    pub country: Option<String>,
    /// Subscription level ("premium", "free", ...)
    #[serde(default)]
    pub product: Option<String>,
    #[serde(default)]
    pub followers: Option<Followers>,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Followers {
    pub total: u64,
}
