// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Single-record refresh token file.
//!
//! The file holds `{"refreshToken": "..."}` and nothing else. Writes go to a
//! sibling temp file which is synced and renamed over the target, so a crash
//! mid-write never leaves a truncated record behind.

use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// On-disk record.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredToken {
    refresh_token: String,
}

/// Token file errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("token file I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("token file is malformed: {0}")]
    Malformed(String),
}

/// File-backed store for the one refresh token this process holds.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "spotify_tokens.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Read the stored refresh token.
    ///
    /// `Ok(None)` means no file. A file that exists but does not hold a
    /// non-empty token is [`StoreError::Malformed`].
    pub async fn load(&self) -> Result<Option<String>, StoreError> {
        let data = match tokio::fs::read_to_string(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let record: StoredToken =
            serde_json::from_str(&data).map_err(|e| StoreError::Malformed(e.to_string()))?;

        if record.refresh_token.trim().is_empty() {
            return Err(StoreError::Malformed("empty refresh token".to_string()));
        }

        Ok(Some(record.refresh_token))
    }

    /// Replace the stored refresh token.
    pub async fn save(&self, refresh_token: &str) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let data = serde_json::to_vec_pretty(&StoredToken {
            refresh_token: refresh_token.to_string(),
        })
        .map_err(|e| StoreError::Malformed(e.to_string()))?;

        let temp = self.temp_path();
        if let Err(e) = self.write_and_swap(&temp, &data).await {
            // Never leave a partial record lying around
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e);
        }

        tracing::debug!(path = %self.path.display(), "Refresh token saved");
        Ok(())
    }

    async fn write_and_swap(&self, temp: &Path, data: &[u8]) -> Result<(), StoreError> {
        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);
        let mut file = options.open(temp).await?;

        // A temp file left by a crash keeps its old mode; tighten it before
        // the token goes in.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))
                .await?;
        }

        file.write_all(data).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(temp, &self.path).await?;
        Ok(())
    }

    /// Remove the stored record. Missing files are fine.
    pub async fn delete(&self) -> Result<(), StoreError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
