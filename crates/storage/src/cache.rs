// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status-cache persistence.
//!
//! The whole status table is the unit of persistence: written once after the
//! initial full discovery pass and reloaded at the next startup so builds
//! counted in a previous lifetime are never counted again. A missing file is
//! a normal cold start, not a failure; bytes that do not parse into the
//! expected shape are rejected loudly so the caller can fall back to
//! re-discovery instead of silently misclassifying.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tally_core::StatusMap;
use thiserror::Error;
use tracing::debug;

/// Current cache schema version
pub const CURRENT_CACHE_VERSION: u32 = 1;

/// Errors that can occur in cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    /// No snapshot has been written yet. Normal on first boot.
    #[error("no status cache at {}", .0.display())]
    NotFound(PathBuf),

    #[error("status cache is corrupt: {0}")]
    Corrupt(serde_json::Error),

    #[error("unsupported status cache version {0}")]
    UnsupportedVersion(u32),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// On-disk envelope around the status table.
#[derive(Debug, Deserialize)]
struct CacheFile {
    /// Schema version for migrations
    #[serde(rename = "v")]
    version: u32,
    #[allow(dead_code)]
    saved_at: DateTime<Utc>,
    statuses: StatusMap,
}

#[derive(Serialize)]
struct CacheFileRef<'a> {
    #[serde(rename = "v")]
    version: u32,
    saved_at: DateTime<Utc>,
    statuses: &'a StatusMap,
}

const MAX_BAK_FILES: u32 = 3;

/// Pick the next `.bak` / `.bak.N` path, rotating older backups out.
///
/// Keeps up to [`MAX_BAK_FILES`] backups: `.bak`, `.bak.2`, `.bak.3`.
/// The oldest backup is removed when the limit is reached.
fn rotate_bak_path(path: &Path) -> PathBuf {
    let bak = |n: u32| {
        if n == 1 {
            path.with_extension("bak")
        } else {
            path.with_extension(format!("bak.{n}"))
        }
    };

    // Remove the oldest if at capacity
    let oldest = bak(MAX_BAK_FILES);
    if oldest.exists() {
        let _ = fs::remove_file(&oldest);
    }

    // Shift existing backups up by one
    for n in (1..MAX_BAK_FILES).rev() {
        let src = bak(n);
        if src.exists() {
            let _ = fs::rename(&src, bak(n + 1));
        }
    }

    bak(1)
}

/// Reads and writes the status table at a fixed path.
#[derive(Debug, Clone)]
pub struct StatusCache {
    path: PathBuf,
}

impl StatusCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted status table.
    ///
    /// `NotFound` when no snapshot exists; `Corrupt` when bytes exist but do
    /// not decode into the envelope; `UnsupportedVersion` when the envelope
    /// is from a newer schema.
    pub fn load(&self) -> Result<StatusMap, CacheError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(CacheError::NotFound(self.path.clone()))
            }
            Err(e) => return Err(e.into()),
        };

        let file: CacheFile = serde_json::from_slice(&bytes).map_err(CacheError::Corrupt)?;
        if file.version != CURRENT_CACHE_VERSION {
            return Err(CacheError::UnsupportedVersion(file.version));
        }

        Ok(file.statuses)
    }

    /// Persist the status table.
    ///
    /// Writes through a sibling temp file and renames into place so a crash
    /// mid-write leaves the previous snapshot intact; the previous snapshot
    /// is rotated to a bounded set of `.bak` files.
    pub fn save(&self, statuses: &StatusMap) -> Result<(), CacheError> {
        let envelope = CacheFileRef {
            version: CURRENT_CACHE_VERSION,
            saved_at: Utc::now(),
            statuses,
        };
        let json = serde_json::to_vec_pretty(&envelope)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, &json)?;

        if self.path.exists() {
            let bak = rotate_bak_path(&self.path);
            let _ = fs::rename(&self.path, bak);
        }
        fs::rename(&tmp, &self.path)?;

        debug!(path = %self.path.display(), size_bytes = json.len(), "status cache written");
        Ok(())
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
