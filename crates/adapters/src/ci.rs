// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CI server seam.
//!
//! The refresh driver talks to the CI system only through this trait, so
//! reconciliation logic can be exercised against a scripted fake and the
//! Jenkins client stays a thin collaborator.

use async_trait::async_trait;
use thiserror::Error;

/// Errors from the CI collaborator.
///
/// All of these are recoverable per-item: a failed listing skips that job
/// for the cycle, a failed result fetch leaves that build pending and
/// retried on the next cycle.
#[derive(Debug, Error)]
pub enum CiError {
    /// The job or build does not exist (deleted, renamed, or rolled off the
    /// server's retention window).
    #[error("not found: {0}")]
    NotFound(String),

    /// Transport failure: connect, timeout, TLS.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("unexpected status {status} from {url}")]
    Api { status: u16, url: String },
}

/// Read-only view of a CI server's jobs and builds.
#[async_trait]
pub trait CiServer: Send + Sync {
    /// Names of the jobs in the given view.
    async fn list_jobs(&self, view: &str) -> Result<Vec<String>, CiError>;

    /// Every build number the server currently lists for `job`, newest
    /// first or oldest first — callers must not rely on order.
    async fn list_build_numbers(&self, job: &str) -> Result<Vec<i64>, CiError>;

    /// The raw result string for one build. An empty string means the build
    /// has not finished (Jenkins reports a JSON null).
    async fn fetch_raw_result(&self, job: &str, number: i64) -> Result<String, CiError>;
}
