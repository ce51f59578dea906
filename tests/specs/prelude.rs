// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for the exporter specs.

pub use std::sync::Arc;

pub use tally_adapters::FakeCiServer;
pub use tally_core::{BuildOutcome, StatusEvent, StatusMap};
pub use tally_daemon::{BuildCounters, RefreshDriver};
pub use tally_storage::StatusCache;
pub use tempfile::{tempdir, TempDir};

pub const CACHE_FILE: &str = "buildStatusCache.json";

/// A driver wired to the fake CI server with its cache inside `dir`.
///
/// Separate calls against the same `dir` model process restarts: each
/// driver is a fresh lifetime sharing only the durable cache.
pub fn exporter(dir: &TempDir, ci: &Arc<FakeCiServer>, jobs: &[&str]) -> RefreshDriver {
    RefreshDriver::new(
        ci.clone(),
        StatusCache::new(dir.path().join(CACHE_FILE)),
        jobs.iter().map(|job| job.to_string()).collect(),
    )
}

pub fn event(job: &str, number: i64, outcome: BuildOutcome) -> StatusEvent {
    StatusEvent { job: job.to_string(), number, outcome }
}
