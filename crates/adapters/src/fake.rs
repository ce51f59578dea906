// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scriptable in-memory CI server for tests.
//!
//! Tests drive reconciliation by mutating the fake between passes: builds
//! appear, results flip from running to terminal, and individual fetches or
//! listings can be made to fail to exercise the retry paths.

use crate::ci::{CiError, CiServer};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Default)]
struct FakeState {
    jobs: Vec<String>,
    builds: BTreeMap<String, BTreeMap<i64, String>>,
    failing_fetches: BTreeSet<(String, i64)>,
    failing_listings: BTreeSet<String>,
}

/// In-memory [`CiServer`] with scripted jobs, builds, and failures.
#[derive(Default)]
pub struct FakeCiServer {
    state: Mutex<FakeState>,
}

impl FakeCiServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job (it appears in every view).
    pub fn add_job(&self, job: &str) {
        let mut state = self.state.lock();
        if !state.jobs.iter().any(|name| name == job) {
            state.jobs.push(job.to_string());
            state.builds.entry(job.to_string()).or_default();
        }
    }

    /// Create or update a build's raw result. `""` means still running.
    pub fn set_build(&self, job: &str, number: i64, raw: &str) {
        self.add_job(job);
        self.state.lock().builds.entry(job.to_string()).or_default().insert(number, raw.to_string());
    }

    /// Drop a build, as if it rolled off the retention window.
    pub fn remove_build(&self, job: &str, number: i64) {
        if let Some(builds) = self.state.lock().builds.get_mut(job) {
            builds.remove(&number);
        }
    }

    /// Make `fetch_raw_result` fail for one build until cleared.
    pub fn fail_fetch(&self, job: &str, number: i64) {
        self.state.lock().failing_fetches.insert((job.to_string(), number));
    }

    pub fn clear_fetch_failure(&self, job: &str, number: i64) {
        self.state.lock().failing_fetches.remove(&(job.to_string(), number));
    }

    /// Make `list_build_numbers` fail for one job until cleared.
    pub fn fail_listing(&self, job: &str) {
        self.state.lock().failing_listings.insert(job.to_string());
    }

    pub fn clear_listing_failure(&self, job: &str) {
        self.state.lock().failing_listings.remove(job);
    }
}

#[async_trait]
impl CiServer for FakeCiServer {
    async fn list_jobs(&self, _view: &str) -> Result<Vec<String>, CiError> {
        Ok(self.state.lock().jobs.clone())
    }

    async fn list_build_numbers(&self, job: &str) -> Result<Vec<i64>, CiError> {
        let state = self.state.lock();
        if state.failing_listings.contains(job) {
            return Err(CiError::Api { status: 503, url: format!("fake://job/{job}") });
        }
        match state.builds.get(job) {
            Some(builds) => Ok(builds.keys().copied().collect()),
            None => Err(CiError::NotFound(format!("fake://job/{job}"))),
        }
    }

    async fn fetch_raw_result(&self, job: &str, number: i64) -> Result<String, CiError> {
        let state = self.state.lock();
        if state.failing_fetches.contains(&(job.to_string(), number)) {
            return Err(CiError::Api { status: 503, url: format!("fake://job/{job}/{number}") });
        }
        state
            .builds
            .get(job)
            .and_then(|builds| builds.get(&number))
            .cloned()
            .ok_or_else(|| CiError::NotFound(format!("fake://job/{job}/{number}")))
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
