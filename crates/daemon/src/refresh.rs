// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reconciliation passes against the CI server.
//!
//! Per process lifetime: hydrate the ledger from the status cache, run one
//! full discovery pass over every known job, checkpoint the table, then run
//! a partial refresh on every scrape trigger. A partial refresh folds in
//! newly appeared builds and re-checks only the builds still pending; the
//! terminal transitions it observes are handed to the counter layer exactly
//! once.
//!
//! The ledger mutex doubles as the single-flight lock: at most one pass
//! mutates the table at a time, so the emit-at-most-once rule never races.
//! Result fetches within a pass fan out concurrently — they are independent
//! per build — and the pass task holding the lock applies every mutation.

use std::collections::BTreeSet;
use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use regex::Regex;
use tally_adapters::{CiError, CiServer};
use tally_core::{BuildLedger, BuildOutcome, StatusEvent, StatusMap};
use tally_storage::{CacheError, StatusCache};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Concurrent raw-result fetches per pass.
const FETCH_CONCURRENCY: usize = 8;

/// What one refresh pass observed.
#[derive(Debug, Default)]
pub struct RefreshReport {
    /// Terminal transitions observed this cycle; each is emitted exactly
    /// once for the lifetime of the table.
    pub events: Vec<StatusEvent>,
    /// Builds still pending after the pass (the running-builds gauge).
    pub pending: usize,
    /// Jobs and builds skipped this cycle because the CI fetch failed;
    /// they are retried on the next trigger.
    pub skipped: usize,
}

/// Drives discovery and re-classification against one CI server.
pub struct RefreshDriver {
    ci: Arc<dyn CiServer>,
    cache: StatusCache,
    /// Known jobs, resolved once at startup. Restart to pick up changes.
    jobs: Vec<String>,
    ledger: Mutex<BuildLedger>,
}

impl RefreshDriver {
    /// Resolve the job set from the configured view, filtered by name.
    pub async fn discover_jobs(
        ci: &dyn CiServer,
        view: &str,
        filter: &Regex,
    ) -> Result<Vec<String>, CiError> {
        let names = ci.list_jobs(view).await?;
        Ok(names.into_iter().filter(|name| filter.is_match(name)).collect())
    }

    pub fn new(ci: Arc<dyn CiServer>, cache: StatusCache, jobs: Vec<String>) -> Self {
        Self { ci, cache, jobs, ledger: Mutex::new(BuildLedger::new()) }
    }

    pub fn jobs(&self) -> &[String] {
        &self.jobs
    }

    /// Clone of the current status table, mainly for tests and diagnostics.
    pub async fn statuses(&self) -> StatusMap {
        self.ledger.lock().await.statuses().clone()
    }

    /// Hydrate from the status cache, run the initial full discovery pass,
    /// and checkpoint the table.
    ///
    /// Never fails: a missing cache is a cold start, an unreadable one is a
    /// logged cold start, an unreachable job is skipped, and a failed
    /// checkpoint write leaves the process running on the in-memory table.
    pub async fn initialize(&self) {
        let mut ledger = self.ledger.lock().await;

        match self.cache.load() {
            Ok(statuses) => {
                info!(path = %self.cache.path().display(), "status cache hydrated");
                ledger.hydrate(statuses);
            }
            Err(CacheError::NotFound(_)) => {
                info!("no status cache, starting cold");
            }
            Err(e) => {
                warn!(error = %e, "unable to load status cache, starting cold");
            }
        }

        // Cached jobs that left the view are stale history.
        ledger.retain_jobs(|job| self.jobs.iter().any(|name| name == job));

        info!(jobs = self.jobs.len(), "discovering builds");
        for (index, job) in self.jobs.iter().enumerate() {
            info!("({}/{}) {}", index + 1, self.jobs.len(), job);
            if let Err(e) = self.discover_job_builds(&mut ledger, job, true).await {
                warn!(job = %job, error = %e, "unable to list builds, skipping job");
            }
        }

        info!(pending = ledger.pending_count(), "initial discovery complete, writing status cache");
        if let Err(e) = self.cache.save(ledger.statuses()) {
            warn!(error = %e, "unable to write status cache, continuing");
        }
    }

    /// One partial refresh pass.
    ///
    /// Newly appeared builds enter the table first (already-finished ones as
    /// counted history, running ones as pending), then every pending build
    /// is re-fetched and absorbed. Serialized by the ledger lock: concurrent
    /// scrape triggers run one pass at a time.
    pub async fn refresh(&self) -> RefreshReport {
        let mut ledger = self.ledger.lock().await;
        let mut report = RefreshReport::default();

        for job in &self.jobs {
            if let Err(e) = self.discover_job_builds(&mut ledger, job, false).await {
                warn!(job = %job, error = %e, "unable to list builds this cycle");
                report.skipped += 1;
            }
        }

        let pending = ledger.pending_builds();
        let ci = self.ci.as_ref();
        let results: Vec<(String, i64, Result<String, CiError>)> =
            stream::iter(pending.into_iter().map(|(job, number)| async move {
                let result = ci.fetch_raw_result(&job, number).await;
                (job, number, result)
            }))
            .buffer_unordered(FETCH_CONCURRENCY)
            .collect()
            .await;

        for (job, number, result) in results {
            match result {
                Ok(raw) => {
                    if let Some(outcome) = ledger.classify_and_absorb(&job, number, &raw) {
                        report.events.push(StatusEvent { job, number, outcome });
                    }
                }
                Err(e) => {
                    warn!(job = %job, number, error = %e, "result fetch failed, retrying next cycle");
                    report.skipped += 1;
                }
            }
        }

        report.pending = ledger.pending_count();
        if !report.events.is_empty() {
            info!(events = report.events.len(), "builds reached a terminal state");
        }
        if report.skipped > 0 {
            info!(skipped = report.skipped, "items skipped this cycle");
        }
        report
    }

    /// List a job's builds and record any not yet in the ledger.
    ///
    /// A build whose first observed result is already terminal enters as
    /// counted history and is never emitted; one still running (or whose
    /// fetch fails) enters as pending. With `prune`, entries for builds the
    /// server no longer lists are dropped (full discovery only).
    async fn discover_job_builds(
        &self,
        ledger: &mut BuildLedger,
        job: &str,
        prune: bool,
    ) -> Result<(), CiError> {
        let numbers = self.ci.list_build_numbers(job).await?;
        let listed: BTreeSet<i64> = numbers.iter().copied().collect();
        let unseen: Vec<i64> =
            numbers.into_iter().filter(|number| !ledger.contains(job, *number)).collect();

        let ci = self.ci.as_ref();
        let results: Vec<(i64, Result<String, CiError>)> =
            stream::iter(unseen.into_iter().map(|number| async move {
                (number, ci.fetch_raw_result(job, number).await)
            }))
            .buffer_unordered(FETCH_CONCURRENCY)
            .collect()
            .await;

        for (number, result) in results {
            match result {
                Ok(raw) => {
                    ledger.record_discovery(job, number, &raw);
                }
                Err(e) => {
                    warn!(job = %job, number, error = %e, "result fetch failed, recording as pending");
                    ledger.record_if_absent(job, number, BuildOutcome::Pending);
                }
            }
        }

        if prune {
            ledger.retain_builds(job, &listed);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "refresh_tests.rs"]
mod tests;
