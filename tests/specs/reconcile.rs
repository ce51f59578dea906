// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Steady-state reconciliation specs: discovery, one-shot emission, and the
//! counter registry fed from refresh passes.

use crate::prelude::*;

#[tokio::test]
async fn history_is_absorbed_and_live_transitions_emit_once() {
    let dir = tempdir().unwrap();
    let ci = Arc::new(FakeCiServer::new());
    ci.set_build("build-a", 1, "SUCCESS");
    ci.set_build("build-a", 2, "");

    let driver = exporter(&dir, &ci, &["build-a"]);
    driver.initialize().await;

    // Pre-existing history is counted state, the running build is pending,
    // and nothing was emitted.
    let statuses = driver.statuses().await;
    assert_eq!(statuses["build-a"][&1], BuildOutcome::Counted);
    assert_eq!(statuses["build-a"][&2], BuildOutcome::Pending);

    // The running build fails: exactly one emission.
    ci.set_build("build-a", 2, "FAILURE");
    let report = driver.refresh().await;
    assert_eq!(report.events, vec![event("build-a", 2, BuildOutcome::Failure)]);
    assert_eq!(driver.statuses().await["build-a"][&2], BuildOutcome::Counted);

    // No pending builds left: the next pass is silent and changes nothing.
    let before = driver.statuses().await;
    let quiet = driver.refresh().await;
    assert!(quiet.events.is_empty());
    assert_eq!(quiet.pending, 0);
    similar_asserts::assert_eq!(driver.statuses().await, before);
}

#[tokio::test]
async fn builds_appearing_mid_run_are_tracked_to_completion() {
    let dir = tempdir().unwrap();
    let ci = Arc::new(FakeCiServer::new());
    ci.set_build("build-a", 1, "SUCCESS");

    let driver = exporter(&dir, &ci, &["build-a"]);
    driver.initialize().await;

    // Build 3 appears, still running: enters pending, nothing emitted.
    ci.set_build("build-a", 3, "");
    let report = driver.refresh().await;
    assert!(report.events.is_empty());
    assert_eq!(report.pending, 1);
    assert_eq!(driver.statuses().await["build-a"][&3], BuildOutcome::Pending);

    // It succeeds: one emission on the following cycle.
    ci.set_build("build-a", 3, "SUCCESS");
    let report = driver.refresh().await;
    assert_eq!(report.events, vec![event("build-a", 3, BuildOutcome::Success)]);
    assert_eq!(report.pending, 0);
}

#[tokio::test]
async fn counters_reflect_live_transitions_only() {
    let dir = tempdir().unwrap();
    let ci = Arc::new(FakeCiServer::new());
    ci.set_build("build-a", 1, "SUCCESS");
    ci.set_build("build-a", 2, "");
    ci.set_build("build-b", 7, "");

    let driver = exporter(&dir, &ci, &["build-a", "build-b"]);
    driver.initialize().await;

    let counters = BuildCounters::new(driver.jobs().iter().cloned());

    // First scrape: nothing resolved yet. The historical success is not in
    // the counters, and both running builds show in the gauge.
    let report = driver.refresh().await;
    counters.apply(&report.events);
    counters.set_running(report.pending as u64);
    let rendered = counters.render();
    assert!(rendered.contains("jenkins_job_builds_total{job=\"build-a\"} 0"));
    assert!(rendered.contains("jenkins_job_running_builds_count 2"));

    // Both builds finish with different outcomes.
    ci.set_build("build-a", 2, "UNSTABLE");
    ci.set_build("build-b", 7, "ABORTED");
    let report = driver.refresh().await;
    counters.apply(&report.events);
    counters.set_running(report.pending as u64);

    let rendered = counters.render();
    assert!(rendered.contains("jenkins_job_build_unstable_total{job=\"build-a\"} 1"));
    assert!(rendered.contains("jenkins_job_builds_total{job=\"build-a\"} 1"));
    assert!(rendered.contains("jenkins_job_build_aborted_total{job=\"build-b\"} 1"));
    assert!(rendered.contains("jenkins_job_running_builds_count 0"));

    // Scraping again without new activity changes nothing.
    let report = driver.refresh().await;
    counters.apply(&report.events);
    counters.set_running(report.pending as u64);
    assert!(counters.render().contains("jenkins_job_builds_total{job=\"build-a\"} 1"));
}
