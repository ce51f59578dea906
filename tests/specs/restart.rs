// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Restart and crash-recovery specs: what survives the durable cache, what
//! is lost, and why a lost cache can omit but never double-count.

use crate::prelude::*;

#[tokio::test]
async fn counted_history_survives_a_restart() {
    let dir = tempdir().unwrap();
    let ci = Arc::new(FakeCiServer::new());
    ci.set_build("build-a", 1, "SUCCESS");

    // First lifetime: the finished build is absorbed as history.
    let first = exporter(&dir, &ci, &["build-a"]);
    first.initialize().await;
    assert!(first.refresh().await.events.is_empty());
    drop(first);

    // Second lifetime hydrates the checkpoint: still history, still silent.
    let second = exporter(&dir, &ci, &["build-a"]);
    second.initialize().await;
    assert_eq!(second.statuses().await["build-a"][&1], BuildOutcome::Counted);
    assert!(second.refresh().await.events.is_empty());
}

#[tokio::test]
async fn build_pending_at_checkpoint_resolves_in_the_next_lifetime() {
    let dir = tempdir().unwrap();
    let ci = Arc::new(FakeCiServer::new());
    ci.set_build("build-a", 2, "");

    let first = exporter(&dir, &ci, &["build-a"]);
    first.initialize().await;
    drop(first);

    // The build finishes while the process is down. The next lifetime
    // hydrates it as pending and emits it once: it was first observed
    // running, so its resolution is live activity, not history.
    ci.set_build("build-a", 2, "SUCCESS");
    let second = exporter(&dir, &ci, &["build-a"]);
    second.initialize().await;
    assert_eq!(second.statuses().await["build-a"][&2], BuildOutcome::Pending);

    let report = second.refresh().await;
    assert_eq!(report.events, vec![event("build-a", 2, BuildOutcome::Success)]);
    assert!(second.refresh().await.events.is_empty());
}

#[tokio::test]
async fn losing_the_cache_omits_but_never_double_counts() {
    let dir = tempdir().unwrap();
    let ci = Arc::new(FakeCiServer::new());
    ci.set_build("build-a", 2, "");

    // First lifetime observes the build finish and counts it. The
    // transition happened after the only checkpoint, so the durable cache
    // still says pending.
    let first = exporter(&dir, &ci, &["build-a"]);
    first.initialize().await;
    ci.set_build("build-a", 2, "SUCCESS");
    let report = first.refresh().await;
    assert_eq!(report.events.len(), 1);
    drop(first);

    // The cache is wiped out entirely. Re-discovery sees a finished build
    // it has never heard of: straight to counted history, no emission.
    std::fs::remove_file(dir.path().join(CACHE_FILE)).unwrap();
    let second = exporter(&dir, &ci, &["build-a"]);
    second.initialize().await;
    assert_eq!(second.statuses().await["build-a"][&2], BuildOutcome::Counted);
    assert!(second.refresh().await.events.is_empty());
}

#[tokio::test]
async fn builds_rolling_off_retention_are_pruned_at_startup() {
    let dir = tempdir().unwrap();
    let ci = Arc::new(FakeCiServer::new());
    ci.set_build("build-a", 1, "SUCCESS");
    ci.set_build("build-a", 2, "SUCCESS");

    let first = exporter(&dir, &ci, &["build-a"]);
    first.initialize().await;
    assert!(first.statuses().await["build-a"].contains_key(&1));
    drop(first);

    // Build 1 falls out of the server's retention window.
    ci.remove_build("build-a", 1);
    let second = exporter(&dir, &ci, &["build-a"]);
    second.initialize().await;

    let statuses = second.statuses().await;
    assert!(!statuses["build-a"].contains_key(&1));
    assert_eq!(statuses["build-a"][&2], BuildOutcome::Counted);
}

#[tokio::test]
async fn corrupt_cache_degrades_to_rediscovery() {
    let dir = tempdir().unwrap();
    let ci = Arc::new(FakeCiServer::new());
    ci.set_build("build-a", 1, "FAILURE");
    ci.set_build("build-a", 2, "");

    std::fs::write(dir.path().join(CACHE_FILE), b"\x00\x01 not a cache").unwrap();

    let driver = exporter(&dir, &ci, &["build-a"]);
    driver.initialize().await;

    // Cold start from the corrupt file: history absorbed, running build
    // tracked, and the rewritten cache is readable again.
    let statuses = driver.statuses().await;
    assert_eq!(statuses["build-a"][&1], BuildOutcome::Counted);
    assert_eq!(statuses["build-a"][&2], BuildOutcome::Pending);

    let reloaded = StatusCache::new(dir.path().join(CACHE_FILE)).load().unwrap();
    similar_asserts::assert_eq!(reloaded, statuses);
}
