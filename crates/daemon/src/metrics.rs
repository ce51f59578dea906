// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build counters and their scrape rendering.
//!
//! One registry object lives for the whole process: constructed at startup
//! with every known job at zero, incremented only through [`BuildCounters::apply`]
//! with the events a refresh pass emitted. Counters are monotonic per
//! (job, outcome); the running-builds gauge is overwritten each pass.
//!
//! Metric names and help strings are a stable scrape contract; renaming them
//! breaks existing dashboards and alerts.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use tally_core::{BuildOutcome, StatusEvent};

#[derive(Debug, Default, Clone, Copy)]
struct OutcomeCounts {
    total: u64,
    success: u64,
    failure: u64,
    unstable: u64,
    aborted: u64,
}

#[derive(Default)]
struct RegistryInner {
    jobs: BTreeMap<String, OutcomeCounts>,
    running: u64,
}

/// Monotonic per-(job, outcome) build counters plus the running-builds gauge.
#[derive(Default)]
pub struct BuildCounters {
    inner: Mutex<RegistryInner>,
}

/// Counter families in exposition order.
const FAMILIES: &[(&str, &str, fn(&OutcomeCounts) -> u64)] = &[
    (
        "jenkins_job_builds_total",
        "total number of finished Jenkins builds",
        |counts| counts.total,
    ),
    (
        "jenkins_job_build_success_total",
        "total number of successfully finished Jenkins builds",
        |counts| counts.success,
    ),
    (
        "jenkins_job_build_failure_total",
        "total number of finished Jenkins builds in failure state",
        |counts| counts.failure,
    ),
    (
        "jenkins_job_build_unstable_total",
        "total number of finished Jenkins builds in unstable state",
        |counts| counts.unstable,
    ),
    (
        "jenkins_job_build_aborted_total",
        "total number of finished Jenkins builds in aborted state",
        |counts| counts.aborted,
    ),
];

const RUNNING_GAUGE: &str = "jenkins_job_running_builds_count";
const RUNNING_HELP: &str = "number of running Jenkins Job builds";

impl BuildCounters {
    /// Registry seeded with every known job at zero, so each job exports
    /// all counter families from the first scrape on.
    pub fn new(jobs: impl IntoIterator<Item = String>) -> Self {
        let counters = Self::default();
        {
            let mut inner = counters.inner.lock();
            for job in jobs {
                inner.jobs.entry(job).or_default();
            }
        }
        counters
    }

    /// Fold one pass's emissions in. Only terminal outcomes count;
    /// `Pending` and `Counted` never reach the exported counters.
    pub fn apply(&self, events: &[StatusEvent]) {
        let mut inner = self.inner.lock();
        for event in events {
            let counts = inner.jobs.entry(event.job.clone()).or_default();
            match event.outcome {
                BuildOutcome::Success => {
                    counts.total += 1;
                    counts.success += 1;
                }
                BuildOutcome::Failure => {
                    counts.total += 1;
                    counts.failure += 1;
                }
                BuildOutcome::Unstable => {
                    counts.total += 1;
                    counts.unstable += 1;
                }
                BuildOutcome::Aborted => {
                    counts.total += 1;
                    counts.aborted += 1;
                }
                BuildOutcome::Pending | BuildOutcome::Counted => {}
            }
        }
    }

    /// Overwrite the running-builds gauge.
    pub fn set_running(&self, count: u64) {
        self.inner.lock().running = count;
    }

    /// Render the registry in Prometheus text exposition format.
    pub fn render(&self) -> String {
        let inner = self.inner.lock();
        let mut out = String::new();

        for (name, help, value_of) in FAMILIES {
            let _ = writeln!(out, "# HELP {name} {help}");
            let _ = writeln!(out, "# TYPE {name} counter");
            for (job, counts) in &inner.jobs {
                let _ = writeln!(out, "{name}{{job=\"{}\"}} {}", escape_label(job), value_of(counts));
            }
        }

        let _ = writeln!(out, "# HELP {RUNNING_GAUGE} {RUNNING_HELP}");
        let _ = writeln!(out, "# TYPE {RUNNING_GAUGE} gauge");
        let _ = writeln!(out, "{RUNNING_GAUGE} {}", inner.running);

        out
    }
}

/// Escape a label value per the exposition format: backslash, quote, newline.
fn escape_label(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;
