// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-job, per-build status ledger.
//!
//! The ledger owns the full job → build number → outcome table and every
//! rule for mutating it. Stored records are only ever `Pending` (still being
//! polled) or `Counted` (terminal outcome already surfaced, or observed as
//! pre-existing history); the transition between the two happens in exactly
//! one place, [`BuildLedger::classify_and_absorb`], which is what makes the
//! emit-at-most-once guarantee hold across process restarts.

use crate::outcome::{classify, BuildOutcome};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

/// Full status table: job name → build number → outcome.
///
/// BTreeMap on both levels for reproducible iteration and a stable
/// serialized form.
pub type StatusMap = BTreeMap<String, BTreeMap<i64, BuildOutcome>>;

/// A countable build transition observed during a reconciliation pass.
///
/// `outcome` is always terminal; `Pending` and `Counted` are never emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEvent {
    pub job: String,
    pub number: i64,
    pub outcome: BuildOutcome,
}

/// The reconciliation table and its mutation rules.
#[derive(Debug, Default)]
pub struct BuildLedger {
    statuses: StatusMap,
}

impl BuildLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the table wholesale with a previously persisted snapshot.
    pub fn hydrate(&mut self, statuses: StatusMap) {
        self.statuses = statuses;
    }

    /// True if the build already has a record.
    pub fn contains(&self, job: &str, number: i64) -> bool {
        self.statuses.get(job).is_some_and(|builds| builds.contains_key(&number))
    }

    /// Insert `(job, number) → outcome` only if the build is unknown.
    ///
    /// Returns whether an insert happened. A build discovered twice in the
    /// same pass leaves the table unchanged after the first insert.
    pub fn record_if_absent(&mut self, job: &str, number: i64, outcome: BuildOutcome) -> bool {
        match self.statuses.entry(job.to_string()).or_default().entry(number) {
            Entry::Vacant(slot) => {
                slot.insert(outcome);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    /// Record a build seen for the first time, from its raw result.
    ///
    /// Applies the first-sight rule: a build that is already terminal when
    /// first observed finished before this process watched it, so it enters
    /// directly as `Counted` and is never emitted. Anything else enters as
    /// `Pending` and is polled until it resolves.
    pub fn record_discovery(&mut self, job: &str, number: i64, raw: &str) -> bool {
        self.record_if_absent(job, number, classify(raw).discovery_state())
    }

    /// Absorb a freshly fetched raw result for a build.
    ///
    /// Returns the terminal outcome exactly once: on the first call that
    /// sees a stored `Pending` record resolve to a terminal result. The
    /// record transitions to `Counted` in the same step, so every later call
    /// — and every later process lifetime that hydrates this table —
    /// returns `None`. A stored record that is anything other than
    /// `Pending` (Counted, or a raw terminal tag from an older snapshot)
    /// absorbs silently. An unknown build is recorded via the first-sight
    /// rule and emits nothing.
    pub fn classify_and_absorb(
        &mut self,
        job: &str,
        number: i64,
        raw: &str,
    ) -> Option<BuildOutcome> {
        let outcome = classify(raw);
        match self.statuses.entry(job.to_string()).or_default().entry(number) {
            Entry::Vacant(slot) => {
                slot.insert(outcome.discovery_state());
                None
            }
            Entry::Occupied(mut slot) => {
                if *slot.get() != BuildOutcome::Pending {
                    return None;
                }
                if outcome.is_terminal() {
                    slot.insert(BuildOutcome::Counted);
                    Some(outcome)
                } else {
                    None
                }
            }
        }
    }

    /// Every build currently `Pending`, across all jobs.
    ///
    /// Re-enumerable; each call walks the live table.
    pub fn pending_builds(&self) -> Vec<(String, i64)> {
        self.statuses
            .iter()
            .flat_map(|(job, builds)| {
                builds
                    .iter()
                    .filter(|(_, outcome)| **outcome == BuildOutcome::Pending)
                    .map(|(number, _)| (job.clone(), *number))
            })
            .collect()
    }

    /// Number of builds currently `Pending` (the running-builds gauge).
    pub fn pending_count(&self) -> usize {
        self.statuses
            .values()
            .flat_map(|builds| builds.values())
            .filter(|outcome| **outcome == BuildOutcome::Pending)
            .count()
    }

    /// Drop records for builds of `job` that are no longer listed.
    ///
    /// Jenkins retention rolled them off; keeping them would grow the table
    /// without bound.
    pub fn retain_builds(&mut self, job: &str, listed: &BTreeSet<i64>) {
        if let Some(builds) = self.statuses.get_mut(job) {
            builds.retain(|number, _| listed.contains(number));
        }
    }

    /// Drop cached jobs that are not part of the current job set.
    pub fn retain_jobs(&mut self, keep: impl Fn(&str) -> bool) {
        self.statuses.retain(|job, _| keep(job));
    }

    /// Read-only view of the table for persistence.
    pub fn statuses(&self) -> &StatusMap {
        &self.statuses
    }
}

#[cfg(test)]
#[path = "ledger_tests.rs"]
mod tests;
