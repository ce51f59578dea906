// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build result classification.
//!
//! Jenkins reports a build's result as free text. [`classify`] folds that
//! text into the closed [`BuildOutcome`] set and is total: anything that is
//! not one of the four known terminal strings — including the empty string a
//! still-running build reports — maps to `Pending`, never to an error,
//! because the caller polls builds that simply have not finished yet.

use serde::{Deserialize, Serialize};

/// Classification of a single build.
///
/// Serialized as snake_case tags in the status cache; an unknown tag fails
/// deserialization rather than silently misclassifying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildOutcome {
    Success,
    Failure,
    Unstable,
    Aborted,
    /// Not finished yet, or the result was unobtainable this cycle.
    Pending,
    /// Terminal outcome already surfaced to the counter layer, or observed
    /// as finished history before this process ever watched the build run.
    /// Bookkeeping only; never exported.
    Counted,
}

impl BuildOutcome {
    /// True for results that will never change.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            BuildOutcome::Success
                | BuildOutcome::Failure
                | BuildOutcome::Unstable
                | BuildOutcome::Aborted
        )
    }

    /// The state a build enters the ledger with when seen for the first time.
    ///
    /// A build that is already terminal on first sight finished before this
    /// process observed it, so it is recorded as counted history and never
    /// emitted. Everything else enters as `Pending` and is polled until it
    /// resolves.
    pub fn discovery_state(self) -> BuildOutcome {
        if self.is_terminal() {
            BuildOutcome::Counted
        } else {
            BuildOutcome::Pending
        }
    }
}

crate::simple_display! {
    BuildOutcome {
        Success => "success",
        Failure => "failure",
        Unstable => "unstable",
        Aborted => "aborted",
        Pending => "pending",
        Counted => "counted",
    }
}

/// Map a raw Jenkins result string to a [`BuildOutcome`].
pub fn classify(raw: &str) -> BuildOutcome {
    match raw {
        "SUCCESS" => BuildOutcome::Success,
        "FAILURE" => BuildOutcome::Failure,
        "UNSTABLE" => BuildOutcome::Unstable,
        "ABORTED" => BuildOutcome::Aborted,
        _ => BuildOutcome::Pending,
    }
}

#[cfg(test)]
#[path = "outcome_tests.rs"]
mod tests;
