// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tally-adapters: the CI server seam and its Jenkins implementation.

pub mod ci;
pub mod jenkins;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

pub use ci::{CiError, CiServer};
pub use jenkins::{JenkinsClient, JenkinsCredentials};

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeCiServer;
