// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.
//!
//! Everything is resolved once at startup. Missing connection settings are
//! fatal; everything else has a stated default.

use std::net::SocketAddr;
use std::path::PathBuf;

use regex::Regex;
use thiserror::Error;

pub const JENKINS_URL_VAR: &str = "JENKINS_URL";
pub const JENKINS_USER_VAR: &str = "JENKINS_USER";
pub const JENKINS_API_TOKEN_VAR: &str = "JENKINS_API_TOKEN";
pub const CACHE_FILE_VAR: &str = "CACHE_FILE_LOCATION";
pub const VIEW_VAR: &str = "JENKINS_VIEW";
pub const JOB_FILTER_VAR: &str = "JENKINS_JOB_FILTER_REGEX";
pub const LISTEN_ADDR_VAR: &str = "LISTEN_ADDRESS";

const CACHE_FILE_DEFAULT: &str = "/cache/buildStatusCache.json";
const VIEW_DEFAULT: &str = "All";
const JOB_FILTER_DEFAULT: &str = ".*";
const LISTEN_ADDR_DEFAULT: &str = "0.0.0.0:3000";

/// Configuration errors. The only fatal error class in the process.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("environment variable '{0}' empty or not set")]
    Missing(&'static str),

    #[error("invalid {name}: {message}")]
    Invalid { name: &'static str, message: String },
}

/// Process configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Jenkins base URL.
    pub jenkins_url: String,
    pub jenkins_user: String,
    pub jenkins_api_token: String,
    /// Where the status cache lives across restarts.
    pub cache_file: PathBuf,
    /// View whose jobs are tracked.
    pub view: String,
    /// Only jobs whose name matches are tracked.
    pub job_filter: Regex,
    /// Address the scrape endpoint binds to.
    pub listen_addr: SocketAddr,
}

impl Settings {
    pub fn from_env() -> Result<Self, SettingsError> {
        let job_filter =
            Regex::new(&env_or(JOB_FILTER_VAR, JOB_FILTER_DEFAULT)).map_err(|e| {
                SettingsError::Invalid { name: JOB_FILTER_VAR, message: e.to_string() }
            })?;

        let listen_addr = env_or(LISTEN_ADDR_VAR, LISTEN_ADDR_DEFAULT).parse().map_err(
            |e: std::net::AddrParseError| SettingsError::Invalid {
                name: LISTEN_ADDR_VAR,
                message: e.to_string(),
            },
        )?;

        Ok(Self {
            jenkins_url: required(JENKINS_URL_VAR)?,
            jenkins_user: required(JENKINS_USER_VAR)?,
            jenkins_api_token: required(JENKINS_API_TOKEN_VAR)?,
            cache_file: PathBuf::from(env_or(CACHE_FILE_VAR, CACHE_FILE_DEFAULT)),
            view: env_or(VIEW_VAR, VIEW_DEFAULT),
            job_filter,
            listen_addr,
        })
    }
}

/// Required setting: unset or empty is a startup error.
fn required(name: &'static str) -> Result<String, SettingsError> {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(SettingsError::Missing(name)),
    }
}

/// Optional setting: unset or empty falls back to the default.
fn env_or(name: &str, default: &str) -> String {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => value,
        _ => default.to_string(),
    }
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
