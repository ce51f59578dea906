// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Jenkins REST adapter.
//!
//! Thin client over the Jenkins JSON API with basic auth. Uses `tree=`
//! projections so the server only serializes the fields we read. Requests
//! carry a timeout; a hung fetch surfaces as a per-build fetch failure, not
//! a stuck reconciliation pass.

use crate::ci::{CiError, CiServer};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Basic-auth credentials (Jenkins user + API token).
#[derive(Debug, Clone)]
pub struct JenkinsCredentials {
    pub user: String,
    pub api_token: String,
}

/// Client for one Jenkins instance.
pub struct JenkinsClient {
    http: reqwest::Client,
    base_url: String,
    credentials: JenkinsCredentials,
}

#[derive(Debug, Deserialize)]
struct ViewDetail {
    #[serde(default)]
    jobs: Vec<JobRef>,
}

#[derive(Debug, Deserialize)]
struct JobRef {
    name: String,
}

#[derive(Debug, Deserialize)]
struct JobDetail {
    #[serde(rename = "allBuilds", default)]
    all_builds: Vec<BuildRef>,
}

#[derive(Debug, Deserialize)]
struct BuildRef {
    number: i64,
}

#[derive(Debug, Deserialize)]
struct BuildDetail {
    /// Jenkins reports null until the build finishes.
    #[serde(default)]
    result: Option<String>,
}

impl JenkinsClient {
    pub fn new(
        base_url: impl Into<String>,
        credentials: JenkinsCredentials,
    ) -> Result<Self, CiError> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { http, base_url, credentials })
    }

    /// Validate connectivity and credentials against the server root.
    ///
    /// Called once at startup; a failure here is fatal, unlike the
    /// per-build failures during reconciliation.
    pub async fn connect(&self) -> Result<(), CiError> {
        let url = format!("{}/api/json?tree=mode", self.base_url);
        self.get_json::<serde_json::Value>(url).await.map(|_| ())
    }

    fn view_url(&self, view: &str) -> String {
        format!("{}/view/{view}/api/json?tree=jobs[name]", self.base_url)
    }

    fn job_url(&self, job: &str) -> String {
        format!("{}/job/{job}/api/json?tree=allBuilds[number]", self.base_url)
    }

    fn build_url(&self, job: &str, number: i64) -> String {
        format!("{}/job/{job}/{number}/api/json?tree=result", self.base_url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<T, CiError> {
        debug!(url = %url, "jenkins GET");
        let response = self
            .http
            .get(&url)
            .basic_auth(&self.credentials.user, Some(&self.credentials.api_token))
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(CiError::NotFound(url));
        }
        if !status.is_success() {
            return Err(CiError::Api { status: status.as_u16(), url });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl CiServer for JenkinsClient {
    async fn list_jobs(&self, view: &str) -> Result<Vec<String>, CiError> {
        let detail: ViewDetail = self.get_json(self.view_url(view)).await?;
        Ok(detail.jobs.into_iter().map(|job| job.name).collect())
    }

    async fn list_build_numbers(&self, job: &str) -> Result<Vec<i64>, CiError> {
        let detail: JobDetail = self.get_json(self.job_url(job)).await?;
        Ok(detail.all_builds.into_iter().map(|build| build.number).collect())
    }

    async fn fetch_raw_result(&self, job: &str, number: i64) -> Result<String, CiError> {
        let detail: BuildDetail = self.get_json(self.build_url(job, number)).await?;
        Ok(detail.result.unwrap_or_default())
    }
}

#[cfg(test)]
#[path = "jenkins_tests.rs"]
mod tests;
