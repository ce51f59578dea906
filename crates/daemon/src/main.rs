// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `tallyd` — Jenkins build-status exporter.

use std::process::ExitCode;
use std::sync::Arc;

use tally_adapters::{CiError, CiServer, JenkinsClient, JenkinsCredentials};
use tally_daemon::env::{Settings, SettingsError};
use tally_daemon::http::{router, AppState};
use tally_daemon::metrics::BuildCounters;
use tally_daemon::refresh::RefreshDriver;
use tally_storage::StatusCache;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
enum StartupError {
    #[error("configuration: {0}")]
    Settings(#[from] SettingsError),

    #[error("jenkins: {0}")]
    Ci(#[from] CiError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), StartupError> {
    let settings = Settings::from_env()?;

    let client = JenkinsClient::new(
        &settings.jenkins_url,
        JenkinsCredentials {
            user: settings.jenkins_user.clone(),
            api_token: settings.jenkins_api_token.clone(),
        },
    )?;
    client.connect().await?;
    info!(url = %settings.jenkins_url, "connected to Jenkins");

    let ci: Arc<dyn CiServer> = Arc::new(client);
    let jobs = RefreshDriver::discover_jobs(ci.as_ref(), &settings.view, &settings.job_filter).await?;
    info!(jobs = jobs.len(), view = %settings.view, "job set resolved");

    let driver =
        Arc::new(RefreshDriver::new(ci, StatusCache::new(&settings.cache_file), jobs));
    driver.initialize().await;

    let counters = Arc::new(BuildCounters::new(driver.jobs().iter().cloned()));
    let app = router(AppState { driver, counters });

    let listener = tokio::net::TcpListener::bind(settings.listen_addr).await?;
    info!(addr = %settings.listen_addr, "listening");
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}
