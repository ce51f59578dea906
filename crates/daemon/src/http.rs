// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP listener: landing page and the metrics scrape.
//!
//! The scrape endpoint is the refresh trigger: each `GET /metrics` drives
//! one reconciliation pass, folds its emissions into the counter registry,
//! and renders the registry. Concurrent scrapes serialize on the driver's
//! pass lock.

use std::sync::Arc;

use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::metrics::BuildCounters;
use crate::refresh::RefreshDriver;

const TEXT_EXPOSITION: &str = "text/plain; version=0.0.4";

const INDEX_HTML: &str = r#"<html>
             <head><title>Tally</title></head>
             <body>
             <h1>Tally</h1>
             <p><a href='/metrics'>Metrics</a></p>
             </body>
             </html>"#;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub driver: Arc<RefreshDriver>,
    pub counters: Arc<BuildCounters>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/metrics", get(metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let report = state.driver.refresh().await;
    state.counters.apply(&report.events);
    state.counters.set_running(report.pending as u64);

    ([(CONTENT_TYPE, TEXT_EXPOSITION)], state.counters.render())
}
