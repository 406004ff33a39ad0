// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! HTTP server: router assembly, shared state, startup

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::predict::predict_handler;
use crate::config::ServiceConfig;
use crate::vision::annotate::Annotator;
use crate::vision::detector::Detector;

/// Shared, read-only per-process state, injected into handlers.
///
/// The detector is behind a trait object so tests can swap in a stub backend
/// without model files.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    pub detector: Arc<dyn Detector>,
    pub annotator: Arc<Annotator>,
}

impl AppState {
    pub fn new(
        config: Arc<ServiceConfig>,
        detector: Arc<dyn Detector>,
        annotator: Arc<Annotator>,
    ) -> Self {
        Self {
            config,
            detector,
            annotator,
        }
    }
}

/// Assemble the service router.
pub fn build_router(state: AppState) -> Router {
    // Leave headroom above the upload limit for multipart framing
    let body_limit = state.config.max_upload_bytes + 64 * 1024;

    Router::new()
        .route("/", get(home_handler))
        .route("/predict/", post(predict_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process exits.
pub async fn start_server(state: AppState) -> Result<(), Box<dyn std::error::Error>> {
    let addr = state.config.listen_addr().parse::<SocketAddr>()?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("API server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// GET / - static greeting confirming the service is reachable
pub async fn home_handler() -> Json<Value> {
    Json(json!({ "message": "Helmet Detection API is running!" }))
}
