// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use std::{env, sync::Arc};

use anyhow::{Context, Result};
use helmet_detection_api::{
    api::{start_server, AppState},
    config::ServiceConfig,
    storage,
    vision::{Annotator, YoloConfig, YoloDetector},
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    let config = ServiceConfig::from_env();

    storage::init_upload_dir(&config.upload_dir)?;
    tracing::info!("📁 Upload directory ready at {}", config.upload_dir.display());

    let detector = YoloDetector::new(YoloConfig {
        model_path: config.model_path.clone(),
        input_size: config.model_input_size,
        confidence_threshold: config.confidence_threshold,
        iou_threshold: config.iou_threshold,
    })
    .context("Failed to load detection model")?;
    tracing::info!(
        "✅ Detection model loaded from {} ({} classes)",
        config.model_path.display(),
        detector.labels().len()
    );

    let annotator = Annotator::from_font_path(config.safe_label.clone(), config.font_path.as_deref())
        .context("Failed to load label font")?;
    if !annotator.has_font() {
        tracing::warn!("⚠️ No FONT_PATH configured; boxes will be drawn without text labels");
    }

    let state = AppState::new(
        Arc::new(config),
        Arc::new(detector),
        Arc::new(annotator),
    );

    start_server(state)
        .await
        .map_err(|e| anyhow::anyhow!("API server error: {}", e))?;

    Ok(())
}
