// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Service configuration from environment variables

use std::env;
use std::path::PathBuf;

/// Runtime configuration for the detection service.
///
/// Every knob has a default so the service starts with no environment at
/// all (apart from the model artifact having to exist on disk).
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Bind host
    pub host: String,
    /// Bind port
    pub port: u16,
    /// Path to the ONNX detection model artifact
    pub model_path: PathBuf,
    /// Working directory for transient per-request uploads
    pub upload_dir: PathBuf,
    /// Optional TTF font for label text; without it boxes are drawn unlabeled
    pub font_path: Option<PathBuf>,
    /// The class rendered green; every other class renders red
    pub safe_label: String,
    /// Minimum confidence for a detection to be reported
    pub confidence_threshold: f32,
    /// IoU threshold for non-max suppression
    pub iou_threshold: f32,
    /// Square input resolution of the model export
    pub model_input_size: u32,
    /// Maximum accepted upload size in bytes
    pub max_upload_bytes: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            model_path: PathBuf::from("./models/best.onnx"),
            upload_dir: PathBuf::from("./temp_images"),
            font_path: None,
            safe_label: "With Helmet".to_string(),
            confidence_threshold: 0.25,
            iou_threshold: 0.45,
            model_input_size: 640,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

impl ServiceConfig {
    /// Parse configuration from environment variables, falling back to the
    /// defaults above for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let host = env::var("API_HOST").unwrap_or(defaults.host);
        let port = env::var("API_PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(defaults.port);
        let model_path = env::var("MODEL_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.model_path);
        let upload_dir = env::var("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.upload_dir);
        let font_path = env::var("FONT_PATH").ok().map(PathBuf::from);
        let safe_label = env::var("SAFE_LABEL").unwrap_or(defaults.safe_label);
        let confidence_threshold = env::var("CONFIDENCE_THRESHOLD")
            .ok()
            .and_then(|v| v.parse::<f32>().ok())
            .unwrap_or(defaults.confidence_threshold);
        let iou_threshold = env::var("IOU_THRESHOLD")
            .ok()
            .and_then(|v| v.parse::<f32>().ok())
            .unwrap_or(defaults.iou_threshold);
        let model_input_size = env::var("MODEL_INPUT_SIZE")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(defaults.model_input_size);
        let max_upload_bytes = env::var("MAX_UPLOAD_SIZE")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(defaults.max_upload_bytes);

        Self {
            host,
            port,
            model_path,
            upload_dir,
            font_path,
            safe_label,
            confidence_threshold,
            iou_threshold,
            model_input_size,
            max_upload_bytes,
        }
    }

    /// `host:port` string for the TCP listener.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
