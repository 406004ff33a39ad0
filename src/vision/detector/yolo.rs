// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! ONNX Runtime backend for the pretrained YOLO helmet detector
//!
//! The session is loaded once at process startup and shared read-only across
//! requests; inference calls serialize on an internal mutex because the ort
//! session is stateful.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use image::DynamicImage;
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use tracing::{debug, warn};

use super::labels::ClassLabels;
use super::postprocessing::postprocess_output;
use super::preprocessing::preprocess_image;
use super::{Detection, Detector};

/// Configuration for loading the detection model
#[derive(Debug, Clone)]
pub struct YoloConfig {
    /// Path to the ONNX model artifact
    pub model_path: PathBuf,
    /// Square input resolution the model was exported with
    pub input_size: u32,
    /// Minimum confidence for a detection to be reported
    pub confidence_threshold: f32,
    /// IoU threshold for non-max suppression
    pub iou_threshold: f32,
}

impl Default for YoloConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("./models/best.onnx"),
            input_size: 640,
            confidence_threshold: 0.25,
            iou_threshold: 0.45,
        }
    }
}

/// ONNX-based YOLO object detector.
pub struct YoloDetector {
    /// ONNX Runtime session (wrapped in Arc<Mutex> for thread-safe shared access)
    session: Arc<Mutex<Session>>,

    /// Class-index → label lookup from the model artifact's metadata
    labels: ClassLabels,

    input_size: u32,
    confidence_threshold: f32,
    iou_threshold: f32,
}

impl std::fmt::Debug for YoloDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YoloDetector")
            .field("input_size", &self.input_size)
            .field("confidence_threshold", &self.confidence_threshold)
            .field("iou_threshold", &self.iou_threshold)
            .field("num_classes", &self.labels.len())
            .finish_non_exhaustive()
    }
}

impl YoloDetector {
    /// Load the detection model from disk.
    ///
    /// # Errors
    /// Returns an error if the model file is missing or ONNX Runtime fails to
    /// initialize the session. A missing `names` metadata entry is tolerated:
    /// labels then fall back to `class_<id>`.
    pub fn new(config: YoloConfig) -> Result<Self> {
        if !config.model_path.exists() {
            anyhow::bail!(
                "ONNX model file not found: {}",
                config.model_path.display()
            );
        }

        let session = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(4)
            .context("Failed to set intra threads")?
            .commit_from_file(&config.model_path)
            .with_context(|| {
                format!(
                    "Failed to load ONNX model from {}",
                    config.model_path.display()
                )
            })?;

        let labels = Self::load_labels(&session, &config.model_path)?;

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            labels,
            input_size: config.input_size,
            confidence_threshold: config.confidence_threshold,
            iou_threshold: config.iou_threshold,
        })
    }

    fn load_labels(session: &Session, model_path: &Path) -> Result<ClassLabels> {
        let metadata = session
            .metadata()
            .context("Failed to read model metadata")?;

        match metadata.custom("names") {
            Ok(Some(raw)) => ClassLabels::parse(&raw).with_context(|| {
                format!(
                    "Failed to parse `names` metadata of {}",
                    model_path.display()
                )
            }),
            _ => {
                warn!(
                    "⚠️ Model {} carries no `names` metadata; labels fall back to class_<id>",
                    model_path.display()
                );
                Ok(ClassLabels::default())
            }
        }
    }

    /// The label lookup loaded from the model artifact.
    pub fn labels(&self) -> &ClassLabels {
        &self.labels
    }
}

impl Detector for YoloDetector {
    fn detect(&self, image: &DynamicImage) -> Result<Vec<Detection>> {
        let img_width = image.width();
        let img_height = image.height();

        let input = preprocess_image(image, self.input_size)?;

        // Lock session for thread-safe access
        let mut session = self.session.lock().unwrap();
        let outputs = session.run(ort::inputs![
            "images" => Value::from_array(input)?
        ])?;

        let output = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract output tensor")?;

        let detections = postprocess_output(
            &output,
            &self.labels,
            self.confidence_threshold,
            self.iou_threshold,
            img_width,
            img_height,
            self.input_size,
        )?;

        debug!(
            "Inference complete: {} detections on {}x{} input",
            detections.len(),
            img_width,
            img_height
        );

        Ok(detections)
    }
}
