// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Object detection boundary
//!
//! The request handler only depends on the [`Detector`] trait; the pretrained
//! model sits behind it as an opaque collaborator. [`YoloDetector`] is the
//! ONNX Runtime backend used in production.

pub mod labels;
pub mod postprocessing;
pub mod preprocessing;
pub mod yolo;

use image::DynamicImage;
use serde::Serialize;

pub use labels::ClassLabels;
pub use yolo::{YoloConfig, YoloDetector};

/// One model-reported object instance: box + class + confidence.
///
/// Coordinates are in source-image pixel space (already scaled back from the
/// model's input resolution).
#[derive(Debug, Clone, Serialize)]
pub struct Detection {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub confidence: f32,
    pub class_id: u32,
    pub class_name: String,
}

impl Detection {
    pub fn area(&self) -> f32 {
        (self.x2 - self.x1) * (self.y2 - self.y1)
    }

    pub fn intersection_area(&self, other: &Detection) -> f32 {
        let x1 = self.x1.max(other.x1);
        let y1 = self.y1.max(other.y1);
        let x2 = self.x2.min(other.x2);
        let y2 = self.y2.min(other.y2);

        if x2 > x1 && y2 > y1 {
            (x2 - x1) * (y2 - y1)
        } else {
            0.0
        }
    }

    pub fn iou(&self, other: &Detection) -> f32 {
        let intersection = self.intersection_area(other);
        let union = self.area() + other.area() - intersection;

        if union > 0.0 {
            intersection / union
        } else {
            0.0
        }
    }
}

/// Inference backend seam.
///
/// Implemented by [`YoloDetector`] in production and by stub backends in
/// tests, so the request pipeline can run without model files on disk.
pub trait Detector: Send + Sync {
    /// Run inference on a decoded image and return detections in
    /// source-image pixel coordinates.
    fn detect(&self, image: &DynamicImage) -> anyhow::Result<Vec<Detection>>;
}
