// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Raw model output decoding and non-max suppression

use std::collections::HashMap;

use anyhow::Result;
use ndarray::ArrayViewD;

use super::labels::ClassLabels;
use super::Detection;

/// Per-class non-max suppression.
pub fn nms(detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    if detections.is_empty() {
        return detections;
    }

    // Group detections by class_id
    let mut class_groups: HashMap<u32, Vec<Detection>> = HashMap::new();
    for detection in detections {
        class_groups
            .entry(detection.class_id)
            .or_default()
            .push(detection);
    }

    let mut all_results = Vec::new();

    // Apply NMS separately to each class
    for (_, mut class_detections) in class_groups {
        // Sort by confidence score in descending order
        class_detections.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap());

        let mut suppressed = vec![false; class_detections.len()];

        for i in 0..class_detections.len() {
            if suppressed[i] {
                continue;
            }

            // Suppress overlapping detections within the same class
            for j in (i + 1)..class_detections.len() {
                if !suppressed[j] && class_detections[i].iou(&class_detections[j]) > iou_threshold {
                    suppressed[j] = true;
                }
            }
        }

        all_results.extend(
            class_detections
                .into_iter()
                .zip(suppressed)
                .filter(|(_, s)| !*s)
                .map(|(d, _)| d),
        );
    }

    all_results
}

/// Decode the raw `[1, 4 + num_classes, num_boxes]` YOLO output into
/// confidence-filtered, NMS-pruned detections in source-image coordinates.
pub fn postprocess_output(
    output: &ArrayViewD<'_, f32>,
    labels: &ClassLabels,
    confidence_threshold: f32,
    iou_threshold: f32,
    img_width: u32,
    img_height: u32,
    model_size: u32,
) -> Result<Vec<Detection>> {
    let shape = output.shape();
    if shape.len() != 3 {
        anyhow::bail!("Expected 3D model output, got {}D", shape.len());
    }
    if shape[1] < 5 {
        anyhow::bail!(
            "Expected output layout [1, 4 + num_classes, boxes], got {:?}",
            shape
        );
    }
    let num_classes = shape[1] - 4;
    let num_boxes = shape[2];

    let scale_x = img_width as f32 / model_size as f32;
    let scale_y = img_height as f32 / model_size as f32;

    let mut detections = Vec::new();

    for i in 0..num_boxes {
        // Box coordinates (first 4 values, center format)
        let x_center = output[[0, 0, i]];
        let y_center = output[[0, 1, i]];
        let width = output[[0, 2, i]];
        let height = output[[0, 3, i]];

        // Find the class with highest confidence
        let mut max_confidence = 0.0;
        let mut best_class_id = 0;
        for class_idx in 0..num_classes {
            let class_confidence = output[[0, 4 + class_idx, i]];
            if class_confidence > max_confidence {
                max_confidence = class_confidence;
                best_class_id = class_idx as u32;
            }
        }

        if max_confidence > confidence_threshold {
            // Convert from center coordinates to corner coordinates and
            // scale back to the source image size
            let x1 = (x_center - width / 2.0) * scale_x;
            let y1 = (y_center - height / 2.0) * scale_y;
            let x2 = (x_center + width / 2.0) * scale_x;
            let y2 = (y_center + height / 2.0) * scale_y;

            detections.push(Detection {
                x1,
                y1,
                x2,
                y2,
                confidence: max_confidence,
                class_id: best_class_id,
                class_name: labels.name(best_class_id),
            });
        }
    }

    let mut detections = nms(detections, iou_threshold);

    // Sort by confidence in descending order
    detections.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap());

    Ok(detections)
}
