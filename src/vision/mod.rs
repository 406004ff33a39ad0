// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision processing module
//!
//! This module provides:
//! - Image decoding/encoding utilities for the upload and response paths
//! - The object detection boundary (trait + ONNX YOLO backend)
//! - Bounding box and label rendering

pub mod annotate;
pub mod detector;
pub mod image_utils;

pub use annotate::Annotator;
pub use detector::{ClassLabels, Detection, Detector, YoloConfig, YoloDetector};
pub use image_utils::{decode_image_bytes, detect_format, encode_jpeg, ImageError, ImageInfo};
