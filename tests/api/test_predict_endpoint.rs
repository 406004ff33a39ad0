// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Predict pipeline tests for POST /predict/
//!
//! These tests drive the request pipeline (save → decode → infer → annotate
//! → cleanup → encode) directly, with a stub detector standing in for the
//! ONNX model so no model files are needed. The real-model path is covered
//! by an `#[ignore]`d test at the bottom.

use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::anyhow;
use axum::http::StatusCode;
use helmet_detection_api::api::{run_predict, ApiError, AppState};
use helmet_detection_api::config::ServiceConfig;
use helmet_detection_api::vision::{
    decode_image_bytes, encode_jpeg, Annotator, Detection, Detector, YoloConfig, YoloDetector,
};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use tempfile::TempDir;

/// Stub backend returning a fixed set of detections.
struct StubDetector {
    detections: Vec<Detection>,
}

impl Detector for StubDetector {
    fn detect(&self, _image: &DynamicImage) -> anyhow::Result<Vec<Detection>> {
        Ok(self.detections.clone())
    }
}

/// Stub backend that always fails, for cleanup-path tests.
struct FailingDetector;

impl Detector for FailingDetector {
    fn detect(&self, _image: &DynamicImage) -> anyhow::Result<Vec<Detection>> {
        Err(anyhow!("inference exploded"))
    }
}

fn detection(label: &str, x1: f32, y1: f32, x2: f32, y2: f32) -> Detection {
    Detection {
        x1,
        y1,
        x2,
        y2,
        confidence: 0.91,
        class_id: 0,
        class_name: label.to_string(),
    }
}

/// Helper: state with an isolated upload dir and the given detections.
fn setup_state(detections: Vec<Detection>) -> (AppState, TempDir) {
    setup_state_with(Arc::new(StubDetector { detections }))
}

fn setup_state_with(detector: Arc<dyn Detector>) -> (AppState, TempDir) {
    let upload_dir = tempfile::tempdir().expect("Failed to create upload dir");
    let config = ServiceConfig {
        upload_dir: upload_dir.path().to_path_buf(),
        ..ServiceConfig::default()
    };
    let state = AppState::new(
        Arc::new(config),
        detector,
        Arc::new(Annotator::new("With Helmet", None)),
    );
    (state, upload_dir)
}

/// Helper: PNG bytes for a solid-color image.
fn png_bytes(width: u32, height: u32, color: Rgb<u8>) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, color);
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .expect("Failed to encode test PNG");
    buf
}

fn upload_dir_is_empty(dir: &TempDir) -> bool {
    std::fs::read_dir(dir.path()).unwrap().next().is_none()
}

// =============================================================================
// Success path
// =============================================================================

#[tokio::test]
async fn test_zero_detections_returns_reencoded_input() {
    let (state, _dir) = setup_state(vec![]);
    let input = png_bytes(32, 24, Rgb([90, 130, 170]));

    let jpeg = run_predict(&state, "photo.png", &input).await.unwrap();

    // Byte-for-byte what the undecorated input re-encodes to
    let (decoded_input, _) = decode_image_bytes(&input).unwrap();
    let expected = encode_jpeg(&decoded_input.to_rgb8()).unwrap();
    assert_eq!(jpeg, expected);
}

#[tokio::test]
async fn test_response_is_decodable_jpeg_with_input_dimensions() {
    let (state, _dir) = setup_state(vec![]);
    let input = png_bytes(40, 30, Rgb([10, 20, 30]));

    let jpeg = run_predict(&state, "photo.png", &input).await.unwrap();

    let (img, info) = decode_image_bytes(&jpeg).unwrap();
    assert_eq!(info.format, ImageFormat::Jpeg);
    assert_eq!(img.width(), 40);
    assert_eq!(img.height(), 30);
}

#[tokio::test]
async fn test_safe_label_draws_green_box_at_coordinates() {
    let (state, _dir) = setup_state(vec![detection("With Helmet", 16.0, 16.0, 48.0, 48.0)]);
    let input = png_bytes(64, 64, Rgb([128, 128, 128]));

    let jpeg = run_predict(&state, "photo.png", &input).await.unwrap();

    let (img, _) = decode_image_bytes(&jpeg).unwrap();
    let px = img.to_rgb8().get_pixel(16, 16).0;
    // JPEG is lossy; assert channel dominance rather than exact values
    assert!(
        px[1] > px[0] + 40 && px[1] > px[2] + 40,
        "Expected green-dominant pixel at box corner, got {:?}",
        px
    );
}

#[tokio::test]
async fn test_other_label_draws_red_box_at_coordinates() {
    let (state, _dir) = setup_state(vec![detection("Without Helmet", 16.0, 16.0, 48.0, 48.0)]);
    let input = png_bytes(64, 64, Rgb([128, 128, 128]));

    let jpeg = run_predict(&state, "photo.png", &input).await.unwrap();

    let (img, _) = decode_image_bytes(&jpeg).unwrap();
    let px = img.to_rgb8().get_pixel(16, 16).0;
    assert!(
        px[0] > px[1] + 40 && px[0] > px[2] + 40,
        "Expected red-dominant pixel at box corner, got {:?}",
        px
    );
}

// =============================================================================
// Transient file lifecycle
// =============================================================================

#[tokio::test]
async fn test_transient_file_removed_after_success() {
    let (state, dir) = setup_state(vec![]);
    let input = png_bytes(16, 16, Rgb([0, 0, 0]));

    run_predict(&state, "photo.png", &input).await.unwrap();

    assert!(upload_dir_is_empty(&dir));
}

#[tokio::test]
async fn test_transient_file_removed_after_inference_failure() {
    let (state, dir) = setup_state_with(Arc::new(FailingDetector));
    let input = png_bytes(16, 16, Rgb([0, 0, 0]));

    let result = run_predict(&state, "photo.png", &input).await;

    assert!(matches!(result, Err(ApiError::InferenceFailed(_))));
    assert!(upload_dir_is_empty(&dir));
}

#[tokio::test]
async fn test_transient_file_removed_after_decode_failure() {
    let (state, dir) = setup_state(vec![]);

    let result = run_predict(&state, "junk.bin", &[0x00, 0x01, 0x02, 0x03, 0x04]).await;

    assert!(result.is_err());
    assert!(upload_dir_is_empty(&dir));
}

#[tokio::test]
async fn test_concurrent_uploads_with_identical_filename_are_isolated() {
    let (state, dir) = setup_state(vec![]);
    let red = png_bytes(16, 16, Rgb([200, 0, 0]));
    let blue = png_bytes(16, 16, Rgb([0, 0, 200]));

    let (a, b) = tokio::join!(
        run_predict(&state, "photo.jpg", &red),
        run_predict(&state, "photo.jpg", &blue),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    // Each request gets its own bytes back, not the other request's
    let (expected_a, _) = decode_image_bytes(&red).unwrap();
    let (expected_b, _) = decode_image_bytes(&blue).unwrap();
    assert_eq!(a, encode_jpeg(&expected_a.to_rgb8()).unwrap());
    assert_eq!(b, encode_jpeg(&expected_b.to_rgb8()).unwrap());

    assert!(upload_dir_is_empty(&dir));
}

// =============================================================================
// Rejected uploads
// =============================================================================

#[tokio::test]
async fn test_empty_upload_is_rejected_with_400() {
    let (state, dir) = setup_state(vec![]);

    let result = run_predict(&state, "photo.png", &[]).await;

    let err = result.unwrap_err();
    assert!(matches!(err, ApiError::InvalidRequest(_)));
    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    assert!(upload_dir_is_empty(&dir));
}

#[tokio::test]
async fn test_undecodable_upload_is_rejected_with_400() {
    let (state, _dir) = setup_state(vec![]);

    let result = run_predict(&state, "junk.bin", b"definitely not an image").await;

    let err = result.unwrap_err();
    assert!(matches!(err, ApiError::InvalidRequest(_)));
    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_oversized_upload_is_rejected() {
    let (state, dir) = setup_state(vec![]);
    let max = state.config.max_upload_bytes;

    let result = run_predict(&state, "big.png", &vec![0u8; max + 1]).await;

    let err = result.unwrap_err();
    assert!(matches!(err, ApiError::UploadTooLarge { .. }));
    assert_eq!(err.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(upload_dir_is_empty(&dir));
}

// =============================================================================
// Real model (integration)
// =============================================================================

#[tokio::test]
#[ignore] // Requires model files
async fn test_predict_with_real_model() {
    let model_path = std::env::var("MODEL_PATH").unwrap_or_else(|_| "./models/best.onnx".into());
    let detector = YoloDetector::new(YoloConfig {
        model_path: PathBuf::from(model_path),
        ..YoloConfig::default()
    })
    .expect("Failed to load detection model");

    let (state, dir) = setup_state_with(Arc::new(detector));
    let input = png_bytes(640, 640, Rgb([128, 128, 128]));

    let jpeg = run_predict(&state, "photo.png", &input).await.unwrap();

    let (img, info) = decode_image_bytes(&jpeg).unwrap();
    assert_eq!(info.format, ImageFormat::Jpeg);
    assert_eq!(img.width(), 640);
    assert!(upload_dir_is_empty(&dir));
}
