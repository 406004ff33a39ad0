// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Predict endpoint handler

use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::Multipart;
use tracing::{debug, info, warn};

use crate::api::errors::ApiError;
use crate::api::http_server::AppState;
use crate::storage::TempUpload;
use crate::vision::image_utils::{decode_image_bytes, encode_jpeg};

/// POST /predict/ - Run helmet detection over an uploaded image
///
/// Accepts one multipart file field, runs the pretrained detector over it,
/// and streams back the annotated image.
///
/// # Request
/// - multipart form with a single file part (field name is not significant;
///   the first file part is used)
///
/// # Response
/// - 200: `image/jpeg` body with bounding boxes and labels drawn
/// - 400: missing/empty/undecodable upload
/// - 413: upload exceeds the configured size limit
/// - 500: inference or JPEG encoding failure
pub async fn predict_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidRequest(format!("malformed multipart body: {}", e)))?
    {
        // First file-named part wins; a plain part only serves as fallback
        let has_filename = field.file_name().is_some();
        if upload.is_some() && !has_filename {
            continue;
        }
        let filename = field.file_name().unwrap_or("upload").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::InvalidRequest(format!("failed to read upload: {}", e)))?;
        upload = Some((filename, bytes.to_vec()));
        if has_filename {
            break;
        }
    }

    let (filename, bytes) =
        upload.ok_or_else(|| ApiError::InvalidRequest("no file field in multipart form".into()))?;

    debug!("Predict request: {} ({} bytes)", filename, bytes.len());

    let jpeg = run_predict(&state, &filename, &bytes).await?;

    Ok(([(header::CONTENT_TYPE, "image/jpeg")], jpeg).into_response())
}

/// The request pipeline behind the multipart shim: save the upload, decode
/// it, run inference, annotate, clean up, encode. Kept as a plain function
/// so tests can drive it with raw bytes and a stub detector.
pub async fn run_predict(
    state: &AppState,
    client_filename: &str,
    bytes: &[u8],
) -> Result<Vec<u8>, ApiError> {
    if bytes.is_empty() {
        return Err(ApiError::InvalidRequest("uploaded file is empty".into()));
    }
    if bytes.len() > state.config.max_upload_bytes {
        return Err(ApiError::UploadTooLarge {
            size: bytes.len(),
            max: state.config.max_upload_bytes,
        });
    }

    // 1) Save upload to disk; the guard removes it on every exit path
    let upload = TempUpload::write(&state.config.upload_dir, client_filename, bytes)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    // 2) Read the persisted file back and decode it
    let file_bytes = std::fs::read(upload.path())
        .map_err(|e| ApiError::InternalError(format!("failed to read upload back: {}", e)))?;
    let (img, image_info) = decode_image_bytes(&file_bytes).map_err(|e| {
        warn!("Failed to decode upload {}: {}", client_filename, e);
        ApiError::InvalidRequest(format!("Invalid image: {}", e))
    })?;

    debug!(
        "Decoded image: {}x{}, {} bytes",
        image_info.width, image_info.height, image_info.size_bytes
    );

    // 3) Run inference
    let detections = state.detector.detect(&img).map_err(|e| {
        warn!("Inference failed: {}", e);
        ApiError::InferenceFailed(e.to_string())
    })?;

    info!(
        "Detection complete: {} objects in {}x{} image",
        detections.len(),
        image_info.width,
        image_info.height
    );

    // 4) Draw boxes & labels
    let mut canvas = img.to_rgb8();
    state.annotator.draw(&mut canvas, &detections);

    // 5) Transient file no longer needed once inference has run
    drop(upload);

    // 6) Encode as JPEG
    let jpeg = encode_jpeg(&canvas).map_err(|e| {
        warn!("JPEG encoding failed: {}", e);
        ApiError::EncodingFailed
    })?;

    Ok(jpeg)
}
