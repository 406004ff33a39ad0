// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Helmet Detection API
//!
//! A single-endpoint HTTP service: upload an image, get it back as JPEG with
//! helmet detections drawn on it. Detection itself is delegated to a
//! pretrained ONNX model loaded once at startup.

pub mod api;
pub mod config;
pub mod storage;
pub mod vision;

pub use api::{start_server, AppState};
pub use config::ServiceConfig;
