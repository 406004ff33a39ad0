// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Predict endpoint: annotated object detection over an uploaded image

pub mod handler;

pub use handler::{predict_handler, run_predict};
