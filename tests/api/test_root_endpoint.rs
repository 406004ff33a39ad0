// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Root endpoint tests for GET /
//!
//! The root endpoint is a static greeting with no logic and no side effects.

use helmet_detection_api::api::home_handler;

#[tokio::test]
async fn test_root_returns_fixed_greeting() {
    let body = home_handler().await.0;

    assert_eq!(body["message"], "Helmet Detection API is running!");
}

#[tokio::test]
async fn test_root_is_stable_across_calls() {
    let first = home_handler().await.0;
    let second = home_handler().await.0;

    assert_eq!(first, second);
}
