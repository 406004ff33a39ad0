// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod errors;
pub mod http_server;
pub mod predict;

pub use errors::{ApiError, ErrorBody};
pub use http_server::{build_router, home_handler, start_server, AppState};
pub use predict::{predict_handler, run_predict};
