// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Health routes mounted on the engine listener.

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::timeout::{RequestBodyTimeoutLayer, TimeoutLayer};
use tower_http::trace::TraceLayer;

use crate::domain::config::ServerTimeouts;

/// `/healthz` and `/readyz`, traced. `http_read` bounds reading the request
/// body and `http_write` bounds producing the response. Header and idle
/// limits belong to the connection, not the router.
pub fn health_router(timeouts: &ServerTimeouts) -> Router {
    let mut router = Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .layer(TraceLayer::new_for_http());

    if let Some(write) = timeouts.write() {
        router = router.layer(TimeoutLayer::new(write));
    }
    if let Some(read) = timeouts.read() {
        router = router.layer(RequestBodyTimeoutLayer::new(read));
    }
    router
}

async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn readyz() -> Json<Value> {
    Json(json!({ "status": "ready" }))
}
