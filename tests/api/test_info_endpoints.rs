// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Tests for GET /, /health and /model-info

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    response::Response,
};
use car_parts_detector::api::{create_app, AppState};
use serde_json::Value;
use tower::util::ServiceExt; // for `oneshot`

use crate::common::{pipeline, FakeDetector};

async fn get(state: AppState, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    create_app(state).oneshot(request).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn loaded_state() -> AppState {
    let state = AppState::new_for_test();
    state.set_pipeline(pipeline(FakeDetector::new(vec![]))).await;
    state
}

#[tokio::test]
async fn test_root_lists_endpoints() {
    let response = get(AppState::new_for_test(), "/").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["status"], "online");
    assert_eq!(json["message"], "Car Parts Detection API is running");
    assert_eq!(json["version"], "1.0.0");
    assert!(json["timestamp"].is_string());
    assert_eq!(json["endpoints"]["health"], "/health");
    assert_eq!(json["endpoints"]["detect"], "/detect");
    assert_eq!(json["endpoints"]["model_info"], "/model-info");
}

#[tokio::test]
async fn test_health_without_model() {
    let json = json_body(get(AppState::new_for_test(), "/health").await).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["model_loaded"], false);
}

#[tokio::test]
async fn test_health_with_model() {
    let json = json_body(get(loaded_state().await, "/health").await).await;
    assert_eq!(json["model_loaded"], true);
}

#[tokio::test]
async fn test_model_info_without_model() {
    let response = get(AppState::new_for_test(), "/model-info").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let json = json_body(response).await;
    assert_eq!(json["error_type"], "service_unavailable");
}

#[tokio::test]
async fn test_model_info_reports_model() {
    let response = get(loaded_state().await, "/model-info").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["model_type"], "YOLOv8");
    assert_eq!(json["model_path"], "models/car_parts_detector.onnx");
    assert_eq!(json["model_size"], "1.00 MB");
    assert_eq!(json["device"], "cpu");
    assert_eq!(json["classes"]["0"], "front_bumper");
    assert_eq!(json["classes"]["1"], "hood");
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let request = Request::builder()
        .method(Method::GET)
        .uri("/health")
        .header("origin", "http://example.com")
        .body(Body::empty())
        .unwrap();
    let response = create_app(AppState::new_for_test())
        .oneshot(request)
        .await
        .unwrap();

    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "*"
    );
}

#[tokio::test]
async fn test_detect_rejects_get() {
    let response = get(AppState::new_for_test(), "/detect").await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
