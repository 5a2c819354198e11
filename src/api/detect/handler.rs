// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection endpoint handler

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use axum_extra::extract::Multipart;
use tracing::{debug, error, info, warn};

use super::response::{DetectErrorResponse, DetectResponse};
use crate::api::errors::ApiError;
use crate::api::handlers::timestamp;
use crate::api::http_server::AppState;
use crate::detection::UploadedPart;

/// Name of the multipart field carrying the image
pub const FILE_FIELD: &str = "file";

/// POST /detect - Detect car parts in an uploaded image
///
/// # Request
/// `multipart/form-data` with the image in the `file` part.
///
/// # Response
/// The detection result (`status`, `is_car`, `detections`,
/// `total_detections`, `processing_time_ms`) plus `timestamp`.
///
/// # Errors
/// - 400 Bad Request: malformed multipart body or no `file` part
/// - 413 Payload Too Large: upload over `server.max_upload_bytes`
/// - 503 Service Unavailable: model not loaded
/// - 500 Internal Server Error: decode or inference failed
pub async fn detect_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let pipeline = state.pipeline().await.ok_or_else(|| {
        warn!("Detection requested without a loaded model");
        ApiError::ServiceUnavailable("Model not loaded".to_string())
    })?;

    let limit = state.config.server.max_upload_bytes;
    let part = read_file_part(&mut multipart, limit).await?;

    info!(
        "Received image: {}, content_type: {}",
        part.file_name.as_deref().unwrap_or("<none>"),
        part.content_type.as_deref().unwrap_or("<none>")
    );

    let result = tokio::task::spawn_blocking(move || pipeline.detect_upload(part))
        .await
        .map_err(|e| {
            error!("Detection task failed: {}", e);
            ApiError::InternalError(format!("Detection task failed: {}", e))
        })?;

    if let Some(message) = result.error_message() {
        error!("Error in car detection: {}", message);
        let body = DetectErrorResponse::new(message, timestamp());
        return Ok((StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response());
    }

    Ok(Json(DetectResponse {
        result,
        timestamp: timestamp(),
    })
    .into_response())
}

/// Pull the `file` field out of the form, skipping any other fields
async fn read_file_part(multipart: &mut Multipart, limit: usize) -> Result<UploadedPart, ApiError> {
    loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| multipart_error(e, limit))?
            .ok_or_else(|| ApiError::ValidationError {
                field: FILE_FIELD.to_string(),
                message: "No file part in request".to_string(),
            })?;

        if field.name() != Some(FILE_FIELD) {
            debug!("Skipping multipart field {:?}", field.name());
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.map_err(|e| multipart_error(e, limit))?;

        return Ok(UploadedPart {
            file_name,
            content_type,
            data,
        });
    }
}

fn multipart_error(err: axum_extra::extract::multipart::MultipartError, limit: usize) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        warn!("Upload rejected: over {} bytes", limit);
        ApiError::PayloadTooLarge { limit }
    } else {
        warn!("Malformed multipart body: {}", err.body_text());
        ApiError::InvalidRequest(format!("Malformed multipart body: {}", err.body_text()))
    }
}
