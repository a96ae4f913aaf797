//! Local endpoints: health, client config and image upload.

use axum::{
    body::Body,
    extract::{FromRequest, Multipart},
    http::Request,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use crate::error::GatewayError;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::storage::UploadError;

pub fn health(state: &AppState) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "uploadDir": state.uploads.dir().display().to_string(),
    }))
}

/// Settings the browser interface needs to reach the terminal.
pub fn config(state: &AppState) -> Json<Value> {
    Json(json!({
        "ttydPort": state.config.terminal.port,
        "uploadDir": state.uploads.dir().display().to_string(),
    }))
}

pub async fn upload(state: &AppState, request: Request<Body>) -> Response {
    let multipart = match Multipart::from_request(request, &()).await {
        Ok(multipart) => multipart,
        Err(rejection) => {
            let err = UploadError::Malformed(rejection.body_text());
            tracing::warn!(error = %err, "Upload rejected");
            return GatewayError::from(err).into_response();
        }
    };

    match state.uploads.receive(multipart).await {
        Ok(stored) => {
            tracing::info!(
                path = %stored.path,
                size_kb = %format!("{:.2}", stored.size as f64 / 1024.0),
                "Image uploaded"
            );
            metrics::record_upload(stored.size);
            Json(stored).into_response()
        }
        Err(err) => {
            if !matches!(err, UploadError::Io(_)) {
                tracing::warn!(error = %err, "Upload rejected");
            }
            GatewayError::from(err).into_response()
        }
    }
}
