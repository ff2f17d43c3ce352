// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Maps [`HubError`] onto the JSON error body every HTTP route returns:
//! `{"error_code": "...", "detail": "..."}` with the status code carried on
//! each variant.

use agent_hub_core::HubError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error_code: &'static str,
    detail: String,
}

/// Newtype so route handlers can return `Result<Json<T>, ApiError>` and get
/// `?`-conversion from [`HubError`] for free.
pub struct ApiError(pub HubError);

impl From<HubError> for ApiError {
    fn from(e: HubError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(error_code = self.0.code(), detail = %self.0, "request failed");
        } else {
            tracing::warn!(error_code = self.0.code(), detail = %self.0, "request rejected");
        }
        let body = ErrorBody { error_code: self.0.code(), detail: self.0.to_string() };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
