//! The JSON envelope every endpoint answers with, and the mapping from the
//! domain error taxonomy onto HTTP statuses.

use ams_core::common::error::MarketError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Json<Self> {
        Json(ApiResponse {
            success: true,
            message: message.into(),
            data,
        })
    }

    pub fn created(message: impl Into<String>, data: T) -> (StatusCode, Json<Self>) {
        (StatusCode::CREATED, Self::ok(message, data))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorEnvelope {
    success: bool,
    message: String,
    error_code: &'static str,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] MarketError),

    #[error("authentication required")]
    Unauthenticated,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            ApiError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "AUTH_REQUIRED",
                self.to_string(),
            ),
            ApiError::Domain(err) => {
                let status = match err {
                    MarketError::Validation { .. } => StatusCode::BAD_REQUEST,
                    MarketError::Conflict { .. } => StatusCode::CONFLICT,
                    MarketError::Forbidden { .. } => StatusCode::FORBIDDEN,
                    MarketError::NotFound { .. } => StatusCode::NOT_FOUND,
                    MarketError::InvalidState { .. } => StatusCode::CONFLICT,
                    MarketError::Database { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                };
                // Storage faults are logged with full context but kept opaque
                // to the caller.
                let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
                    error!("storage failure: {err}");
                    "internal storage failure".to_string()
                } else {
                    err.to_string()
                };
                (status, err.code(), message)
            }
        };

        (
            status,
            Json(ErrorEnvelope {
                success: false,
                message,
                error_code,
            }),
        )
            .into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use ams_core::common::error::codes;

    #[test]
    fn success_envelope_uses_camel_case() {
        let Json(body) = ApiResponse::ok("done", 7);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "done");
        assert_eq!(json["data"], 7);
    }

    #[test]
    fn domain_errors_map_to_expected_statuses() {
        let cases = [
            (MarketError::validation("bad"), StatusCode::BAD_REQUEST),
            (
                MarketError::conflict(codes::DUPLICATE_PENDING_REQUEST, "dup"),
                StatusCode::CONFLICT,
            ),
            (MarketError::forbidden("no"), StatusCode::FORBIDDEN),
            (
                MarketError::not_found(codes::PROFILE_NOT_FOUND, "gone"),
                StatusCode::NOT_FOUND,
            ),
            (MarketError::invalid_state("done"), StatusCode::CONFLICT),
            (
                MarketError::database("boom"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            let response = ApiError::from(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }

    #[test]
    fn storage_details_never_reach_the_body() {
        let response = ApiError::from(MarketError::database("connection refused at 10.0.0.3"))
            .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
