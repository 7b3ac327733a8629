//! API response types.

use axum::{
    http::{header::LOCATION, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use qanda_core::{ErrorResponse, QandaError};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

/// Standard API response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorResponse>,
}

impl<T> ApiResponse<T> {
    /// Creates a successful response.
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    /// Creates an error response.
    #[must_use]
    pub fn error(error: ErrorResponse) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

/// Application error type for Axum.
#[derive(Debug)]
pub struct AppError(pub QandaError);

impl From<QandaError> for AppError {
    fn from(err: QandaError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self.0, "Request failed");
        } else {
            debug!(status = status.as_u16(), error = %self.0, "Request rejected");
        }

        let error_response = ErrorResponse::from_error(&self.0);
        (status, Json(ApiResponse::error(error_response))).into_response()
    }
}

/// Result type for Axum handlers.
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, AppError>;

/// Response for a newly created resource.
pub type CreatedResponse<T> = (StatusCode, [(axum::http::HeaderName, HeaderValue); 1], Json<ApiResponse<T>>);

/// Helper to create a success response.
pub fn ok<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::success(data)))
}

/// Helper to create a created (201) response with a `Location` header.
pub fn created<T: Serialize>(location: &str, data: T) -> Result<CreatedResponse<T>, AppError> {
    let location = HeaderValue::from_str(location)
        .map_err(|e| QandaError::internal(format!("Invalid location header: {e}")))?;
    Ok((StatusCode::CREATED, [(LOCATION, location)], Json(ApiResponse::success(data))))
}

/// Helper to create a no content (204) response.
pub fn no_content() -> StatusCode {
    StatusCode::NO_CONTENT
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_success_body_omits_error() {
        let body = serde_json::to_value(ApiResponse::success(5)).unwrap();
        assert_eq!(body, serde_json::json!({"success": true, "data": 5}));
    }

    #[test]
    fn test_error_status_mapping() {
        let response = AppError(QandaError::not_found("Question", 3)).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = AppError(QandaError::forbidden("no")).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn render_logged(err: QandaError) -> String {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            AppError(err).into_response();
        });
        let bytes = captured.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_client_errors_log_at_debug() {
        let output = render_logged(QandaError::not_found("Question", 8));
        assert!(output.contains("DEBUG"));
        assert!(output.contains("Request rejected"));
        assert!(!output.contains("ERROR"));
    }

    #[test]
    fn test_server_errors_log_at_error() {
        let output = render_logged(QandaError::Database("connection reset".to_string()));
        assert!(output.contains("ERROR"));
        assert!(output.contains("Request failed"));
    }

    #[test]
    fn test_created_sets_location() {
        let (status, headers, _) = created("/api/questions/4", "x").unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(headers[0].1, "/api/questions/4");
    }
}
