//! Error handler for converting AppError to HTTP responses.
//!
//! This module implements the IntoResponse trait for AppError,
//! providing consistent error response formatting across the API.
//! Framework-generated errors are normalised by `global_error_handler`,
//! which also stamps the request ID into every JSON error body.

use axum::{
    Json,
    body::{Body, Bytes},
    extract::{
        Request,
        rejection::{JsonRejection, PathRejection},
    },
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};

use super::RequestId;
use crate::api::dto::ErrorResponse;
use crate::error::AppError;

impl IntoResponse for AppError {
    /// Converts an AppError into an HTTP response.
    ///
    /// # Status Code Mapping
    /// - NotFound → 404 NOT_FOUND
    /// - Duplicate → 409 CONFLICT
    /// - Validation → 400 BAD_REQUEST
    /// - Database → 500 INTERNAL_SERVER_ERROR
    /// - Configuration → 500 INTERNAL_SERVER_ERROR
    /// - ConnectionPool → 503 SERVICE_UNAVAILABLE
    /// - Internal → 500 INTERNAL_SERVER_ERROR
    fn into_response(self) -> Response {
        let status = error_to_status_code(&self);
        if status.is_server_error() {
            tracing::error!(error = ?self, "Request failed");
        }

        let error_response = match &self {
            AppError::NotFound {
                entity,
                field,
                value,
            } => ErrorResponse::not_found_error(entity, field, value),
            AppError::Duplicate {
                entity,
                field,
                value,
            } => ErrorResponse::duplicate_error(entity, field, value),
            AppError::Validation { field, reason } => {
                ErrorResponse::validation_error(field, reason)
            }
            AppError::Database { operation, .. } => ErrorResponse::new(
                "DATABASE_ERROR",
                &format!("Database operation failed: {}", operation),
            )
            .with_details(json!({
                "operation": operation
            })),
            AppError::Configuration { key, .. } => ErrorResponse::new(
                "CONFIGURATION_ERROR",
                &format!("Configuration error: {}", key),
            )
            .with_details(json!({
                "key": key
            })),
            AppError::ConnectionPool { .. } => {
                ErrorResponse::new("SERVICE_UNAVAILABLE", "Database connection unavailable")
            }
            AppError::Internal { .. } => {
                ErrorResponse::new("INTERNAL_ERROR", "An internal error occurred")
            }
        };

        (status, Json(error_response)).into_response()
    }
}

/// Converts axum JSON rejection errors to ErrorResponse.
pub fn handle_json_rejection(rejection: JsonRejection) -> Response {
    let (status, error_response) = match rejection {
        JsonRejection::JsonDataError(err) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            ErrorResponse::new(
                "UNPROCESSABLE_CONTENT",
                "Request body does not match the expected representation",
            )
            .with_details(json!({
                "error": err.body_text()
            })),
        ),
        JsonRejection::JsonSyntaxError(err) => (
            StatusCode::BAD_REQUEST,
            ErrorResponse::new("JSON_SYNTAX_ERROR", "JSON syntax error").with_details(json!({
                "error": err.body_text()
            })),
        ),
        JsonRejection::MissingJsonContentType(_) => (
            StatusCode::BAD_REQUEST,
            ErrorResponse::new(
                "MISSING_CONTENT_TYPE",
                "Missing or invalid Content-Type header",
            )
            .with_details(json!({
                "expected": "application/json"
            })),
        ),
        JsonRejection::BytesRejection(err) => {
            let status = err.status();
            let code = if status == StatusCode::PAYLOAD_TOO_LARGE {
                "PAYLOAD_TOO_LARGE"
            } else {
                "BODY_READ_ERROR"
            };
            (status, ErrorResponse::new(code, "Request body could not be read"))
        }
        other => (
            StatusCode::BAD_REQUEST,
            ErrorResponse::new("JSON_ERROR", "Failed to parse JSON request").with_details(
                json!({
                    "error": other.body_text()
                }),
            ),
        ),
    };

    (status, Json(error_response)).into_response()
}

/// Converts axum path rejection errors to ErrorResponse.
pub fn handle_path_rejection(rejection: PathRejection) -> Response {
    let (status, error_response) = match rejection {
        PathRejection::FailedToDeserializePathParams(err) => (
            StatusCode::BAD_REQUEST,
            ErrorResponse::new("INVALID_PATH_PARAMS", "Invalid path parameters").with_details(
                json!({
                    "error": err.body_text()
                }),
            ),
        ),
        PathRejection::MissingPathParams(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorResponse::new("MISSING_PATH_PARAMS", "Missing required path parameters")
                .with_details(json!({
                    "error": err.body_text()
                })),
        ),
        _ => (
            StatusCode::BAD_REQUEST,
            ErrorResponse::new("PATH_ERROR", "Invalid path parameters"),
        ),
    };

    (status, Json(error_response)).into_response()
}

/// Global error handling middleware.
///
/// Error responses without a JSON body are rewritten into the standard
/// `ErrorResponse` format. JSON error bodies get the request ID attached.
pub async fn global_error_handler(request: Request, next: Next) -> Response {
    let request_id = request.extensions().get::<RequestId>().map(|r| r.0.clone());
    let response = next.run(request).await;

    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"));

    let (mut parts, body) = response.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .unwrap_or_else(|_| Bytes::new());

    if is_json {
        let Ok(Value::Object(mut object)) = serde_json::from_slice::<Value>(&body_bytes) else {
            return Response::from_parts(parts, Body::from(body_bytes));
        };
        if let Some(id) = request_id {
            object.entry("request_id").or_insert(Value::String(id));
        }
        parts.headers.remove(header::CONTENT_LENGTH);
        return Response::from_parts(parts, Body::from(Value::Object(object).to_string()));
    }

    let original_message = String::from_utf8_lossy(&body_bytes).trim().to_string();
    let mut error_response = fallback_error_response(status, original_message);
    if let Some(id) = request_id {
        error_response = error_response.with_request_id(&id);
    }

    let mut normalised = (status, Json(error_response)).into_response();
    for (name, value) in parts.headers.iter() {
        if name != header::CONTENT_TYPE && name != header::CONTENT_LENGTH {
            normalised.headers_mut().insert(name.clone(), value.clone());
        }
    }
    normalised
}

fn fallback_error_response(status: StatusCode, original_message: String) -> ErrorResponse {
    let (code, default_message) = match status {
        StatusCode::BAD_REQUEST => ("BAD_REQUEST", "Bad request - invalid or malformed request"),
        StatusCode::NOT_FOUND => ("NOT_FOUND", "The requested resource was not found"),
        StatusCode::METHOD_NOT_ALLOWED => (
            "METHOD_NOT_ALLOWED",
            "HTTP method not allowed for this endpoint",
        ),
        StatusCode::UNSUPPORTED_MEDIA_TYPE => {
            ("UNSUPPORTED_MEDIA_TYPE", "Unsupported media type")
        }
        StatusCode::REQUEST_TIMEOUT => ("REQUEST_TIMEOUT", "Request timeout"),
        StatusCode::PAYLOAD_TOO_LARGE => ("PAYLOAD_TOO_LARGE", "Request payload too large"),
        StatusCode::SERVICE_UNAVAILABLE => {
            ("SERVICE_UNAVAILABLE", "Service temporarily unavailable")
        }
        s if s.is_server_error() => (
            "INTERNAL_SERVER_ERROR",
            "An internal server error occurred",
        ),
        _ => ("UNKNOWN_ERROR", "An unknown error occurred"),
    };

    // Server error bodies may carry internals; keep them out of responses.
    let message = if original_message.is_empty() || status.is_server_error() {
        default_message.to_string()
    } else {
        original_message
    };

    ErrorResponse::new(code, &message)
}

/// Maps an AppError variant to its corresponding HTTP status code.
pub fn error_to_status_code(error: &AppError) -> StatusCode {
    match error {
        AppError::NotFound { .. } => StatusCode::NOT_FOUND,
        AppError::Duplicate { .. } => StatusCode::CONFLICT,
        AppError::Validation { .. } => StatusCode::BAD_REQUEST,
        AppError::ConnectionPool { .. } => StatusCode::SERVICE_UNAVAILABLE,
        AppError::Database { .. } | AppError::Configuration { .. } | AppError::Internal { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_error_to_status_code() {
        assert_eq!(
            error_to_status_code(&AppError::user_not_found(1)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            error_to_status_code(&AppError::Duplicate {
                entity: "users".to_string(),
                field: "id".to_string(),
                value: "1".to_string(),
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            error_to_status_code(&AppError::Validation {
                field: "id".to_string(),
                reason: "x".to_string()
            }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            error_to_status_code(&AppError::ConnectionPool {
                source: anyhow::anyhow!("down")
            }),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            error_to_status_code(&AppError::Internal {
                source: anyhow::anyhow!("boom")
            }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_not_found_into_response() {
        let response = AppError::user_not_found(42).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert_eq!(body["code"], "NOT_FOUND");
        assert_eq!(body["details"]["entity"], "user");
        assert_eq!(body["details"]["value"], "42");
    }

    #[tokio::test]
    async fn test_internal_error_hides_source() {
        let response = AppError::Internal {
            source: anyhow::anyhow!("secret connection string"),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["code"], "INTERNAL_ERROR");
        assert!(!body.to_string().contains("secret"));
    }

    #[test]
    fn test_fallback_error_response_uses_default_message() {
        let response = fallback_error_response(StatusCode::METHOD_NOT_ALLOWED, String::new());
        assert_eq!(response.code, "METHOD_NOT_ALLOWED");
        assert_eq!(response.message, "HTTP method not allowed for this endpoint");
    }

    #[test]
    fn test_fallback_error_response_hides_server_error_body() {
        let response = fallback_error_response(
            StatusCode::BAD_GATEWAY,
            "upstream said: password=hunter2".to_string(),
        );
        assert_eq!(response.code, "INTERNAL_SERVER_ERROR");
        assert!(!response.message.contains("hunter2"));
    }
}
