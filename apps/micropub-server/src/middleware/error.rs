//! Error handling middleware - micropub error bodies.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use micropub_core::ProtocolError;
use micropub_shared::ErrorResponse;
use std::fmt;

/// Application-level error type rendered as `{"error", "error_description"}`.
#[derive(Debug)]
pub enum AppError {
    Protocol(ProtocolError),
    BadRequest(String),
    PayloadTooLarge(usize),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Protocol(err) => write!(f, "{}", err),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::PayloadTooLarge(limit) => {
                write!(f, "Request body exceeds the limit of {} bytes", limit)
            }
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Protocol(err) => {
                StatusCode::from_u16(err.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match self {
            AppError::Protocol(ProtocolError::Storage(_)) => ErrorResponse::server_error(),
            AppError::Protocol(err) => ErrorResponse::new(err.code()).with_description(err.to_string()),
            AppError::BadRequest(_) | AppError::PayloadTooLarge(_) => {
                ErrorResponse::invalid_request(self.to_string())
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                ErrorResponse::server_error()
            }
        };

        HttpResponse::build(self.status_code()).json(error)
    }
}

impl From<ProtocolError> for AppError {
    fn from(err: ProtocolError) -> Self {
        AppError::Protocol(err)
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn test_protocol_error_body() {
        let err = AppError::from(ProtocolError::UnsupportedMediaType("text/plain".into()));
        assert_eq!(err.status_code(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"], "unsupported_media_type");
        assert_eq!(body["error_description"], "unsupported media type: text/plain");
    }

    #[actix_web::test]
    async fn test_storage_details_are_not_leaked() {
        let err = AppError::from(ProtocolError::Storage("disk on fire".into()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        assert_eq!(&body[..], br#"{"error":"server_error"}"#);
    }
}
