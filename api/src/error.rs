//! Error Handling Module
//!
//! Provides type-safe error handling with proper HTTP status code mapping.
//! Uses thiserror for domain errors and integrates with tracing for structured logging.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use fhe_age_protocol::ProtocolError;

/// API 에러 타입
///
/// # Design Decision
///
/// 각 에러 variant는 적절한 HTTP 상태 코드에 매핑됨
/// - 클라이언트 에러: 4xx (잘못된 요청, 권한 없음 등)
/// - 서버/업스트림 에러: 5xx
///
/// 민감한 내부 정보는 클라이언트에 노출하지 않음
#[derive(Debug, Error)]
pub enum ApiError {
    // ============ 400 Bad Request ============
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("User declined the request")]
    UserDeclined,

    // ============ 401 Unauthorized ============
    #[error("Not authorized to decrypt this handle")]
    Unauthorized,

    // ============ 404 Not Found ============
    #[error("No submission exists for this address")]
    NoSubmission,

    // ============ 422 Unprocessable Entity ============
    #[error("Submission rejected: {0}")]
    RejectedSubmission(String),

    // ============ 500 Internal Server Error ============
    #[error("Internal server error")]
    InternalError,

    // ============ 502 Bad Gateway ============
    #[error("Upstream error: {0}")]
    UpstreamError(String),

    // ============ 503 Service Unavailable ============
    #[error("Encryption engine is not ready")]
    EncryptionUnavailable,

    // ============ 504 Gateway Timeout ============
    #[error("Decryption service timed out")]
    RelayerTimeout,
}

/// API 에러 응답 구조
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            // 4xx 클라이언트 에러
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone(), None)
            }
            ApiError::ValidationError(msg) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                "Validation failed".to_string(),
                Some(msg.clone()),
            ),
            ApiError::UserDeclined => (
                StatusCode::BAD_REQUEST,
                "USER_DECLINED",
                "User declined the request".to_string(),
                None,
            ),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Not authorized to decrypt this handle".to_string(),
                None,
            ),
            ApiError::NoSubmission => (
                StatusCode::NOT_FOUND,
                "NO_SUBMISSION",
                "No submission exists for this address".to_string(),
                None,
            ),
            ApiError::RejectedSubmission(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "INVALID_PROOF",
                "Submission rejected".to_string(),
                Some(msg.clone()),
            ),

            // 5xx 서버/업스트림 에러
            ApiError::InternalError => {
                // 내부 에러는 클라이언트에 상세 정보 노출 안 함
                tracing::error!("Internal error: {:?}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
            ApiError::UpstreamError(msg) => (
                StatusCode::BAD_GATEWAY,
                "BAD_GATEWAY",
                msg.clone(),
                None,
            ),
            ApiError::EncryptionUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "ENCRYPTION_UNAVAILABLE",
                "Encryption engine is not ready".to_string(),
                None,
            ),
            ApiError::RelayerTimeout => (
                StatusCode::GATEWAY_TIMEOUT,
                "RELAYER_TIMEOUT",
                "Relayer timeout (2 min)".to_string(),
                None,
            ),
        };

        let body = ErrorResponse {
            error: message,
            code: code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// 프로토콜 에러를 ApiError로 변환
impl From<ProtocolError> for ApiError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::RejectedSubmission(msg) => ApiError::RejectedSubmission(msg),
            ProtocolError::NoSubmission => ApiError::NoSubmission,
            ProtocolError::Unauthorized => ApiError::Unauthorized,
            ProtocolError::EncryptionUnavailable => ApiError::EncryptionUnavailable,
            ProtocolError::NetworkTimeout(_) => ApiError::RelayerTimeout,
            ProtocolError::UserDeclined(_) => ApiError::UserDeclined,
        }
    }
}

/// anyhow 에러를 ApiError로 변환
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        tracing::error!("Anyhow error: {:?}", err);
        ApiError::InternalError
    }
}
