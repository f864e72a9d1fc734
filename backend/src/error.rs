//! Error handling for the fabric warehouse tracker
//!
//! Provides consistent error responses in Vietnamese and English

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use shared::CriteriaError;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Unauthorized: {message}")]
    Unauthorized {
        message: String,
        message_vi: String,
    },

    // Validation errors
    #[error("Validation error: {message}")]
    Validation {
        field: String,
        message: String,
        message_vi: String,
    },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Scan errors
    #[error("Invalid code: {0}")]
    InvalidCode(String),

    #[error("A position must be scanned before a roll")]
    PositionRequired,

    // Irreversible actions
    #[error("Confirmation required to {action} {count} roll(s)")]
    ConfirmationRequired { action: String, count: usize },

    // External collaborator errors
    #[error("Printer error: {0}")]
    Printer(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// The store could not be reached; the operation was aborted and not retried
    pub fn is_connection_failure(&self) -> bool {
        matches!(
            self,
            AppError::DatabaseError(
                sqlx::Error::PoolTimedOut
                    | sqlx::Error::PoolClosed
                    | sqlx::Error::Io(_)
                    | sqlx::Error::Tls(_)
            )
        )
    }
}

impl From<CriteriaError> for AppError {
    fn from(err: CriteriaError) -> Self {
        AppError::Validation {
            field: "date_range".to_string(),
            message: err.to_string(),
            message_vi: "Khoảng ngày không hợp lệ".to_string(),
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message_en: String,
    pub message_vi: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail {
                    code: "INVALID_CREDENTIALS".to_string(),
                    message_en: "Invalid account or password".to_string(),
                    message_vi: "Tài khoản hoặc mật khẩu không đúng!".to_string(),
                    field: None,
                },
            ),
            AppError::Unauthorized { message, message_vi } => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail {
                    code: "UNAUTHORIZED".to_string(),
                    message_en: message.clone(),
                    message_vi: message_vi.clone(),
                    field: None,
                },
            ),
            AppError::Validation {
                field,
                message,
                message_vi,
            } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message_en: message.clone(),
                    message_vi: message_vi.clone(),
                    field: Some(field.clone()),
                },
            ),
            AppError::ValidationError(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message_en: msg.clone(),
                    message_vi: format!("Dữ liệu không hợp lệ: {}", msg),
                    field: None,
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "NOT_FOUND".to_string(),
                    message_en: format!("{} not found", resource),
                    message_vi: format!("Không tìm thấy {}", resource),
                    field: None,
                },
            ),
            AppError::InvalidCode(code) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "INVALID_CODE".to_string(),
                    message_en: format!("Invalid QR code: {}", code),
                    message_vi: "Mã QR không hợp lệ!".to_string(),
                    field: None,
                },
            ),
            AppError::PositionRequired => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "POSITION_REQUIRED".to_string(),
                    message_en: "Scan a position QR code before scanning a roll".to_string(),
                    message_vi: "Vui lòng quét mã QR vị trí trước khi quét mã cuộn vải!"
                        .to_string(),
                    field: None,
                },
            ),
            AppError::ConfirmationRequired { action, count } => (
                StatusCode::PRECONDITION_REQUIRED,
                ErrorDetail {
                    code: "CONFIRMATION_REQUIRED".to_string(),
                    message_en: format!("Confirm to {} {} selected roll(s)", action, count),
                    message_vi: format!("Vui lòng xác nhận thao tác cho {} dòng đã chọn", count),
                    field: Some("confirm".to_string()),
                },
            ),
            AppError::Printer(msg) => (
                StatusCode::BAD_GATEWAY,
                ErrorDetail {
                    code: "PRINTER_ERROR".to_string(),
                    message_en: format!("Printer error: {}", msg),
                    message_vi: format!("Đã xảy ra lỗi khi in tem: {}", msg),
                    field: None,
                },
            ),
            AppError::DatabaseError(_) if self.is_connection_failure() => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorDetail {
                    code: "CONNECTION_FAILURE".to_string(),
                    message_en: "Cannot connect to the database".to_string(),
                    message_vi: "Không thể kết nối tới cơ sở dữ liệu!".to_string(),
                    field: None,
                },
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "DATABASE_ERROR".to_string(),
                    message_en: "A database error occurred".to_string(),
                    message_vi: "Đã xảy ra lỗi cơ sở dữ liệu".to_string(),
                    field: None,
                },
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message_en: msg.clone(),
                    message_vi: "Đã xảy ra lỗi nội bộ".to_string(),
                    field: None,
                },
            ),
        };

        // Rejected scans are routine; everything else is worth an error line
        if status.is_server_error() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::warn!("Rejected: {}", self);
        }

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
