use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Maximum upload size advertised in the `FileTooLarge` message.
pub const UPLOAD_LIMIT_LABEL: &str = "10MB";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("No file uploaded")]
    NoFileUploaded,

    #[error("File too large")]
    FileTooLarge,

    #[error("Only .docx files are allowed")]
    UnsupportedFileType,

    #[error("Conversion failed: {0}")]
    ConversionFailed(String),

    #[error("Origin {0} is not allowed")]
    CorsRejected(String),

    #[error("Endpoint not found")]
    NotFound,

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

/// Wire shape of every failure body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl AppError {
    /// Machine-readable category, logged alongside the failure.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NoFileUploaded => "NO_FILE_UPLOADED",
            AppError::FileTooLarge => "FILE_TOO_LARGE",
            AppError::UnsupportedFileType => "UNSUPPORTED_FILE_TYPE",
            AppError::ConversionFailed(_) => "CONVERSION_FAILED",
            AppError::CorsRejected(_) => "CORS_REJECTED",
            AppError::NotFound => "NOT_FOUND",
            AppError::InternalError(_) => "SERVER_ERROR",
            AppError::ConfigError(_) => "CONFIG_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NoFileUploaded | AppError::FileTooLarge => StatusCode::BAD_REQUEST,
            AppError::CorsRejected(_) => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
            // The MIME filter has no status of its own and lands on the generic 500 path.
            AppError::UnsupportedFileType
            | AppError::ConversionFailed(_)
            | AppError::InternalError(_)
            | AppError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorResponse {
        let (error, message) = match self {
            AppError::NoFileUploaded => (
                "No file uploaded",
                "Please provide a DOCX file in the request".to_string(),
            ),
            AppError::FileTooLarge => (
                "File too large",
                format!("File size cannot exceed {}", UPLOAD_LIMIT_LABEL),
            ),
            AppError::UnsupportedFileType => ("Server error", self.to_string()),
            AppError::ConversionFailed(msg) => ("Conversion failed", msg.clone()),
            AppError::CorsRejected(_) => ("CORS policy violation", self.to_string()),
            AppError::NotFound => ("Not found", self.to_string()),
            AppError::InternalError(err) => ("Server error", err.to_string()),
            AppError::ConfigError(err) => ("Configuration error", err.to_string()),
        };

        ErrorResponse {
            error: error.to_string(),
            message,
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "Request failed");
        } else {
            tracing::warn!(code = self.code(), error = %self, "Request rejected");
        }

        (status, Json(self.body())).into_response()
    }
}
