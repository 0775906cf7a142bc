use service_core::error::AppError;

/// Catches unknown paths and unsupported methods on known ones.
pub async fn not_found() -> AppError {
    AppError::NotFound
}
