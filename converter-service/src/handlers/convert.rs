use crate::models::upload::{UploadedDocument, PDF_EXTENSION, PDF_MIME_TYPE};
use crate::startup::AppState;
use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use service_core::error::AppError;

pub async fn convert_document(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, AppError> {
    // A body that is not multipart at all simply carries no file.
    let mut multipart = multipart.map_err(|rejection| {
        tracing::debug!(rejection = %rejection, "Request body is not multipart/form-data");
        AppError::NoFileUploaded
    })?;

    let upload = UploadedDocument::from_multipart(&mut multipart).await?;

    let original_name = upload.original_name.clone();
    let pdf_name = upload.pdf_filename();

    tracing::info!(
        filename = %original_name,
        size = upload.size(),
        "Converting file"
    );

    let pdf = state
        .converter
        .convert(upload.data, PDF_EXTENSION)
        .await
        .map_err(|e| {
            tracing::error!(filename = %original_name, error = %e, "Conversion error");
            AppError::ConversionFailed(e.to_string())
        })?;

    let disposition =
        HeaderValue::from_bytes(format!("attachment; filename=\"{}\"", pdf_name).as_bytes())
            .map_err(|e| {
                AppError::InternalError(anyhow::anyhow!(
                    "Invalid character in Content-Disposition filename: {}",
                    e
                ))
            })?;

    tracing::info!(
        source = %original_name,
        target = %pdf_name,
        size = pdf.len(),
        "Successfully converted"
    );

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(PDF_MIME_TYPE)),
            (header::CONTENT_DISPOSITION, disposition),
            (header::CONTENT_LENGTH, HeaderValue::from(pdf.len())),
        ],
        pdf,
    )
        .into_response())
}
