use axum::extract::multipart::{Field, MultipartError};
use axum::extract::Multipart;
use service_core::error::AppError;

/// Multipart field that carries the document.
pub const FILE_FIELD: &str = "file";

pub const DOCX_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const PDF_MIME_TYPE: &str = "application/pdf";

pub const DOCX_EXTENSION: &str = ".docx";
pub const PDF_EXTENSION: &str = ".pdf";

/// Hard ceiling on the uploaded document, checked while streaming.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Ceiling on any non-file form value.
pub const MAX_FIELD_BYTES: usize = 1024 * 1024;

/// Media type assumed for file parts that declare none.
const DEFAULT_PART_MIME: &str = "text/plain";

/// A validated DOCX upload, held in memory for the lifetime of one request.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub original_name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl UploadedDocument {
    /// Reads the multipart body, accepting exactly one DOCX part under `file`.
    ///
    /// Checks run in the order the parts arrive: an unexpected or duplicate file
    /// part fails first, then the declared media type (before any of the part's
    /// bytes are read), then the size ceiling as chunks stream in. Plain form
    /// values are drained and discarded.
    pub async fn from_multipart(multipart: &mut Multipart) -> Result<Self, AppError> {
        let mut upload: Option<UploadedDocument> = None;

        while let Some(mut field) = multipart.next_field().await.map_err(malformed)? {
            let file_name = match field.file_name().map(str::to_string) {
                Some(name) if !name.is_empty() => name,
                Some(_) => {
                    // A file part with an empty filename is skipped, not rejected.
                    drain(&mut field, None).await?;
                    continue;
                }
                None => {
                    drain(&mut field, Some(MAX_FIELD_BYTES)).await?;
                    continue;
                }
            };

            if field.name() != Some(FILE_FIELD) || upload.is_some() {
                return Err(AppError::InternalError(anyhow::anyhow!("Unexpected field")));
            }

            let mime_type = normalize_mime(field.content_type().unwrap_or(DEFAULT_PART_MIME));
            if mime_type != DOCX_MIME_TYPE {
                tracing::warn!(
                    filename = %file_name,
                    mime_type = %mime_type,
                    "Rejected upload with unsupported media type"
                );
                return Err(AppError::UnsupportedFileType);
            }

            let mut data = Vec::new();
            while let Some(chunk) = field.chunk().await.map_err(malformed)? {
                if data.len() + chunk.len() > MAX_UPLOAD_BYTES {
                    tracing::warn!(
                        filename = %file_name,
                        limit = MAX_UPLOAD_BYTES,
                        "Upload exceeded size limit"
                    );
                    return Err(AppError::FileTooLarge);
                }
                data.extend_from_slice(&chunk);
            }

            upload = Some(UploadedDocument {
                original_name: file_name,
                mime_type,
                data,
            });
        }

        upload.ok_or(AppError::NoFileUploaded)
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn pdf_filename(&self) -> String {
        pdf_filename(&self.original_name)
    }
}

/// Swaps a trailing `.docx` for `.pdf`. Names without that suffix come back unchanged.
pub fn pdf_filename(original: &str) -> String {
    match original.strip_suffix(DOCX_EXTENSION) {
        Some(stem) => format!("{}{}", stem, PDF_EXTENSION),
        None => original.to_string(),
    }
}

fn normalize_mime(raw: &str) -> String {
    raw.split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

async fn drain(field: &mut Field<'_>, limit: Option<usize>) -> Result<(), AppError> {
    let mut seen = 0usize;
    while let Some(chunk) = field.chunk().await.map_err(malformed)? {
        seen += chunk.len();
        if limit.is_some_and(|max| seen > max) {
            return Err(AppError::InternalError(anyhow::anyhow!(
                "Field value too long"
            )));
        }
    }
    Ok(())
}

fn malformed(err: MultipartError) -> AppError {
    AppError::InternalError(anyhow::anyhow!(err.body_text()))
}
