pub mod upload;

pub use upload::{pdf_filename, UploadedDocument};
