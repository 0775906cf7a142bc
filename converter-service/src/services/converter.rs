use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use thiserror::Error;
use tokio::fs;
use tokio::process::Command;

/// Base name given to the input inside the per-call work directory.
const SOURCE_STEM: &str = "source";

#[derive(Debug, Error)]
pub enum ConversionError {
    /// The engine ran and reported a failure; carries its own error text.
    #[error("{0}")]
    Engine(String),

    #[error("Failed to start {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    MissingOutput(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Turns document bytes into bytes of another format.
///
/// `extension` names the target format with a leading dot, e.g. `".pdf"`.
#[async_trait]
pub trait Converter: Send + Sync {
    async fn convert(&self, input: Vec<u8>, extension: &str) -> Result<Vec<u8>, ConversionError>;
}

/// Headless LibreOffice driven through its command line.
///
/// Every call gets a private work directory and user profile so any number of
/// conversions can run side by side.
#[derive(Debug, Clone)]
pub struct LibreOfficeConverter {
    binary_path: String,
}

impl LibreOfficeConverter {
    pub fn new(binary_path: impl Into<String>) -> Self {
        Self {
            binary_path: binary_path.into(),
        }
    }

    fn command_args(profile_dir: &Path, out_dir: &Path, input: &Path, format: &str) -> Vec<OsString> {
        let mut profile = OsString::from("-env:UserInstallation=file://");
        profile.push(profile_dir.as_os_str());

        vec![
            profile,
            "--headless".into(),
            "--convert-to".into(),
            format.into(),
            "--outdir".into(),
            out_dir.as_os_str().to_owned(),
            input.as_os_str().to_owned(),
        ]
    }
}

#[async_trait]
impl Converter for LibreOfficeConverter {
    async fn convert(&self, input: Vec<u8>, extension: &str) -> Result<Vec<u8>, ConversionError> {
        let format = extension.trim_start_matches('.');
        if format.is_empty() {
            return Err(ConversionError::Engine(format!(
                "Invalid target extension: {:?}",
                extension
            )));
        }

        // Removed on drop, whichever way this call ends.
        let work_dir = tempfile::Builder::new().prefix("converter-").tempdir()?;
        let input_path = work_dir.path().join(format!("{}.docx", SOURCE_STEM));
        let output_path: PathBuf = work_dir.path().join(format!("{}.{}", SOURCE_STEM, format));
        let profile_dir = work_dir.path().join("profile");

        fs::write(&input_path, input).await?;

        let args = Self::command_args(&profile_dir, work_dir.path(), &input_path, format);

        tracing::debug!(
            program = %self.binary_path,
            args = ?args,
            "Executing command"
        );

        let output = Command::new(&self.binary_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| ConversionError::Spawn {
                binary: self.binary_path.clone(),
                source,
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if !output.status.success() {
            tracing::error!(
                program = %self.binary_path,
                status = %output.status,
                stderr = %stderr,
                "Command failed"
            );
            return Err(ConversionError::Engine(if stderr.is_empty() {
                format!("{} exited with {}", self.binary_path, output.status)
            } else {
                stderr
            }));
        }

        match fs::read(&output_path).await {
            Ok(bytes) => {
                tracing::debug!(
                    program = %self.binary_path,
                    output_size = bytes.len(),
                    "Command succeeded"
                );
                Ok(bytes)
            }
            // soffice exits 0 on some load failures and only complains on stderr.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ConversionError::MissingOutput(if stderr.is_empty() {
                    format!("Conversion produced no {} output", format)
                } else {
                    stderr
                }))
            }
            Err(e) => Err(ConversionError::Io(e)),
        }
    }
}
