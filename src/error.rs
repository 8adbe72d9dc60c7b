use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SetupError>;

#[derive(Error, Debug)]
pub enum SetupError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Server did not send a Content-Length header for {url}")]
    MissingContentLength { url: String },

    #[error("Could not download {url}: {reason}")]
    DownloadFailed { url: String, reason: String },

    #[error("Corrupt archive: {reason}")]
    CorruptArchive { reason: String },

    #[error("Extraction failed at {path}: {source}")]
    ExtractionIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("DOSBox configuration directory not found: {dir}")]
    MissingHostConfig { dir: PathBuf },

    #[error("No dosbox*.conf file found in {dir}")]
    ConfigFileNotFound { dir: PathBuf },

    #[error("Failed to update DOSBox configuration {path}: {source}")]
    ConfigWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Home directory not found")]
    HomeDirectoryNotFound,

    #[error("Local application data directory not found (is LOCALAPPDATA set?)")]
    AppDataNotFound,

    #[error("Configuration error: {message}")]
    ConfigError { message: String },
}

impl SetupError {
    pub fn config_error<S: Into<String>>(message: S) -> Self {
        SetupError::ConfigError {
            message: message.into(),
        }
    }

    pub fn download_failed<S: Into<String>>(url: &str, reason: S) -> Self {
        SetupError::DownloadFailed {
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    /// The user can fix this without a bug report: install DOSBox and run again.
    pub fn is_user_correctable(&self) -> bool {
        matches!(self, SetupError::MissingHostConfig { .. })
    }
}

/// Archives are read from memory, so even a zip I/O error means the data is malformed.
impl From<zip::result::ZipError> for SetupError {
    fn from(error: zip::result::ZipError) -> Self {
        SetupError::CorruptArchive {
            reason: error.to_string(),
        }
    }
}
