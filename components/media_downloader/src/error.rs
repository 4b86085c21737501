// components/media_downloader/src/error.rs
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("Required dependency not found: {0}")]
    DependencyNotFound(String),

    /// The URL could not be turned into a listing. No partial listing exists.
    #[error("Could not resolve {url}: {reason}")]
    Resolution { url: String, reason: String },

    /// Destination directories could not be created. Nothing was attempted.
    #[error("Failed to create directory {path}")]
    Planning {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid selection {start}..{end} for a listing of {len} items")]
    Selection { start: usize, end: usize, len: usize },

    /// A single item failed. The orchestrator absorbs these into the outcome.
    #[error("Download failed for {title}: {reason}")]
    ItemFetch { title: String, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl DownloadError {
    pub fn resolution(url: impl Into<String>, reason: impl Into<String>) -> Self {
        DownloadError::Resolution {
            url: url.into(),
            reason: reason.into(),
        }
    }

    pub fn planning(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DownloadError::Planning {
            path: path.into(),
            source,
        }
    }

    pub fn item_fetch(title: impl Into<String>, reason: impl Into<String>) -> Self {
        DownloadError::ItemFetch {
            title: title.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error ends the calling operation, as opposed to being
    /// recorded against a single item.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DownloadError::ItemFetch { .. })
    }

    /// The failure reason without the item title prefix.
    pub fn reason(&self) -> String {
        match self {
            DownloadError::ItemFetch { reason, .. } => reason.clone(),
            DownloadError::Resolution { reason, .. } => reason.clone(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DownloadError>;
