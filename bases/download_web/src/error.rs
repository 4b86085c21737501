// bases/download_web/src/error.rs
use askama::Template;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use media_downloader::DownloadError;
use thiserror::Error;

/// Application-level errors for HTTP handlers
#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to render page: {0}")]
    Template(#[from] askama::Error),

    #[error("{0}")]
    Validation(String),

    #[error("Enter a URL first.")]
    NoSession,

    #[error("No download has been started.")]
    NoDownload,

    #[error("Download failed: {0}")]
    JobFailed(String),

    #[error(transparent)]
    Download(#[from] DownloadError),
}

#[derive(Template)]
#[template(path = "error.html")]
struct ErrorTemplate<'a> {
    message: &'a str,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Template(_) | AppError::JobFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) | AppError::NoSession | AppError::NoDownload => {
                StatusCode::BAD_REQUEST
            }
            AppError::Download(DownloadError::Resolution { .. })
            | AppError::Download(DownloadError::Selection { .. }) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Download(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!("Request failed: {}", self);

        let status = self.status();
        let message = self.to_string();
        match (ErrorTemplate { message: &message }).render() {
            Ok(html) => (status, Html(html)).into_response(),
            Err(e) => {
                tracing::error!("Failed to render error page: {}", e);
                (status, message).into_response()
            }
        }
    }
}
