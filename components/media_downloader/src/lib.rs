// components/media_downloader/src/lib.rs
//! Batch media downloads driven by yt-dlp.
//!
//! A URL is resolved into a [`ContentListing`], a [`Session`] tracks which of
//! its items the user selected, the path planner lays out one directory per
//! title, and the [`BatchOrchestrator`] fetches the selection one item at a
//! time while emitting [`ProgressEvent`]s.

mod config;
mod error;
mod events;
mod format;
mod orchestrator;
mod organization;
mod session;
mod types;
mod utils;
mod ytdlp;

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::Url;

pub use config::DownloaderConfig;
pub use error::{DownloadError, Result};
pub use events::{EventSink, ItemProgress, ProgressEvent};
pub use format::FormatPolicy;
pub use orchestrator::{file_name, select, Batch, BatchOrchestrator};
pub use organization::{plan, ContentPaths, PathSet};
pub use session::Session;
pub use types::{
    ContentItem, ContentKind, ContentListing, DownloadOutcome, OutputToggles, VideoQuality,
};
pub use utils::{sanitize_title, UNTITLED};
pub use ytdlp::{Downloader, FetchRequest, YtDlp};

pub struct MediaDownloader {
    config: DownloaderConfig,
    downloader: Arc<dyn Downloader + Send + Sync>,
}

impl MediaDownloader {
    /// Create a MediaDownloader backed by the configured yt-dlp binary
    pub async fn new(config: DownloaderConfig) -> Result<Self> {
        let ytdlp = YtDlp::new(config.ytdlp_binary.clone());
        Self::new_with_downloader(config, Arc::new(ytdlp)).await
    }

    /// Create a MediaDownloader with a specific downloader implementation
    pub async fn new_with_downloader(
        config: DownloaderConfig,
        downloader: Arc<dyn Downloader + Send + Sync>,
    ) -> Result<Self> {
        downloader.check_available().await?;
        plan(&config.base_dir, None).await?;

        Ok(Self { config, downloader })
    }

    pub fn config(&self) -> &DownloaderConfig {
        &self.config
    }

    /// Resolve a URL into a listing of one video or a whole playlist
    pub async fn resolve(&self, url: &str) -> Result<ContentListing> {
        let url = parse_url(url.trim())
            .map_err(|e| DownloadError::resolution(url, format!("invalid URL: {}", e)))?;

        let listing = self.downloader.resolve(&url).await?;
        tracing::info!(
            "Resolved {} as {} '{}' with {} item(s)",
            url,
            listing.kind,
            listing.label,
            listing.len()
        );
        Ok(listing)
    }

    /// Resolve a URL and start a fresh session over the result
    pub async fn open_session(&self, url: &str) -> Result<Session> {
        let listing = self.resolve(url).await?;
        Ok(Session::new(url.trim(), listing))
    }

    /// Plan (and create) the directories for a title under the base directory
    pub async fn plan_paths(&self, title: Option<&str>) -> Result<PathSet> {
        plan(&self.config.base_dir, title).await
    }

    pub async fn run_batch(
        &self,
        batch: Batch<'_>,
        events: &EventSink,
        cancel: &CancellationToken,
    ) -> Result<DownloadOutcome> {
        BatchOrchestrator::new(self.downloader.clone(), &self.config)
            .run(batch, events, cancel)
            .await
    }

    /// Download whatever is selected in a session and record the result on it
    pub async fn download_selection(
        &self,
        session: &mut Session,
        toggles: &OutputToggles,
        events: &EventSink,
        cancel: &CancellationToken,
    ) -> Result<DownloadOutcome> {
        let paths = self
            .plan_paths(Some(&session.listing().label))
            .await?
            .into_content()
            .ok_or_else(|| DownloadError::resolution(session.url(), "listing has no title"))?;

        let items = session.selected_items();
        let outcome = self
            .run_batch(
                Batch {
                    items: &items,
                    selection: 0..items.len(),
                    toggles,
                    paths: &paths,
                    part_of_collection: session.listing().is_collection(),
                },
                events,
                cancel,
            )
            .await?;

        session.record_run(paths, outcome.clone());
        Ok(outcome)
    }
}

/// Parse user input as a URL, reading a scheme-less address as https
fn parse_url(input: &str) -> std::result::Result<Url, url::ParseError> {
    match Url::parse(input) {
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(&format!("https://{}", input)),
        parsed => parsed,
    }
}
