// components/media_downloader/src/orchestrator.rs
//! Sequential batch downloads over a selected range of a listing.
//!
//! Items are fetched one at a time in listing order. A failed item is
//! recorded and the batch moves on; only an invalid selection stops a batch
//! before it starts. Cancellation is honoured between items, never during one.

use crate::config::DownloaderConfig;
use crate::error::{DownloadError, Result};
use crate::events::{EventSink, ProgressEvent};
use crate::format::FormatPolicy;
use crate::organization::{self, ContentPaths};
use crate::types::{ContentItem, DownloadOutcome, OutputToggles};
use crate::utils::{
    sanitize_title, trim_dots_and_spaces, truncate_utf8, MAX_NAME_BYTES, SUFFIX_RESERVE, UNTITLED,
};
use crate::ytdlp::{Downloader, FetchRequest};
use chrono::Utc;
use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// One batch: which items, what to fetch for them, and where to put it
#[derive(Debug, Clone)]
pub struct Batch<'a> {
    pub items: &'a [ContentItem],

    /// Half-open, 0-based range into `items`
    pub selection: Range<usize>,
    pub toggles: &'a OutputToggles,
    pub paths: &'a ContentPaths,

    /// Whether `items` came from a playlist
    pub part_of_collection: bool,
}

pub struct BatchOrchestrator {
    downloader: Arc<dyn Downloader + Send + Sync>,
    subtitle_language: String,
    failure_pause: Duration,
}

impl BatchOrchestrator {
    pub fn new(downloader: Arc<dyn Downloader + Send + Sync>, config: &DownloaderConfig) -> Self {
        Self {
            downloader,
            subtitle_language: config.subtitle_language.clone(),
            failure_pause: config.failure_pause,
        }
    }

    /// Run a batch to completion (or cancellation) and return its tally.
    ///
    /// Fails only if the selection is out of bounds or the destination
    /// directories cannot be created, and then before any fetch is attempted.
    pub async fn run(
        &self,
        batch: Batch<'_>,
        events: &EventSink,
        cancel: &CancellationToken,
    ) -> Result<DownloadOutcome> {
        let selected = select(batch.items, batch.selection.clone())?;
        if selected.is_empty() {
            return Ok(DownloadOutcome::empty());
        }
        organization::ensure(batch.paths).await?;

        let total = selected.len();
        let numbered = batch.part_of_collection && total > 1;
        let format = FormatPolicy::for_toggles(batch.toggles);
        let mut outcome = DownloadOutcome::empty();

        info!(
            "Starting batch of {} item(s) into {} using format {}",
            total,
            batch.paths.root.display(),
            format
        );

        for (offset, item) in selected.iter().enumerate() {
            let index = offset + 1;

            if cancel.is_cancelled() {
                let remaining = total - offset;
                warn!("Batch cancelled with {} item(s) not started", remaining);
                outcome.skipped_count = remaining;
                events.emit(ProgressEvent::Cancelled { remaining });
                break;
            }

            events.emit(ProgressEvent::Processing {
                index,
                total,
                title: item.title.clone(),
            });

            let request = FetchRequest {
                item,
                format,
                toggles: batch.toggles,
                paths: batch.paths,
                file_name: file_name(item, numbered),
                subtitle_language: &self.subtitle_language,
            };

            match self.downloader.fetch(&request, events.for_item(index)).await {
                Ok(()) => {
                    info!("Completed {}/{}: {}", index, total, item.title);
                    outcome.success_count += 1;
                    events.emit(ProgressEvent::ItemDone {
                        index,
                        title: item.title.clone(),
                    });
                }
                Err(e) => {
                    warn!("Failed {}/{}: {}: {}", index, total, item.title, e.reason());
                    outcome.failed_count += 1;
                    outcome.failed_titles.push(item.title.clone());
                    events.emit(ProgressEvent::ItemFailed {
                        index,
                        title: item.title.clone(),
                        reason: e.reason(),
                    });

                    if index < total {
                        self.pause_after_failure(cancel).await;
                    }
                }
            }

            events.emit(ProgressEvent::OverallProgress {
                fraction: index as f32 / total as f32,
            });
        }

        if !outcome.was_cancelled() {
            events.emit(ProgressEvent::OverallProgress { fraction: 1.0 });
        }

        outcome.finished_at = Utc::now();
        info!(
            "Batch finished: {} succeeded, {} failed, {} skipped",
            outcome.success_count, outcome.failed_count, outcome.skipped_count
        );
        Ok(outcome)
    }

    async fn pause_after_failure(&self, cancel: &CancellationToken) {
        if self.failure_pause.is_zero() {
            return;
        }
        tokio::select! {
            _ = tokio::time::sleep(self.failure_pause) => {}
            _ = cancel.cancelled() => {}
        }
    }
}

/// The items covered by a half-open selection
pub fn select(items: &[ContentItem], selection: Range<usize>) -> Result<&[ContentItem]> {
    if selection.start > selection.end || selection.end > items.len() {
        return Err(DownloadError::Selection {
            start: selection.start,
            end: selection.end,
            len: items.len(),
        });
    }
    Ok(&items[selection])
}

/// Output file name (without extension) for an item.
///
/// Items of a multi-item playlist batch carry their listing position so names
/// stay distinct; everything else is just the sanitized title. Long titles are
/// cut so the name plus any extension yt-dlp adds stays a legal file name.
pub fn file_name(item: &ContentItem, numbered: bool) -> String {
    let prefix = if numbered {
        format!("{}. ", item.position)
    } else {
        String::new()
    };
    let budget = MAX_NAME_BYTES.saturating_sub(SUFFIX_RESERVE + prefix.len());

    let title = sanitize_title(&item.title);
    let stem = trim_dots_and_spaces(truncate_utf8(&title, budget));
    let stem = if stem.is_empty() { UNTITLED } else { stem };
    format!("{}{}", prefix, stem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ytdlp::stub::{item, DownloaderStub};
    use crate::events::ItemProgress;
    use assert_matches::assert_matches;
    use async_trait::async_trait;

    fn config() -> DownloaderConfig {
        DownloaderConfig::default().with_failure_pause(Duration::ZERO)
    }

    fn paths() -> ContentPaths {
        paths_under(&std::env::temp_dir().join("media-downloader-batch"))
    }

    fn paths_under(root: &std::path::Path) -> ContentPaths {
        let root = root.to_path_buf();
        ContentPaths {
            videos: root.join("videos"),
            thumbnails: root.join("thumbnails"),
            metadata: root.join("metadata"),
            subtitles: root.join("subtitles"),
            root,
        }
    }

    fn items(titles: &[&str]) -> Vec<ContentItem> {
        titles
            .iter()
            .enumerate()
            .map(|(i, title)| item(title, i + 1))
            .collect()
    }

    async fn run(
        stub: Arc<DownloaderStub>,
        items: &[ContentItem],
        selection: Range<usize>,
        part_of_collection: bool,
    ) -> (Result<DownloadOutcome>, Vec<ProgressEvent>) {
        let orchestrator = BatchOrchestrator::new(stub, &config());
        let toggles = OutputToggles::default();
        let paths = paths();
        let (sink, mut rx) = EventSink::channel();

        let result = orchestrator
            .run(
                Batch {
                    items,
                    selection,
                    toggles: &toggles,
                    paths: &paths,
                    part_of_collection,
                },
                &sink,
                &CancellationToken::new(),
            )
            .await;
        drop(sink);

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        (result, events)
    }

    #[tokio::test]
    async fn test_failed_item_does_not_stop_batch() {
        let stub = Arc::new(DownloaderStub::new().failing("B"));
        let listing = items(&["A", "B", "C"]);

        let (result, _) = run(stub.clone(), &listing, 0..3, true).await;
        let outcome = result.unwrap();

        assert_eq!(outcome.success_count, 2);
        assert_eq!(outcome.failed_count, 1);
        assert_eq!(outcome.failed_titles, vec!["B"]);
        assert_eq!(outcome.skipped_count, 0);
        assert_eq!(stub.fetched_titles(), vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn test_empty_selection_fetches_nothing() {
        let stub = Arc::new(DownloaderStub::new());
        let listing = items(&["A", "B"]);

        let (result, events) = run(stub.clone(), &listing, 1..1, true).await;
        let outcome = result.unwrap();

        assert_eq!(outcome.success_count, 0);
        assert_eq!(outcome.failed_count, 0);
        assert!(outcome.failed_titles.is_empty());
        assert!(events.is_empty());
        assert!(stub.fetched().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_selection_fails_before_fetching() {
        let stub = Arc::new(DownloaderStub::new());
        let listing = items(&["A", "B", "C"]);

        let (inverted, _) = run(stub.clone(), &listing, 2..1, true).await;
        assert_matches!(
            inverted,
            Err(DownloadError::Selection {
                start: 2,
                end: 1,
                len: 3
            })
        );

        let (past_end, _) = run(stub.clone(), &listing, 0..4, true).await;
        assert_matches!(past_end, Err(DownloadError::Selection { end: 4, .. }));

        assert!(stub.fetched().is_empty());
    }

    #[tokio::test]
    async fn test_counts_cover_every_valid_range() {
        let listing = items(&["A", "B", "C", "D"]);

        for start in 0..=listing.len() {
            for end in start..=listing.len() {
                let stub = Arc::new(DownloaderStub::new().failing("C"));
                let (result, _) = run(stub.clone(), &listing, start..end, true).await;
                let outcome = result.unwrap();

                assert_eq!(stub.fetched().len(), end - start);
                assert_eq!(outcome.success_count + outcome.failed_count, end - start);
            }
        }
    }

    #[tokio::test]
    async fn test_unwritable_destination_fails_before_fetching() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let stub = Arc::new(DownloaderStub::new());
        let orchestrator = BatchOrchestrator::new(stub.clone(), &config());
        let listing = items(&["A", "B"]);
        let toggles = OutputToggles::default();
        let paths = paths_under(&blocker.join("Show"));

        let result = orchestrator
            .run(
                Batch {
                    items: &listing,
                    selection: 0..2,
                    toggles: &toggles,
                    paths: &paths,
                    part_of_collection: true,
                },
                &EventSink::discard(),
                &CancellationToken::new(),
            )
            .await;

        assert_matches!(result, Err(DownloadError::Planning { .. }));
        assert!(stub.fetched().is_empty());
    }

    #[tokio::test]
    async fn test_missing_destination_is_created() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let stub = Arc::new(DownloaderStub::new());
        let orchestrator = BatchOrchestrator::new(stub, &config());
        let listing = items(&["A"]);
        let toggles = OutputToggles::default();
        let paths = paths_under(&temp_dir.path().join("Fresh"));

        orchestrator
            .run(
                Batch {
                    items: &listing,
                    selection: 0..1,
                    toggles: &toggles,
                    paths: &paths,
                    part_of_collection: false,
                },
                &EventSink::discard(),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert!(paths.metadata.is_dir());
    }

    #[tokio::test]
    async fn test_collection_names_carry_positions() {
        let stub = Arc::new(DownloaderStub::new());
        let listing = items(&["One", "Two", "Three", "Four", "Five"]);

        run(stub.clone(), &listing, 1..5, true).await.0.unwrap();

        let names: Vec<_> = stub.fetched().into_iter().map(|r| r.file_name).collect();
        assert_eq!(names, vec!["2. Two", "3. Three", "4. Four", "5. Five"]);
    }

    #[tokio::test]
    async fn test_single_video_name_has_no_prefix() {
        let stub = Arc::new(DownloaderStub::new());
        let listing = vec![item("My: Video/Clip", 1)];

        run(stub.clone(), &listing, 0..1, false).await.0.unwrap();

        assert_eq!(stub.fetched()[0].file_name, "My - VideoClip");
    }

    #[tokio::test]
    async fn test_single_playlist_item_has_no_prefix() {
        let stub = Arc::new(DownloaderStub::new());
        let listing = items(&["One", "Two", "Three"]);

        run(stub.clone(), &listing, 2..3, true).await.0.unwrap();

        assert_eq!(stub.fetched()[0].file_name, "Three");
    }

    #[tokio::test]
    async fn test_events_are_ordered_per_item() {
        let stub = Arc::new(DownloaderStub::new().failing("B"));
        let listing = items(&["A", "B"]);

        let (_, events) = run(stub, &listing, 0..2, true).await;

        assert_eq!(
            events,
            vec![
                ProgressEvent::Processing {
                    index: 1,
                    total: 2,
                    title: "A".to_string()
                },
                ProgressEvent::Downloading {
                    index: 1,
                    percent: 50.0
                },
                ProgressEvent::Downloading {
                    index: 1,
                    percent: 100.0
                },
                ProgressEvent::ItemDone {
                    index: 1,
                    title: "A".to_string()
                },
                ProgressEvent::OverallProgress { fraction: 0.5 },
                ProgressEvent::Processing {
                    index: 2,
                    total: 2,
                    title: "B".to_string()
                },
                ProgressEvent::ItemFailed {
                    index: 2,
                    title: "B".to_string(),
                    reason: "Video unavailable".to_string()
                },
                ProgressEvent::OverallProgress { fraction: 1.0 },
                ProgressEvent::OverallProgress { fraction: 1.0 },
            ]
        );
    }

    /// Cancels the batch while fetching the given title
    struct CancelDuring {
        title: &'static str,
        token: CancellationToken,
        inner: DownloaderStub,
    }

    #[async_trait]
    impl Downloader for CancelDuring {
        async fn check_available(&self) -> Result<()> {
            Ok(())
        }

        async fn resolve(&self, url: &url::Url) -> Result<crate::types::ContentListing> {
            self.inner.resolve(url).await
        }

        async fn fetch(&self, request: &FetchRequest<'_>, progress: ItemProgress<'_>) -> Result<()> {
            if request.item.title == self.title {
                self.token.cancel();
            }
            self.inner.fetch(request, progress).await
        }
    }

    #[tokio::test]
    async fn test_cancel_stops_between_items() {
        let token = CancellationToken::new();
        let downloader = Arc::new(CancelDuring {
            title: "B",
            token: token.clone(),
            inner: DownloaderStub::new(),
        });
        let orchestrator = BatchOrchestrator::new(downloader.clone(), &config());
        let listing = items(&["A", "B", "C", "D"]);
        let toggles = OutputToggles::default();
        let paths = paths();
        let (sink, mut rx) = EventSink::channel();

        let outcome = orchestrator
            .run(
                Batch {
                    items: &listing,
                    selection: 0..4,
                    toggles: &toggles,
                    paths: &paths,
                    part_of_collection: true,
                },
                &sink,
                &token,
            )
            .await
            .unwrap();
        drop(sink);

        assert_eq!(outcome.success_count, 2);
        assert_eq!(outcome.skipped_count, 2);
        assert_eq!(outcome.total(), 4);
        assert_eq!(downloader.inner.fetched_titles(), vec!["A", "B"]);

        let mut last = None;
        while let Some(event) = rx.recv().await {
            last = Some(event);
        }
        assert_eq!(last, Some(ProgressEvent::Cancelled { remaining: 2 }));
    }

    #[test]
    fn test_file_name() {
        let episode = item("Ep: 1", 7);
        assert_eq!(file_name(&episode, true), "7. Ep - 1");
        assert_eq!(file_name(&episode, false), "Ep - 1");
    }

    #[test]
    fn test_long_multibyte_title_leaves_room_for_extensions() {
        let long = item(&"あ".repeat(100), 12);

        for numbered in [true, false] {
            let name = file_name(&long, numbered);
            let sidecar = format!("{}.info.json", name);
            assert!(
                sidecar.len() <= MAX_NAME_BYTES,
                "'{}' is {} bytes",
                sidecar,
                sidecar.len()
            );
            assert!(name.trim_start_matches("12. ").chars().all(|c| c == 'あ'));
        }
        assert!(file_name(&long, true).starts_with("12. あ"));
    }
}
