// bases/download_web/src/jobs.rs
//! A batch running in the background while the browser watches it.
//!
//! Events are kept in order for the lifetime of the job, so a page that
//! connects late (or reconnects) replays everything from the start.

use media_downloader::{
    ContentPaths, DownloadOutcome, EventSink, MediaDownloader, OutputToggles, ProgressEvent,
    Session,
};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// How a finished job ended
#[derive(Debug, Clone, PartialEq)]
pub enum JobResult {
    Completed {
        outcome: DownloadOutcome,
        paths: ContentPaths,
    },
    Failed(String),
}

pub struct DownloadJob {
    kind: String,
    label: String,
    selected: usize,
    events: Mutex<Vec<ProgressEvent>>,
    result: Mutex<Option<JobResult>>,
    cancel: CancellationToken,

    /// Bumped on every new event and once more when the job finishes
    version: watch::Sender<u64>,
}

impl DownloadJob {
    pub(crate) fn new(session: &Session) -> Self {
        let listing = session.listing();
        let (version, _) = watch::channel(0);
        Self {
            kind: listing.kind.to_string(),
            label: listing.label.clone(),
            selected: session.selected_count(),
            events: Mutex::new(Vec::new()),
            result: Mutex::new(None),
            cancel: CancellationToken::new(),
            version,
        }
    }

    /// Start downloading the session's selection on the runtime
    pub fn spawn(
        downloader: Arc<MediaDownloader>,
        mut session: Session,
        toggles: OutputToggles,
    ) -> Arc<Self> {
        let job = Arc::new(Self::new(&session));
        let running = job.clone();

        tokio::spawn(async move {
            let (sink, mut events) = EventSink::channel();
            let download = async {
                let sink = sink;
                downloader
                    .download_selection(&mut session, &toggles, &sink, &running.cancel)
                    .await
            };
            let record = async {
                while let Some(event) = events.recv().await {
                    running.push(event);
                }
            };

            let (result, ()) = tokio::join!(download, record);
            let result = match result {
                Ok(outcome) => match session.last_run() {
                    Some((paths, _)) => JobResult::Completed {
                        outcome,
                        paths: paths.clone(),
                    },
                    None => JobResult::Failed("download finished without a record".to_string()),
                },
                Err(e) => {
                    warn!("Download of '{}' failed: {}", running.label, e);
                    JobResult::Failed(e.to_string())
                }
            };
            running.finish(result);
        });

        info!("Started download of '{}' ({} item(s))", job.label, job.selected);
        job
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn is_finished(&self) -> bool {
        self.result.lock().is_some()
    }

    pub fn result(&self) -> Option<JobResult> {
        self.result.lock().clone()
    }

    /// Every event recorded so far
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().clone()
    }

    /// Events from `cursor` on, and whether the job had finished when they
    /// were read. Read together so no event can slip in after a finish.
    pub fn since(&self, cursor: usize) -> (Vec<ProgressEvent>, bool) {
        let events = self.events.lock();
        let finished = self.is_finished();
        let fresh = events.get(cursor..).map(<[_]>::to_vec).unwrap_or_default();
        (fresh, finished)
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    /// Stop after the item currently downloading
    pub fn cancel(&self) {
        info!("Cancelling download of '{}'", self.label);
        self.cancel.cancel();
    }

    pub(crate) fn push(&self, event: ProgressEvent) {
        self.events.lock().push(event);
        self.version.send_modify(|v| *v += 1);
    }

    pub(crate) fn finish(&self, result: JobResult) {
        {
            let _events = self.events.lock();
            *self.result.lock() = Some(result);
        }
        self.version.send_modify(|v| *v += 1);
    }
}
