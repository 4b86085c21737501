// components/media_downloader/src/events.rs
//! Progress events emitted while a batch runs.
//!
//! Events travel over an unbounded channel so that emitting never blocks the
//! fetch it is reporting on. A dropped receiver is not an error; the batch
//! simply runs without an audience.

use serde::Serialize;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ProgressEvent {
    /// About to fetch item `index` (1-based) of `total`
    Processing {
        index: usize,
        total: usize,
        title: String,
    },
    /// Fetch-level progress for the current item, 0.0..=100.0
    Downloading { index: usize, percent: f32 },
    ItemDone { index: usize, title: String },
    ItemFailed {
        index: usize,
        title: String,
        reason: String,
    },
    /// Fraction of the batch attempted so far, 0.0..=1.0
    OverallProgress { fraction: f32 },
    /// The batch stopped before `remaining` items were started
    Cancelled { remaining: usize },
}

impl ProgressEvent {
    pub fn is_terminal_for_item(&self) -> bool {
        matches!(
            self,
            ProgressEvent::ItemDone { .. } | ProgressEvent::ItemFailed { .. }
        )
    }
}

/// Sending half of a batch's event stream
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: Option<mpsc::UnboundedSender<ProgressEvent>>,
}

impl EventSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// A sink that discards everything
    pub fn discard() -> Self {
        Self { tx: None }
    }

    pub fn emit(&self, event: ProgressEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }

    pub fn for_item(&self, index: usize) -> ItemProgress<'_> {
        ItemProgress { sink: self, index }
    }
}

/// Progress reporter handed to a fetcher for a single item
#[derive(Debug, Clone, Copy)]
pub struct ItemProgress<'a> {
    sink: &'a EventSink,
    index: usize,
}

impl ItemProgress<'_> {
    pub fn downloading(&self, percent: f32) {
        self.sink.emit(ProgressEvent::Downloading {
            index: self.index,
            percent: percent.clamp(0.0, 100.0),
        });
    }

    /// One file of the item is complete
    pub fn finished(&self) {
        self.downloading(100.0);
    }
}
