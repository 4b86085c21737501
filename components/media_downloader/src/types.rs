// components/media_downloader/src/types.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One downloadable unit of a resolved listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    /// Display name, also the basis for output file names
    pub title: String,

    /// Stable identifier from the resolver (may be empty)
    pub id: String,

    /// URL handed to the fetcher
    pub locator: String,

    /// Human-readable duration, if the resolver reported one
    pub duration: Option<String>,

    /// 1-based ordinal within the parent listing
    pub position: usize,
}

impl ContentItem {
    pub fn duration_label(&self) -> &str {
        self.duration.as_deref().unwrap_or("Unknown")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Single,
    Collection,
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentKind::Single => write!(f, "Video"),
            ContentKind::Collection => write!(f, "Playlist"),
        }
    }
}

/// The result of resolving one URL. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentListing {
    pub kind: ContentKind,
    pub label: String,
    pub items: Vec<ContentItem>,
}

impl ContentListing {
    pub fn single(item: ContentItem) -> Self {
        Self {
            kind: ContentKind::Single,
            label: item.title.clone(),
            items: vec![item],
        }
    }

    pub fn collection(label: impl Into<String>, items: Vec<ContentItem>) -> Self {
        Self {
            kind: ContentKind::Collection,
            label: label.into(),
            items,
        }
    }

    pub fn is_collection(&self) -> bool {
        self.kind == ContentKind::Collection
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoQuality {
    #[default]
    Best,
    Medium,
    Worst,
    AudioOnly,
}

impl FromStr for VideoQuality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "best" => Ok(VideoQuality::Best),
            "medium" => Ok(VideoQuality::Medium),
            "worst" => Ok(VideoQuality::Worst),
            "audio" | "audio-only" | "audio_only" => Ok(VideoQuality::AudioOnly),
            other => Err(format!(
                "unknown quality '{}' (expected best, medium, worst or audio)",
                other
            )),
        }
    }
}

impl fmt::Display for VideoQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VideoQuality::Best => "best",
            VideoQuality::Medium => "medium",
            VideoQuality::Worst => "worst",
            VideoQuality::AudioOnly => "audio",
        };
        f.write_str(name)
    }
}

/// Which assets to fetch for every item of a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputToggles {
    pub want_video: bool,
    pub video_quality: VideoQuality,
    pub want_thumbnail: bool,
    pub want_metadata: bool,
    pub want_subtitles: bool,
}

impl Default for OutputToggles {
    fn default() -> Self {
        Self {
            want_video: true,
            video_quality: VideoQuality::Best,
            want_thumbnail: true,
            want_metadata: true,
            want_subtitles: true,
        }
    }
}

/// Tally of one batch run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadOutcome {
    pub success_count: usize,
    pub failed_count: usize,

    /// Titles of failed items, in attempt order
    pub failed_titles: Vec<String>,

    /// Items never started because the batch was cancelled
    pub skipped_count: usize,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl DownloadOutcome {
    pub fn empty() -> Self {
        let now = Utc::now();
        Self {
            success_count: 0,
            failed_count: 0,
            failed_titles: Vec::new(),
            skipped_count: 0,
            started_at: now,
            finished_at: now,
        }
    }

    pub fn attempted(&self) -> usize {
        self.success_count + self.failed_count
    }

    /// Number of items selected for the batch that produced this outcome
    pub fn total(&self) -> usize {
        self.attempted() + self.skipped_count
    }

    pub fn was_cancelled(&self) -> bool {
        self.skipped_count > 0
    }
}
