// bases/download_web/src/forms.rs
use crate::error::AppError;
use media_downloader::{OutputToggles, ProgressEvent, VideoQuality};
use serde::Serialize;
use std::collections::HashMap;

/// Prefix of the per-item checkbox names on the selection page
pub const ITEM_FIELD_PREFIX: &str = "item_";

#[derive(Debug, Clone, PartialEq)]
pub struct DownloadForm {
    /// Checked rows, 0-based and ascending
    pub indices: Vec<usize>,
    pub toggles: OutputToggles,
}

/// Read the selection page. Checkboxes only appear in the form when checked.
pub fn parse_download_form(fields: &HashMap<String, String>) -> Result<DownloadForm, AppError> {
    let mut indices = fields
        .keys()
        .filter_map(|key| key.strip_prefix(ITEM_FIELD_PREFIX))
        .map(|index| {
            index
                .parse::<usize>()
                .map_err(|_| AppError::Validation(format!("Unknown row: {}", index)))
        })
        .collect::<Result<Vec<_>, _>>()?;
    indices.sort_unstable();

    let quality = fields
        .get("quality")
        .map(|q| q.parse::<VideoQuality>())
        .transpose()
        .map_err(AppError::Validation)?
        .unwrap_or_default();
    let want_video = fields.contains_key("video");

    Ok(DownloadForm {
        indices,
        toggles: OutputToggles {
            want_video,
            video_quality: if want_video {
                quality
            } else {
                VideoQuality::AudioOnly
            },
            want_thumbnail: fields.contains_key("thumbnail"),
            want_metadata: fields.contains_key("metadata"),
            want_subtitles: fields.contains_key("subtitles"),
        },
    })
}

/// One line of the download log
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogLine {
    pub class: &'static str,
    pub text: String,
}

/// Per-percent progress is too chatty for the log and is left out
pub fn log_line(event: &ProgressEvent) -> Option<LogLine> {
    let (class, text) = match event {
        ProgressEvent::Processing {
            index,
            total,
            title,
        } => ("info", format!("Processing {} of {}: {}", index, total, title)),
        ProgressEvent::ItemDone { title, .. } => ("success", format!("✅ Completed: {}", title)),
        ProgressEvent::ItemFailed { title, reason, .. } => (
            "error",
            format!("❌ Error downloading: {}. Reason: {}", title, reason),
        ),
        ProgressEvent::Cancelled { remaining } => (
            "warning",
            format!("Cancelled with {} item(s) not started", remaining),
        ),
        ProgressEvent::Downloading { .. } | ProgressEvent::OverallProgress { .. } => return None,
    };
    Some(LogLine {
        class,
        text,
    })
}

/// What the progress page changes for one event
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProgressView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fraction: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log: Option<LogLine>,
}

/// Turns the event stream of one batch into page updates. Remembers the
/// title in progress so download ticks can name it.
#[derive(Debug, Default)]
pub struct StatusTracker {
    current: String,
}

impl StatusTracker {
    pub fn view(&mut self, event: &ProgressEvent) -> ProgressView {
        let status = match event {
            ProgressEvent::Processing {
                index,
                total,
                title,
            } => {
                self.current = title.clone();
                Some(format!("Processing {} of {}: {}", index, total, title))
            }
            ProgressEvent::Downloading { percent, .. } => {
                Some(format!("Downloading: {} - {:.1}%", self.current, percent))
            }
            _ => None,
        };
        let fraction = match event {
            ProgressEvent::OverallProgress { fraction } => Some(*fraction),
            _ => None,
        };

        ProgressView {
            fraction,
            status,
            log: log_line(event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rstest::rstest;

    fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn checked_rows_and_options_are_read() {
        let form = parse_download_form(&fields(&[
            ("item_3", "on"),
            ("item_0", "on"),
            ("item_10", "on"),
            ("video", "on"),
            ("quality", "medium"),
            ("subtitles", "on"),
        ]))
        .unwrap();

        assert_eq!(form.indices, vec![0, 3, 10]);
        assert!(form.toggles.want_video);
        assert_eq!(form.toggles.video_quality, VideoQuality::Medium);
        assert!(form.toggles.want_subtitles);
        assert!(!form.toggles.want_thumbnail);
        assert!(!form.toggles.want_metadata);
    }

    #[test]
    fn unchecked_video_means_audio_only() {
        let form = parse_download_form(&fields(&[("quality", "best"), ("metadata", "on")])).unwrap();
        assert!(form.indices.is_empty());
        assert!(!form.toggles.want_video);
        assert_eq!(form.toggles.video_quality, VideoQuality::AudioOnly);
    }

    #[rstest]
    #[case(&[("item_x", "on")])]
    #[case(&[("quality", "ultra")])]
    fn malformed_fields_are_rejected(#[case] pairs: &[(&str, &str)]) {
        assert_matches!(
            parse_download_form(&fields(pairs)),
            Err(AppError::Validation(_))
        );
    }

    #[test]
    fn tracker_names_the_item_being_downloaded() {
        let mut tracker = StatusTracker::default();

        let started = tracker.view(&ProgressEvent::Processing {
            index: 1,
            total: 3,
            title: "Intro".to_string(),
        });
        assert_eq!(started.status.as_deref(), Some("Processing 1 of 3: Intro"));
        assert_eq!(started.log.map(|l| l.class), Some("info"));

        let tick = tracker.view(&ProgressEvent::Downloading {
            index: 1,
            percent: 42.0,
        });
        assert_eq!(
            tick,
            ProgressView {
                fraction: None,
                status: Some("Downloading: Intro - 42.0%".to_string()),
                log: None,
            }
        );

        let overall = tracker.view(&ProgressEvent::OverallProgress { fraction: 1.0 / 3.0 });
        assert_eq!(overall.fraction, Some(1.0 / 3.0));
        assert_eq!(overall.status, None);
    }

    #[test]
    fn empty_view_fields_are_left_out_of_json() {
        let view = ProgressView {
            fraction: Some(0.5),
            ..ProgressView::default()
        };
        assert_eq!(serde_json::to_string(&view).unwrap(), r#"{"fraction":0.5}"#);
    }

    #[test]
    fn log_skips_progress_ticks() {
        assert_eq!(
            log_line(&ProgressEvent::Downloading {
                index: 1,
                percent: 12.0
            }),
            None
        );
        assert_eq!(
            log_line(&ProgressEvent::ItemFailed {
                index: 2,
                title: "B".to_string(),
                reason: "Private video".to_string(),
            }),
            Some(LogLine {
                class: "error",
                text: "❌ Error downloading: B. Reason: Private video".to_string(),
            })
        );
    }
}
