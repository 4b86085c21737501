// components/media_downloader/src/format.rs
use crate::types::{OutputToggles, VideoQuality};
use std::fmt;

/// A yt-dlp format selector, tried left to right
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatPolicy(&'static str);

impl FormatPolicy {
    pub const BEST: FormatPolicy = FormatPolicy("bestvideo+bestaudio/best");
    pub const MEDIUM: FormatPolicy =
        FormatPolicy("bestvideo[height<=720]+bestaudio/best[height<=720]/best");
    pub const WORST: FormatPolicy = FormatPolicy("worstvideo+worstaudio/worst");
    pub const AUDIO_ONLY: FormatPolicy = FormatPolicy("bestaudio/best");

    pub fn for_quality(quality: VideoQuality) -> Self {
        match quality {
            VideoQuality::Best => Self::BEST,
            VideoQuality::Medium => Self::MEDIUM,
            VideoQuality::Worst => Self::WORST,
            VideoQuality::AudioOnly => Self::AUDIO_ONLY,
        }
    }

    /// Audio-only whenever video is not wanted
    pub fn for_toggles(toggles: &OutputToggles) -> Self {
        if toggles.want_video {
            Self::for_quality(toggles.video_quality)
        } else {
            Self::AUDIO_ONLY
        }
    }

    pub fn selector(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for FormatPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}
