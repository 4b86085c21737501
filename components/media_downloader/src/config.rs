// components/media_downloader/src/config.rs
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Downloader configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloaderConfig {
    /// Directory under which one folder per content title is created
    pub base_dir: PathBuf,

    /// yt-dlp executable, looked up on PATH when not absolute
    pub ytdlp_binary: PathBuf,

    /// Subtitle language requested when subtitles are wanted
    pub subtitle_language: String,

    /// Pause after a failed item before the next one starts
    #[serde(with = "millis")]
    pub failure_pause: Duration,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("downloads"),
            ytdlp_binary: PathBuf::from("yt-dlp"),
            subtitle_language: "en".to_string(),
            failure_pause: Duration::from_secs(1),
        }
    }
}

impl DownloaderConfig {
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    pub fn with_ytdlp_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.ytdlp_binary = binary.into();
        self
    }

    pub fn with_subtitle_language(mut self, language: impl Into<String>) -> Self {
        self.subtitle_language = language.into();
        self
    }

    pub fn with_failure_pause(mut self, pause: Duration) -> Self {
        self.failure_pause = pause;
        self
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
