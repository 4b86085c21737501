// bases/download_cli/src/args.rs
use clap::{Parser, Subcommand};
use media_downloader::{DownloaderConfig, OutputToggles, VideoQuality};
use std::ops::Range;
use std::path::PathBuf;

/// Download videos, playlists and their sidecar files via yt-dlp
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// yt-dlp executable to use
    #[arg(long, global = true, default_value = "yt-dlp")]
    pub ytdlp: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show what a URL contains without downloading anything
    Info {
        /// Video or playlist URL
        url: String,
    },
    /// Download a video, or a range of a playlist
    Download(DownloadArgs),
}

#[derive(clap::Args, Debug)]
pub struct DownloadArgs {
    /// Video or playlist URL
    pub url: String,

    /// Directory to store downloaded files
    #[arg(short, long, default_value = "downloads")]
    pub output_dir: PathBuf,

    /// First playlist item to download (1-based, inclusive)
    #[arg(long)]
    pub start: Option<usize>,

    /// Last playlist item to download (1-based, inclusive)
    #[arg(long)]
    pub end: Option<usize>,

    /// Video quality: best, medium, worst or audio
    #[arg(short, long, default_value_t = VideoQuality::Best)]
    pub quality: VideoQuality,

    /// Skip the media itself and only fetch the selected sidecar files
    #[arg(long)]
    pub no_video: bool,

    #[arg(long)]
    pub no_thumbnail: bool,

    #[arg(long)]
    pub no_metadata: bool,

    #[arg(long)]
    pub no_subtitles: bool,

    /// Subtitle language to request
    #[arg(long, default_value = "en")]
    pub sub_lang: String,

    /// Print the final outcome as JSON
    #[arg(long)]
    pub json: bool,
}

impl DownloadArgs {
    pub fn config(&self, ytdlp: PathBuf) -> DownloaderConfig {
        DownloaderConfig::default()
            .with_base_dir(&self.output_dir)
            .with_ytdlp_binary(ytdlp)
            .with_subtitle_language(&self.sub_lang)
    }

    pub fn toggles(&self) -> OutputToggles {
        OutputToggles {
            want_video: !self.no_video,
            video_quality: if self.no_video {
                VideoQuality::AudioOnly
            } else {
                self.quality
            },
            want_thumbnail: !self.no_thumbnail,
            want_metadata: !self.no_metadata,
            want_subtitles: !self.no_subtitles,
        }
    }

    /// The 1-based inclusive `--start`/`--end` pair as a 0-based half-open
    /// range over a listing of `len` items. Bounds are checked by the session.
    pub fn selection(&self, len: usize) -> Range<usize> {
        let start = self.start.unwrap_or(1).saturating_sub(1);
        let end = self.end.unwrap_or(len);
        start..end
    }
}
