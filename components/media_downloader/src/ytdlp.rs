// components/media_downloader/src/ytdlp.rs
use crate::error::{DownloadError, Result};
use crate::events::ItemProgress;
use crate::format::FormatPolicy;
use crate::organization::ContentPaths;
use crate::types::{ContentItem, ContentListing, OutputToggles};
use crate::utils::{escape_template, format_duration};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use url::Url;

/// Everything the fetch primitive needs for one item
#[derive(Debug, Clone)]
pub struct FetchRequest<'a> {
    pub item: &'a ContentItem,
    pub format: FormatPolicy,
    pub toggles: &'a OutputToggles,
    pub paths: &'a ContentPaths,

    /// Output file name without extension
    pub file_name: String,
    pub subtitle_language: &'a str,
}

#[async_trait]
pub trait Downloader {
    /// Check if the downloader is available and has all required dependencies
    async fn check_available(&self) -> Result<()>;

    /// Turn a URL into a listing without downloading anything
    async fn resolve(&self, url: &Url) -> Result<ContentListing>;

    /// Fetch one item, reporting progress as it goes
    async fn fetch(&self, request: &FetchRequest<'_>, progress: ItemProgress<'_>) -> Result<()>;
}

const PROGRESS_MARKER: &str = "[media-downloader]";

pub struct YtDlp {
    binary: PathBuf,
}

impl YtDlp {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

impl Default for YtDlp {
    fn default() -> Self {
        Self::new("yt-dlp")
    }
}

#[async_trait]
impl Downloader for YtDlp {
    async fn check_available(&self) -> Result<()> {
        which::which(&self.binary)
            .map(|path| tracing::debug!("Using yt-dlp at {}", path.display()))
            .map_err(|_| DownloadError::DependencyNotFound(self.binary.display().to_string()))
    }

    async fn resolve(&self, url: &Url) -> Result<ContentListing> {
        tracing::debug!("Resolving {}", url);

        let output = Command::new(&self.binary)
            .arg("--flat-playlist")
            .arg("--dump-single-json")
            .arg("--no-warnings")
            .arg(url.as_str())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| DownloadError::resolution(url.as_str(), e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DownloadError::resolution(
                url.as_str(),
                failure_reason(stderr.lines(), output.status),
            ));
        }

        listing_from_json(url.as_str(), &output.stdout)
    }

    async fn fetch(&self, request: &FetchRequest<'_>, progress: ItemProgress<'_>) -> Result<()> {
        let args = fetch_args(request);
        tracing::debug!("Running {} {}", self.binary.display(), args.join(" "));

        let mut child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| DownloadError::item_fetch(&request.item.title, e.to_string()))?;

        let stdout = child.stdout.take().ok_or_else(|| {
            DownloadError::item_fetch(&request.item.title, "yt-dlp stdout was not captured")
        })?;
        let stderr = child.stderr.take().ok_or_else(|| {
            DownloadError::item_fetch(&request.item.title, "yt-dlp stderr was not captured")
        })?;

        let read_progress = async {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                match parse_progress_line(&line) {
                    Some(FetchProgress::Downloading(percent)) => progress.downloading(percent),
                    Some(FetchProgress::Finished) => progress.finished(),
                    None => tracing::trace!("yt-dlp: {}", line),
                }
            }
        };
        let read_errors = async {
            let mut lines = BufReader::new(stderr).lines();
            let mut collected = Vec::new();
            while let Ok(Some(line)) = lines.next_line().await {
                tracing::debug!("yt-dlp stderr: {}", line);
                collected.push(line);
            }
            collected
        };

        let ((), stderr_lines) = tokio::join!(read_progress, read_errors);
        let status = child.wait().await?;

        if !status.success() {
            return Err(DownloadError::item_fetch(
                &request.item.title,
                failure_reason(stderr_lines.iter().map(String::as_str), status),
            ));
        }

        Ok(())
    }
}

/// Command line for fetching one item, excluding the binary
pub fn fetch_args(request: &FetchRequest<'_>) -> Vec<String> {
    let output = |kind: &str, dir: &Path, suffix: &str| {
        let target = dir.join(&request.file_name);
        format!("{}:{}{}", kind, escape_template(&target.to_string_lossy()), suffix)
    };

    let mut args = vec![
        "--format".to_string(),
        request.format.selector().to_string(),
        "--no-playlist".to_string(),
        "--no-colors".to_string(),
        "--newline".to_string(),
        "--progress-template".to_string(),
        format!(
            "download:{} %(progress.status)s %(progress._percent_str)s",
            PROGRESS_MARKER
        ),
        "--output".to_string(),
        output("default", &request.paths.videos, ".%(ext)s"),
        "--output".to_string(),
        output("thumbnail", &request.paths.thumbnails, ".%(ext)s"),
        "--output".to_string(),
        output("infojson", &request.paths.metadata, ".info.json"),
        "--output".to_string(),
        output("subtitle", &request.paths.subtitles, ".%(ext)s"),
    ];

    let toggles = request.toggles;
    if !toggles.want_video {
        args.push("--skip-download".to_string());
    }
    if toggles.want_thumbnail {
        args.push("--write-thumbnail".to_string());
    }
    if toggles.want_metadata {
        args.push("--write-info-json".to_string());
    }
    if toggles.want_subtitles {
        args.push("--write-subs".to_string());
        args.push("--write-auto-subs".to_string());
        args.push("--sub-langs".to_string());
        args.push(request.subtitle_language.to_string());
    }

    args.push(request.item.locator.clone());
    args
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FetchProgress {
    Downloading(f32),
    Finished,
}

/// Parse one line printed through our progress template
pub fn parse_progress_line(line: &str) -> Option<FetchProgress> {
    let plain = strip_ansi(line);
    let rest = plain.trim().strip_prefix(PROGRESS_MARKER)?;
    let mut parts = rest.split_whitespace();

    match parts.next()? {
        "finished" => Some(FetchProgress::Finished),
        "downloading" => {
            parts
                .next()?
                .trim_end_matches('%')
                .parse::<f32>()
                .ok()
                .map(FetchProgress::Downloading)
        }
        _ => None,
    }
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\u{1b}' {
            for c in chars.by_ref() {
                if c.is_ascii_alphabetic() {
                    break;
                }
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Prefer yt-dlp's own `ERROR:` line, then the last thing it said
fn failure_reason<'a>(
    stderr: impl Iterator<Item = &'a str>,
    status: std::process::ExitStatus,
) -> String {
    let lines: Vec<&str> = stderr.map(str::trim).filter(|l| !l.is_empty()).collect();

    lines
        .iter()
        .rev()
        .find_map(|l| l.strip_prefix("ERROR:"))
        .map(|reason| reason.trim().to_string())
        .or_else(|| lines.last().map(|l| l.to_string()))
        .unwrap_or_else(|| format!("yt-dlp exited with status: {}", status))
}

#[derive(Debug, Deserialize)]
struct YtDlpInfo {
    title: Option<String>,
    id: Option<String>,
    url: Option<String>,
    webpage_url: Option<String>,
    duration: Option<f64>,
    duration_string: Option<String>,
    entries: Option<Vec<Option<YtDlpInfo>>>,
}

impl YtDlpInfo {
    fn into_item(self, url: &str, position: usize) -> Result<ContentItem> {
        let title = self.title.filter(|t| !t.is_empty()).ok_or_else(|| {
            DownloadError::resolution(url, format!("entry {} has no title", position))
        })?;
        let locator = self.url.or(self.webpage_url).ok_or_else(|| {
            DownloadError::resolution(url, format!("entry {} ({}) has no URL", position, title))
        })?;
        let duration = self
            .duration_string
            .filter(|d| !d.is_empty())
            .or_else(|| self.duration.map(format_duration));

        Ok(ContentItem {
            title,
            id: self.id.unwrap_or_default(),
            locator,
            duration,
            position,
        })
    }
}

/// Build a listing from `--flat-playlist --dump-single-json` output
pub fn listing_from_json(url: &str, json: &[u8]) -> Result<ContentListing> {
    let mut info: YtDlpInfo = serde_json::from_slice(json)
        .map_err(|e| DownloadError::resolution(url, format!("unreadable yt-dlp output: {}", e)))?;

    match info.entries.take() {
        Some(entries) => {
            let label = info
                .title
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "Unknown Playlist".to_string());
            let items = entries
                .into_iter()
                .flatten()
                .enumerate()
                .map(|(i, entry)| entry.into_item(url, i + 1))
                .collect::<Result<Vec<_>>>()?;
            Ok(ContentListing::collection(label, items))
        }
        None => {
            // A single video's `url` may be a raw stream; fetch its page instead
            info.url = info.webpage_url.take().or(info.url).or_else(|| Some(url.to_string()));
            Ok(ContentListing::single(info.into_item(url, 1)?))
        }
    }
}
