// components/media_downloader/src/organization.rs
use crate::error::{DownloadError, Result};
use crate::utils::sanitize_title;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const VIDEOS_DIR: &str = "videos";
pub const THUMBNAILS_DIR: &str = "thumbnails";
pub const METADATA_DIR: &str = "metadata";
pub const SUBTITLES_DIR: &str = "subtitles";

/// Directories planned for one content title
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentPaths {
    pub root: PathBuf,
    pub videos: PathBuf,
    pub thumbnails: PathBuf,
    pub metadata: PathBuf,
    pub subtitles: PathBuf,
}

impl ContentPaths {
    fn under(base_dir: &Path, title: &str) -> Self {
        let root = base_dir.join(sanitize_title(title));
        Self {
            videos: root.join(VIDEOS_DIR),
            thumbnails: root.join(THUMBNAILS_DIR),
            metadata: root.join(METADATA_DIR),
            subtitles: root.join(SUBTITLES_DIR),
            root,
        }
    }

    /// Every directory in creation order, root first
    pub fn all(&self) -> [&Path; 5] {
        [
            &self.root,
            &self.videos,
            &self.thumbnails,
            &self.metadata,
            &self.subtitles,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum PathSet {
    /// Only the base directory, used before any content is known
    Base { root: PathBuf },
    Content(ContentPaths),
}

impl PathSet {
    pub fn root(&self) -> &Path {
        match self {
            PathSet::Base { root } => root,
            PathSet::Content(paths) => &paths.root,
        }
    }

    pub fn into_content(self) -> Option<ContentPaths> {
        match self {
            PathSet::Content(paths) => Some(paths),
            PathSet::Base { .. } => None,
        }
    }
}

/// Plan the directory layout for a title under `base_dir` and create whatever
/// is missing. Re-planning an existing tree is a no-op.
pub async fn plan(base_dir: impl AsRef<Path>, title: Option<&str>) -> Result<PathSet> {
    let base_dir = base_dir.as_ref();
    create_dir(base_dir).await?;

    let Some(title) = title else {
        return Ok(PathSet::Base {
            root: base_dir.to_path_buf(),
        });
    };

    let paths = ContentPaths::under(base_dir, title);
    ensure(&paths).await?;

    tracing::debug!("Planned content directories under {}", paths.root.display());
    Ok(PathSet::Content(paths))
}

/// Create any missing directory of an already planned layout
pub async fn ensure(paths: &ContentPaths) -> Result<()> {
    for dir in paths.all() {
        create_dir(dir).await?;
    }
    Ok(())
}

async fn create_dir(dir: &Path) -> Result<()> {
    if tokio::fs::try_exists(dir).await.unwrap_or(false) {
        return Ok(());
    }
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| DownloadError::planning(dir, e))?;
    tracing::info!("Created directory: {}", dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::TempDir;

    fn dir_entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<_> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_plan_without_title_only_creates_base() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("downloads");

        let paths = plan(&base, None).await.unwrap();

        assert_eq!(paths, PathSet::Base { root: base.clone() });
        assert!(base.is_dir());
        assert!(dir_entries(&base).is_empty());
    }

    #[tokio::test]
    async fn test_plan_creates_root_and_four_children() {
        let temp_dir = TempDir::new().unwrap();

        let paths = plan(temp_dir.path(), Some("My: Video/Clip"))
            .await
            .unwrap()
            .into_content()
            .unwrap();

        assert_eq!(paths.root, temp_dir.path().join("My - VideoClip"));
        for dir in paths.all() {
            assert!(dir.is_dir(), "{} should exist", dir.display());
        }
        assert_eq!(dir_entries(temp_dir.path()), vec!["My - VideoClip"]);
        assert_eq!(
            dir_entries(&paths.root),
            vec!["metadata", "subtitles", "thumbnails", "videos"]
        );
    }

    #[tokio::test]
    async fn test_plan_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();

        let first = plan(temp_dir.path(), Some("Playlist")).await.unwrap();
        std::fs::write(first.root().join("videos").join("keep.mp4"), b"data").unwrap();
        let second = plan(temp_dir.path(), Some("Playlist")).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(dir_entries(temp_dir.path()), vec!["Playlist"]);
        assert_eq!(dir_entries(&second.root().join("videos")), vec!["keep.mp4"]);
    }

    #[tokio::test]
    async fn test_plan_falls_back_to_untitled() {
        let temp_dir = TempDir::new().unwrap();
        let paths = plan(temp_dir.path(), Some(" ?*. ")).await.unwrap();
        assert_eq!(paths.root(), temp_dir.path().join("untitled"));
    }

    #[tokio::test]
    async fn test_plan_reports_uncreatable_directory() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("file");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let result = plan(&blocker, Some("Title")).await;

        assert_matches!(result, Err(DownloadError::Planning { .. }));
    }
}
