// components/media_downloader/src/session.rs
use crate::error::{DownloadError, Result};
use crate::organization::ContentPaths;
use crate::types::{ContentItem, ContentListing, DownloadOutcome};
use std::collections::BTreeSet;
use std::ops::Range;

/// State of one resolve → select → download pass.
///
/// Created from a freshly resolved listing with every item selected. A new
/// resolve produces a new session; the listing itself is never edited.
#[derive(Debug, Clone)]
pub struct Session {
    url: String,
    listing: ContentListing,
    selected: BTreeSet<usize>,
    last_run: Option<(ContentPaths, DownloadOutcome)>,
}

impl Session {
    pub fn new(url: impl Into<String>, listing: ContentListing) -> Self {
        let selected = (0..listing.len()).collect();
        Self {
            url: url.into(),
            listing,
            selected,
            last_run: None,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn listing(&self) -> &ContentListing {
        &self.listing
    }

    pub fn select_all(&mut self) {
        self.selected = (0..self.listing.len()).collect();
    }

    pub fn deselect_all(&mut self) {
        self.selected.clear();
    }

    /// Replace the selection with a half-open, 0-based range
    pub fn select_range(&mut self, range: Range<usize>) -> Result<()> {
        self.check_range(&range)?;
        self.selected = range.collect();
        Ok(())
    }

    /// Replace the selection with exactly these 0-based indices
    pub fn select_indices(&mut self, indices: impl IntoIterator<Item = usize>) -> Result<()> {
        let indices: BTreeSet<usize> = indices.into_iter().collect();
        if let Some(&last) = indices.iter().next_back() {
            self.check_index(last)?;
        }
        self.selected = indices;
        Ok(())
    }

    pub fn toggle(&mut self, index: usize) -> Result<()> {
        self.check_index(index)?;
        if !self.selected.remove(&index) {
            self.selected.insert(index);
        }
        Ok(())
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.selected.contains(&index)
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    /// Selected items in listing order, positions untouched
    pub fn selected_items(&self) -> Vec<ContentItem> {
        self.selected
            .iter()
            .map(|&i| self.listing.items[i].clone())
            .collect()
    }

    /// The selection as a single range, if it is one
    pub fn contiguous_selection(&self) -> Option<Range<usize>> {
        let first = *self.selected.iter().next()?;
        let last = *self.selected.iter().next_back()?;
        (last - first + 1 == self.selected.len()).then_some(first..last + 1)
    }

    pub fn record_run(&mut self, paths: ContentPaths, outcome: DownloadOutcome) {
        self.last_run = Some((paths, outcome));
    }

    pub fn last_run(&self) -> Option<&(ContentPaths, DownloadOutcome)> {
        self.last_run.as_ref()
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.listing.len() {
            return Err(DownloadError::Selection {
                start: index,
                end: index.saturating_add(1),
                len: self.listing.len(),
            });
        }
        Ok(())
    }

    fn check_range(&self, range: &Range<usize>) -> Result<()> {
        if range.start > range.end || range.end > self.listing.len() {
            return Err(DownloadError::Selection {
                start: range.start,
                end: range.end,
                len: self.listing.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ytdlp::stub::item;
    use assert_matches::assert_matches;

    fn session(n: usize) -> Session {
        let items = (1..=n).map(|p| item(&format!("Video {}", p), p)).collect();
        Session::new(
            "https://example.com/list",
            ContentListing::collection("List", items),
        )
    }

    #[test]
    fn new_session_selects_everything() {
        let session = session(4);
        assert_eq!(session.selected_count(), 4);
        assert_eq!(session.contiguous_selection(), Some(0..4));
    }

    #[test]
    fn selected_items_keep_listing_positions() {
        let mut session = session(5);
        session.select_indices([4, 1, 3]).unwrap();

        let positions: Vec<_> = session.selected_items().iter().map(|i| i.position).collect();
        assert_eq!(positions, vec![2, 4, 5]);
        assert_eq!(session.contiguous_selection(), None);
    }

    #[test]
    fn toggle_and_ranges() {
        let mut session = session(5);
        session.deselect_all();
        assert_eq!(session.contiguous_selection(), None);

        session.select_range(1..3).unwrap();
        session.toggle(3).unwrap();
        assert_eq!(session.contiguous_selection(), Some(1..4));

        session.toggle(1).unwrap();
        assert!(!session.is_selected(1));
        assert_eq!(session.contiguous_selection(), Some(2..4));

        session.select_all();
        assert_eq!(session.selected_count(), 5);
    }

    #[test]
    fn out_of_range_selection_is_rejected() {
        let mut session = session(3);
        assert_matches!(session.toggle(3), Err(DownloadError::Selection { .. }));
        assert_matches!(session.select_range(2..5), Err(DownloadError::Selection { .. }));
        assert_matches!(session.select_indices([0, 7]), Err(DownloadError::Selection { .. }));
        assert_eq!(session.selected_count(), 3);
    }

    #[test]
    fn huge_indices_are_rejected_without_overflow() {
        let mut session = session(3);
        assert_matches!(
            session.select_indices([usize::MAX]),
            Err(DownloadError::Selection {
                start: usize::MAX,
                end: usize::MAX,
                len: 3
            })
        );
        assert_matches!(session.toggle(usize::MAX), Err(DownloadError::Selection { .. }));
        assert_eq!(session.selected_count(), 3);
    }
}
