//! Index arithmetic for the two full-screen viewers.
//!
//! [`Lightbox`] steps through the gallery's currently displayed entries,
//! addressed by content id so that a sort or search change between opening
//! and navigating can't point it at the wrong image. [`ComicReader`] pages
//! through one comic.

use crate::naming::{last_segment, page_number};
use crate::types::ImageEntry;

/// Viewer over the displayed gallery ordering.
#[derive(Debug, Clone)]
pub struct Lightbox<'a> {
    entries: &'a [ImageEntry],
    index: usize,
}

impl<'a> Lightbox<'a> {
    /// Open on the entry with `content_id`, if it is displayed.
    pub fn open(entries: &'a [ImageEntry], content_id: &str) -> Option<Self> {
        let index = entries.iter().position(|e| e.content_id == content_id)?;
        Some(Self { entries, index })
    }

    pub fn current(&self) -> &'a ImageEntry {
        &self.entries[self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// One-based position and total, for a "3 / 24" counter.
    pub fn position(&self) -> (usize, usize) {
        (self.index + 1, self.entries.len())
    }

    pub fn has_next(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    pub fn has_previous(&self) -> bool {
        self.index > 0
    }

    /// Move forward, staying on the last entry at the end.
    pub fn next(&mut self) -> &'a ImageEntry {
        if self.has_next() {
            self.index += 1;
        }
        self.current()
    }

    pub fn previous(&mut self) -> &'a ImageEntry {
        if self.has_previous() {
            self.index -= 1;
        }
        self.current()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReadingOrder {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ViewMode {
    #[default]
    Single,
    /// Two-page spread; navigation moves by two pages.
    Double,
    /// Grid of every page. Picking one with [`ComicReader::open_page`]
    /// returns to single view.
    Overview,
}

impl ViewMode {
    fn step(self) -> usize {
        match self {
            ViewMode::Single | ViewMode::Overview => 1,
            ViewMode::Double => 2,
        }
    }
}

pub const MIN_ZOOM: f32 = 0.5;
pub const MAX_ZOOM: f32 = 3.0;
pub const ZOOM_STEP: f32 = 0.25;

/// Sort page URLs by the first number in their file name.
///
/// Stable, so pages with the same (or no) number keep their listed order.
pub fn sort_pages(pages: &mut [String]) {
    pages.sort_by_key(|url| page_number(last_segment(url)));
}

/// Page navigation for one comic.
#[derive(Debug, Clone)]
pub struct ComicReader {
    /// Pages in ascending page-number order.
    pages: Vec<String>,
    order: ReadingOrder,
    mode: ViewMode,
    index: usize,
    zoom: f32,
}

impl ComicReader {
    pub fn new(mut pages: Vec<String>) -> Self {
        sort_pages(&mut pages);
        Self {
            pages,
            order: ReadingOrder::default(),
            mode: ViewMode::default(),
            index: 0,
            zoom: 1.0,
        }
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn order(&self) -> ReadingOrder {
        self.order
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    fn page(&self, index: usize) -> Option<&str> {
        let actual = match self.order {
            ReadingOrder::Ascending => index,
            ReadingOrder::Descending => self.pages.len().checked_sub(index + 1)?,
        };
        self.pages.get(actual).map(String::as_str)
    }

    /// Pages in the current reading order.
    pub fn ordered_pages(&self) -> Vec<&str> {
        (0..self.pages.len()).filter_map(|i| self.page(i)).collect()
    }

    /// Pages on screen: one, two in double mode when a second exists, or
    /// all of them in overview.
    pub fn visible_pages(&self) -> Vec<&str> {
        if self.mode == ViewMode::Overview {
            return self.ordered_pages();
        }
        (self.index..self.index + self.mode.step())
            .filter_map(|i| self.page(i))
            .collect()
    }

    fn last_index(&self) -> usize {
        self.pages.len().saturating_sub(1)
    }

    pub fn next(&mut self) {
        self.index = (self.index + self.mode.step()).min(self.last_index());
    }

    pub fn previous(&mut self) {
        self.index = self.index.saturating_sub(self.mode.step());
    }

    pub fn first(&mut self) {
        self.index = 0;
    }

    pub fn last(&mut self) {
        self.index = self.last_index();
    }

    pub fn go_to(&mut self, index: usize) {
        self.index = index.min(self.last_index());
    }

    /// Jump to a page picked from the overview and read it in single view.
    pub fn open_page(&mut self, index: usize) {
        self.go_to(index);
        self.mode = ViewMode::Single;
    }

    /// Flip the reading order and restart from the first page.
    pub fn toggle_order(&mut self) {
        self.order = match self.order {
            ReadingOrder::Ascending => ReadingOrder::Descending,
            ReadingOrder::Descending => ReadingOrder::Ascending,
        };
        self.index = 0;
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.mode = mode;
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom + ZOOM_STEP).min(MAX_ZOOM);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom - ZOOM_STEP).max(MIN_ZOOM);
    }

    pub fn reset_zoom(&mut self) {
        self.zoom = 1.0;
    }

    /// One-based position and total.
    pub fn position(&self) -> (usize, usize) {
        (self.index + 1, self.pages.len())
    }

    /// Reading progress in `[0, 1]`; 0 for an empty comic.
    pub fn progress(&self) -> f32 {
        if self.pages.is_empty() {
            0.0
        } else {
            (self.index + 1) as f32 / self.pages.len() as f32
        }
    }
}
