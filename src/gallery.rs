//! Gallery controller: the state machine behind the fan-art grid.
//!
//! [`GalleryState`] owns everything the grid shows: the fetched collection,
//! the view state (sort, search, pagination cursor), the current layout and
//! the load status. Every transition is a plain synchronous method, so the
//! whole machine is testable without a network or a renderer.
//!
//! ## Ordering pipeline
//!
//! ```text
//! collection ─sort─▶ sorted ─filter─▶ ordered (+layout) ─slice─▶ displayed
//! ```
//!
//! The packer runs over the whole filtered ordering whenever sort, search or
//! data change. Pagination only moves the cut point: a prefix of a first-fit
//! packing is gap-free, so "load more" extends the grid without reshuffling
//! tiles already on screen. In search mode the cut is ignored and every match
//! is shown.
//!
//! ## Loads
//!
//! Loads are split into [`GalleryState::begin_load`] and
//! [`GalleryState::finish_load`] so that a slow response can never overwrite
//! a newer one: each load gets a [`LoadTicket`], and only the latest ticket's
//! result is applied. After [`GalleryState::close`] every result is dropped.
//! [`Gallery`] wires the two halves around a [`CachedSource`] for the common
//! sequential case.

use crate::cache::CachedSource;
use crate::config::SiteConfig;
use crate::layout::{GridCell, Placement, assign_sizes};
use crate::remote::{FailureKind, FetchError};
use crate::types::{CollectionCache, ImageEntry, SortOrder};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GalleryError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("gallery view is closed")]
    Closed,
}

/// User-controlled view settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryViewState {
    pub sort_order: SortOrder,
    /// Raw query as typed; matching uses the trimmed form.
    pub search_query: String,
    /// Pagination cursor, ignored in search mode.
    pub visible_count: usize,
}

impl GalleryViewState {
    pub fn is_search_mode(&self) -> bool {
        !self.search_query.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    Idle,
    Loading { refreshing: bool },
    Ready,
    Failed { kind: FailureKind, message: String },
}

/// Identity of one load request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    token: u64,
    pub force: bool,
}

/// What happened to a finished load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    /// A newer load was started in the meantime.
    Superseded,
    /// The view was closed.
    Discarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadAllOutcome {
    Applied,
    /// More than one page remains; call `confirm_load_all` to proceed.
    ConfirmationRequired { remaining: usize },
}

/// Why the grid is empty, when it is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmptyState {
    /// The collection has items but none match the query.
    NoMatches { query: String },
    /// The folder has no images at all.
    EmptyCollection,
}

/// One render-ready grid tile.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub entry: ImageEntry,
    pub placement: Placement,
}

impl Tile {
    pub fn cell(&self) -> Option<GridCell> {
        self.placement.cell
    }
}

/// Snapshot of everything needed to draw the gallery.
#[derive(Debug, Clone, PartialEq)]
pub struct GalleryView {
    pub tiles: Vec<Tile>,
    /// Tiles shown.
    pub shown: usize,
    /// Entries matching the current query (all entries when not searching).
    pub matching: usize,
    /// Entries in the collection.
    pub total: usize,
    pub has_more: bool,
    pub search_mode: bool,
    pub query: String,
    pub sort_order: SortOrder,
    pub last_updated: Option<DateTime<Utc>>,
    pub status: LoadStatus,
    pub empty: Option<EmptyState>,
}

impl GalleryView {
    /// "Last updated" label from the newest commit, if any date is known.
    pub fn last_updated_label(&self) -> Option<String> {
        self.last_updated
            .map(|at| format!("Last updated {}", at.format("%Y-%m-%d")))
    }
}

pub struct GalleryState {
    page_size: usize,
    columns: usize,
    view: GalleryViewState,
    collection: Option<CollectionCache>,
    /// Filtered and sorted entries with layout fields set.
    ordered: Vec<ImageEntry>,
    layout: Vec<Placement>,
    status: LoadStatus,
    rng: StdRng,
    latest_token: u64,
    open: bool,
    pending_load_all: bool,
}

impl GalleryState {
    pub fn new(page_size: usize, columns: usize, rng: StdRng) -> Self {
        Self {
            page_size,
            columns,
            view: GalleryViewState {
                sort_order: SortOrder::default(),
                search_query: String::new(),
                visible_count: page_size,
            },
            collection: None,
            ordered: Vec::new(),
            layout: Vec::new(),
            status: LoadStatus::Idle,
            rng,
            latest_token: 0,
            open: true,
            pending_load_all: false,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn view_state(&self) -> &GalleryViewState {
        &self.view
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn collection(&self) -> Option<&CollectionCache> {
        self.collection.as_ref()
    }

    /// Entries in the collection.
    pub fn total(&self) -> usize {
        self.collection.as_ref().map_or(0, |c| c.items.len())
    }

    /// Entries passing the current search filter.
    pub fn matching(&self) -> usize {
        self.ordered.len()
    }

    fn shown(&self) -> usize {
        if self.view.is_search_mode() {
            self.ordered.len()
        } else {
            self.view.visible_count.min(self.ordered.len())
        }
    }

    /// Entries currently on screen, in display order.
    pub fn displayed(&self) -> &[ImageEntry] {
        &self.ordered[..self.shown()]
    }

    pub fn has_more(&self) -> bool {
        !self.view.is_search_mode() && self.view.visible_count < self.total()
    }

    pub fn load_all_pending(&self) -> bool {
        self.pending_load_all
    }

    /// A spinner is shown only while loading with nothing to display.
    pub fn shows_loading_indicator(&self) -> bool {
        matches!(self.status, LoadStatus::Loading { .. }) && self.collection.is_none()
    }

    pub fn retry_available(&self) -> bool {
        matches!(self.status, LoadStatus::Failed { .. })
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    // =========================================================================
    // View transitions
    // =========================================================================

    pub fn set_search_query(&mut self, query: &str) {
        self.pending_load_all = false;
        let was_searching = self.view.is_search_mode();
        self.view.search_query = query.to_string();
        if was_searching && !self.view.is_search_mode() {
            self.view.visible_count = self.page_size;
        }
        self.rebuild();
    }

    pub fn set_sort_order(&mut self, order: SortOrder) {
        self.pending_load_all = false;
        self.view.sort_order = order;
        if !self.view.is_search_mode() {
            self.view.visible_count = self.page_size;
        }
        self.rebuild();
    }

    /// Reveal one more page. Returns whether anything changed.
    pub fn load_more(&mut self) -> bool {
        self.pending_load_all = false;
        if !self.has_more() {
            return false;
        }
        self.view.visible_count = (self.view.visible_count + self.page_size).min(self.total());
        true
    }

    /// Ask to reveal everything. Needs confirmation when more than one page
    /// remains.
    pub fn request_load_all(&mut self) -> LoadAllOutcome {
        let remaining = self.total().saturating_sub(self.view.visible_count);
        if remaining > self.page_size {
            self.pending_load_all = true;
            return LoadAllOutcome::ConfirmationRequired { remaining };
        }
        self.pending_load_all = false;
        self.view.visible_count = self.view.visible_count.max(self.total());
        LoadAllOutcome::Applied
    }

    /// Apply a pending load-all. Returns false when none was pending.
    pub fn confirm_load_all(&mut self) -> bool {
        if !self.pending_load_all {
            return false;
        }
        self.pending_load_all = false;
        self.view.visible_count = self.view.visible_count.max(self.total());
        true
    }

    pub fn cancel_load_all(&mut self) {
        self.pending_load_all = false;
    }

    // =========================================================================
    // Load lifecycle
    // =========================================================================

    pub fn begin_load(&mut self, force: bool) -> LoadTicket {
        self.pending_load_all = false;
        self.latest_token += 1;
        self.status = LoadStatus::Loading {
            refreshing: self.collection.is_some(),
        };
        LoadTicket {
            token: self.latest_token,
            force,
        }
    }

    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<CollectionCache, FetchError>,
    ) -> LoadOutcome {
        if !self.open {
            tracing::debug!(token = ticket.token, "view closed, dropping load result");
            return LoadOutcome::Discarded;
        }
        if ticket.token != self.latest_token {
            tracing::debug!(
                token = ticket.token,
                latest = self.latest_token,
                "superseded load result dropped"
            );
            return LoadOutcome::Superseded;
        }

        match result {
            Ok(collection) => {
                self.collection = Some(collection);
                self.status = LoadStatus::Ready;
            }
            Err(e) => {
                self.collection = None;
                self.status = LoadStatus::Failed {
                    kind: e.kind(),
                    message: e.user_message(),
                };
            }
        }
        self.rebuild();
        LoadOutcome::Applied
    }

    /// The view went away; later results are discarded.
    pub fn close(&mut self) {
        self.open = false;
    }

    // =========================================================================
    // Derivation
    // =========================================================================

    /// Recompute the filtered ordering and its layout.
    fn rebuild(&mut self) {
        let items = self.collection.as_ref().map_or(&[][..], |c| &c.items[..]);
        let mut ordered: Vec<ImageEntry> = filter_entries(items, &self.view.search_query)
            .into_iter()
            .cloned()
            .collect();
        sort_entries(&mut ordered, self.view.sort_order);
        self.layout = assign_sizes(&mut ordered, self.columns, &mut self.rng);
        self.ordered = ordered;
    }

    pub fn view(&self) -> GalleryView {
        let shown = self.shown();
        let tiles = self.ordered[..shown]
            .iter()
            .zip(&self.layout)
            .map(|(entry, placement)| Tile {
                entry: entry.clone(),
                placement: *placement,
            })
            .collect();

        let search_mode = self.view.is_search_mode();
        let empty = match self.collection {
            Some(_) if self.total() == 0 => Some(EmptyState::EmptyCollection),
            Some(_) if self.ordered.is_empty() => Some(EmptyState::NoMatches {
                query: self.view.search_query.trim().to_string(),
            }),
            _ => None,
        };

        GalleryView {
            tiles,
            shown,
            matching: self.matching(),
            total: self.total(),
            has_more: self.has_more(),
            search_mode,
            query: self.view.search_query.trim().to_string(),
            sort_order: self.view.sort_order,
            last_updated: self.collection.as_ref().and_then(|c| c.latest_commit_at),
            status: self.status.clone(),
            empty,
        }
    }
}

/// Sort in place. Stable, so equal keys keep their fetched order.
pub fn sort_entries(entries: &mut [ImageEntry], order: SortOrder) {
    match order {
        SortOrder::Newest => entries.sort_by(|a, b| b.commit_timestamp.cmp(&a.commit_timestamp)),
        SortOrder::Oldest => entries.sort_by(|a, b| a.commit_timestamp.cmp(&b.commit_timestamp)),
        SortOrder::Alphabetical => entries.sort_by(|a, b| a.name.cmp(&b.name)),
    }
}

/// Case-insensitive substring match on the name; a blank query keeps all.
pub fn filter_entries<'a>(entries: &'a [ImageEntry], query: &str) -> Vec<&'a ImageEntry> {
    let needle = query.trim().to_lowercase();
    entries
        .iter()
        .filter(|e| needle.is_empty() || e.name.to_lowercase().contains(&needle))
        .collect()
}

/// Controller wired to a cache-backed source.
pub struct Gallery {
    state: GalleryState,
    source: CachedSource,
    namespace: String,
    folder: String,
}

impl Gallery {
    pub fn new(config: &SiteConfig, source: CachedSource, rng: StdRng) -> Self {
        Self {
            state: GalleryState::new(config.gallery.page_size, config.gallery.columns, rng),
            source,
            namespace: config.gallery_cache_key(),
            folder: config.gallery.folder.clone(),
        }
    }

    pub fn state(&self) -> &GalleryState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut GalleryState {
        &mut self.state
    }

    pub fn source(&self) -> &CachedSource {
        &self.source
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub async fn load(&mut self, force: bool) -> Result<LoadOutcome, GalleryError> {
        self.load_at(force, Utc::now()).await
    }

    /// Forced reload: bypass the cache and re-pack.
    pub async fn refresh(&mut self) -> Result<LoadOutcome, GalleryError> {
        self.load(true).await
    }

    /// Load as of `now`. A failed fetch is both recorded in the state and
    /// returned.
    pub async fn load_at(
        &mut self,
        force: bool,
        now: DateTime<Utc>,
    ) -> Result<LoadOutcome, GalleryError> {
        if !self.state.is_open() {
            return Err(GalleryError::Closed);
        }
        let ticket = self.state.begin_load(force);
        let result = self
            .source
            .fetch(&self.namespace, &self.folder, force, now)
            .await
            .map(|(collection, _)| collection);
        let failure = result.as_ref().err().cloned();

        let outcome = self.state.finish_load(ticket, result);
        match failure {
            Some(e) if outcome == LoadOutcome::Applied => Err(e.into()),
            _ => Ok(outcome),
        }
    }
}
