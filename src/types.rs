//! Shared types passed between the pipeline components.
//!
//! [`ImageEntry`] is produced by the remote client, persisted by the cache
//! (without its layout fields), ordered and filtered by the gallery
//! controller and finally decorated by the layout packer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One discoverable image in a remote folder.
///
/// `content_id` is the host's content hash for this version of the file and
/// is the only safe identity: a path can be overwritten with new content,
/// which keeps the path but changes the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageEntry {
    /// Display filename, extension included.
    pub name: String,
    /// Repository-relative path.
    pub path: String,
    pub content_id: String,
    pub download_url: String,
    /// Most recent commit touching `path`. Epoch zero when unknown.
    #[serde(default = "epoch")]
    pub commit_timestamp: DateTime<Utc>,
    /// Assigned by the layout packer; never persisted.
    #[serde(skip)]
    pub size_class: Option<SizeClass>,
    /// Display-only scale multiplier in `[1.0, 1.2)`; never persisted.
    #[serde(skip)]
    pub zoom_factor: Option<f32>,
}

impl ImageEntry {
    pub fn new(
        name: impl Into<String>,
        path: impl Into<String>,
        content_id: impl Into<String>,
        download_url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            content_id: content_id.into(),
            download_url: download_url.into(),
            commit_timestamp: epoch(),
            size_class: None,
            zoom_factor: None,
        }
    }

    /// Builder-style setter for the commit timestamp.
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.commit_timestamp = timestamp;
        self
    }

    /// Whether the commit lookup for this entry produced a real date.
    pub fn has_known_timestamp(&self) -> bool {
        self.commit_timestamp != epoch()
    }

    /// File name without its image extension, as shown under a tile.
    pub fn display_name(&self) -> &str {
        crate::naming::strip_image_extension(&self.name)
    }
}

/// The sentinel used for "no commit date": sorts as the oldest possible.
pub fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

/// Bento tile shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeClass {
    Small,
    Medium,
    Large,
    Tall,
    Wide,
}

impl SizeClass {
    /// Every class in the order used when nothing else is preferred.
    pub const ALL: [SizeClass; 5] = [
        SizeClass::Small,
        SizeClass::Medium,
        SizeClass::Large,
        SizeClass::Tall,
        SizeClass::Wide,
    ];

    /// Grid footprint as `(rows, cols)`.
    pub fn footprint(self) -> (usize, usize) {
        match self {
            SizeClass::Small => (1, 1),
            SizeClass::Medium => (1, 2),
            SizeClass::Large => (2, 2),
            SizeClass::Tall => (2, 2),
            SizeClass::Wide => (1, 3),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SizeClass::Small => "small",
            SizeClass::Medium => "medium",
            SizeClass::Large => "large",
            SizeClass::Tall => "tall",
            SizeClass::Wide => "wide",
        }
    }
}

impl fmt::Display for SizeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Gallery ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Most recent commit first.
    #[default]
    Newest,
    /// Oldest commit first; unknown dates lead.
    Oldest,
    /// Byte-wise ascending on the file name.
    Alphabetical,
}

/// Persisted snapshot of one folder listing.
///
/// Layout fields of the items are never stored; they are recomputed on
/// every load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionCache {
    pub items: Vec<ImageEntry>,
    pub fetched_at: DateTime<Utc>,
    /// Newest known commit across `items`, used for the "last updated" label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_commit_at: Option<DateTime<Utc>>,
}

impl CollectionCache {
    /// Build a snapshot, deriving `latest_commit_at` from the items.
    pub fn new(items: Vec<ImageEntry>, fetched_at: DateTime<Utc>) -> Self {
        let latest_commit_at = items
            .iter()
            .filter(|item| item.has_known_timestamp())
            .map(|item| item.commit_timestamp)
            .max();
        Self {
            items,
            fetched_at,
            latest_commit_at,
        }
    }
}
