//! Shared test utilities for the juju-gallery test suite.
//!
//! Builders for entries and listings that all live in a folder named `F`,
//! so remote, cache and gallery tests agree on paths and ids.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let api = MockApi::new().with_listing("F", listing_of(&["a.png", "b.jpg"]));
//! let expected = image("a.png");
//! assert_eq!(expected.content_id, "sha-a.png");
//! ```

use chrono::{DateTime, TimeZone, Utc};

use crate::remote::RemoteEntry;
use crate::types::ImageEntry;

// =========================================================================
// Entries
// =========================================================================

/// Download URL the builders give to `name`.
pub fn url_of(name: &str) -> String {
    format!("https://raw.test/F/{name}")
}

/// An entry in folder `F` with an unknown commit date.
pub fn image(name: &str) -> ImageEntry {
    ImageEntry::new(name, format!("F/{name}"), format!("sha-{name}"), url_of(name))
}

/// An entry in folder `F` committed at `at`.
pub fn image_at(name: &str, at: DateTime<Utc>) -> ImageEntry {
    image(name).with_timestamp(at)
}

/// Midnight UTC on day `day` of January 2024.
pub fn jan(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap()
}

/// `count` entries named `img-000.png`, `img-001.png`, ..., dated one day
/// apart so that `img-000` is the oldest.
pub fn numbered_images(count: usize) -> Vec<ImageEntry> {
    (0..count)
        .map(|i| {
            let at = jan(1) + chrono::Duration::days(i as i64);
            image_at(&format!("img-{i:03}.png"), at)
        })
        .collect()
}

// =========================================================================
// Listings
// =========================================================================

/// A contents listing of folder `F` containing the given file names.
pub fn listing_of(names: &[&str]) -> Vec<RemoteEntry> {
    names
        .iter()
        .map(|name| {
            RemoteEntry::file(
                name,
                &format!("F/{name}"),
                &format!("sha-{name}"),
                Some(&url_of(name)),
            )
        })
        .collect()
}

// =========================================================================
// Assertions
// =========================================================================

/// Names of the given entries, in order.
pub fn names(entries: &[ImageEntry]) -> Vec<&str> {
    entries.iter().map(|e| e.name.as_str()).collect()
}
