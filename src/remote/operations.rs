//! High-level remote operations combining the listing parser with a
//! [`ContentApi`] backend.
//!
//! A folder listing is one call; each image then costs one commit lookup.
//! The lookups are fired together and awaited together. Only the listing
//! can fail the operation: a failed or empty lookup leaves that entry at
//! epoch zero so it sorts last under "newest".

use super::backend::{ContentApi, FetchError};
use super::listing::image_entries;
use crate::types::{CollectionCache, ImageEntry, epoch};
use chrono::{DateTime, Utc};
use futures::future::join_all;

/// List the images of `folder` with their latest commit dates.
pub async fn list_directory(
    api: &dyn ContentApi,
    folder: &str,
) -> Result<Vec<ImageEntry>, FetchError> {
    let listing = api.list(folder).await?;
    let entries = image_entries(listing, &api.raw_url(""));

    let lookups = entries.iter().map(|entry| commit_or_epoch(api, &entry.path));
    let timestamps = join_all(lookups).await;

    let entries: Vec<ImageEntry> = entries
        .into_iter()
        .zip(timestamps)
        .map(|(entry, at)| entry.with_timestamp(at))
        .collect();

    let dated = entries.iter().filter(|e| e.has_known_timestamp()).count();
    tracing::info!(
        folder,
        images = entries.len(),
        dated,
        "fetched folder listing"
    );
    Ok(entries)
}

/// Fetch a full snapshot of `folder`, stamped with `now`.
pub async fn fetch_collection(
    api: &dyn ContentApi,
    folder: &str,
    now: DateTime<Utc>,
) -> Result<CollectionCache, FetchError> {
    let items = list_directory(api, folder).await?;
    Ok(CollectionCache::new(items, now))
}

async fn commit_or_epoch(api: &dyn ContentApi, path: &str) -> DateTime<Utc> {
    match api.latest_commit(path).await {
        Ok(Some(at)) => at,
        Ok(None) => {
            tracing::warn!(path, "no commit history, using epoch");
            epoch()
        }
        Err(e) => {
            tracing::warn!(path, error = %e, "commit lookup failed, using epoch");
            epoch()
        }
    }
}
