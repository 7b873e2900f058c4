//! Pure response parsing and listing normalization.
//!
//! Nothing here touches the network, so every shape the host can send is
//! unit-testable from a string.

use super::backend::{EntryKind, FetchError, RemoteEntry};
use crate::naming::is_image_name;
use crate::types::ImageEntry;
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Deserialize)]
struct ContentsItem {
    name: String,
    path: String,
    #[serde(default)]
    sha: String,
    #[serde(rename = "type")]
    kind: String,
    download_url: Option<String>,
}

#[derive(Deserialize)]
struct CommitItem {
    commit: CommitDetail,
}

#[derive(Deserialize)]
struct CommitDetail {
    committer: Option<Signature>,
    author: Option<Signature>,
}

#[derive(Deserialize)]
struct Signature {
    date: DateTime<Utc>,
}

/// Parse a contents-API body into raw entries.
///
/// A folder listing is a JSON array. Anything else (a single-file object,
/// an error document) is malformed for our purposes.
pub fn parse_contents(body: &str) -> Result<Vec<RemoteEntry>, FetchError> {
    let items: Vec<ContentsItem> = serde_json::from_str(body)
        .map_err(|e| FetchError::MalformedResponse(format!("contents listing: {e}")))?;

    Ok(items
        .into_iter()
        .map(|item| RemoteEntry {
            kind: match item.kind.as_str() {
                "file" => EntryKind::File,
                "dir" => EntryKind::Dir,
                _ => EntryKind::Other,
            },
            name: item.name,
            path: item.path,
            sha: item.sha,
            download_url: item.download_url,
        })
        .collect())
}

/// Parse a commits-API body (newest first) into the latest commit date.
///
/// An empty array means the path has no history: `Ok(None)`.
pub fn parse_latest_commit(body: &str) -> Result<Option<DateTime<Utc>>, FetchError> {
    let commits: Vec<CommitItem> = serde_json::from_str(body)
        .map_err(|e| FetchError::MalformedResponse(format!("commit history: {e}")))?;

    Ok(commits.into_iter().next().and_then(|c| {
        c.commit
            .committer
            .or(c.commit.author)
            .map(|signature| signature.date)
    }))
}

/// Keep the image files of a listing and turn them into gallery entries.
///
/// `raw_root` (`{raw_base}/{owner}/{repo}/{branch}`) fills in a missing
/// download URL. Timestamps are left at epoch zero; the caller attaches
/// commit dates.
pub fn image_entries(entries: Vec<RemoteEntry>, raw_root: &str) -> Vec<ImageEntry> {
    entries
        .into_iter()
        .filter(|entry| entry.kind == EntryKind::File && is_image_name(&entry.name))
        .map(|entry| {
            let download_url = entry
                .download_url
                .unwrap_or_else(|| format!("{}/{}", raw_root.trim_end_matches('/'), entry.path));
            ImageEntry::new(entry.name, entry.path, entry.sha, download_url)
        })
        .collect()
}

/// Sub-folders of a listing, in listing order.
pub fn directories(entries: &[RemoteEntry]) -> Vec<&RemoteEntry> {
    entries.iter().filter(|e| e.kind == EntryKind::Dir).collect()
}
