//! Content host trait and shared types.
//!
//! The [`ContentApi`] trait defines the three operations the pipeline needs
//! from a content host: list a folder, look up the latest commit touching a
//! path, and fetch a small text file. The production implementation is
//! [`GithubApi`](super::github::GithubApi); tests use the recording
//! `MockApi` below.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Why a remote call failed, without the details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    RateLimited,
    MalformedResponse,
    Network,
    NotFound,
    UnexpectedStatus,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    /// 403 or 429 from the host. `reset_at` comes from `x-ratelimit-reset`.
    #[error("rate limited by content host")]
    RateLimited { reset_at: Option<DateTime<Utc>> },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("unexpected status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },
}

impl FetchError {
    pub fn kind(&self) -> FailureKind {
        match self {
            FetchError::RateLimited { .. } => FailureKind::RateLimited,
            FetchError::MalformedResponse(_) => FailureKind::MalformedResponse,
            FetchError::Network(_) => FailureKind::Network,
            FetchError::NotFound(_) => FailureKind::NotFound,
            FetchError::UnexpectedStatus { .. } => FailureKind::UnexpectedStatus,
        }
    }

    /// Human-readable text for the gallery's error state.
    pub fn user_message(&self) -> String {
        match self {
            FetchError::RateLimited { reset_at } => {
                let when = match reset_at {
                    Some(at) => format!(" The quota resets at {} UTC.", at.format("%H:%M")),
                    None => String::new(),
                };
                format!(
                    "The content host's request limit was reached (anonymous clients get \
                     60 requests per hour). Please try again later.{when}"
                )
            }
            FetchError::MalformedResponse(_) => {
                "The content host returned data in an unexpected format.".to_string()
            }
            FetchError::Network(_) => {
                "Could not reach the content host. Check your connection and retry.".to_string()
            }
            FetchError::NotFound(_) => "The gallery folder could not be found.".to_string(),
            FetchError::UnexpectedStatus { status, .. } => {
                format!("The content host answered with an error (HTTP {status}).")
            }
        }
    }
}

/// Listing entry type as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    Other,
}

/// One raw entry of a folder listing, before image filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteEntry {
    pub name: String,
    pub path: String,
    pub sha: String,
    pub kind: EntryKind,
    /// Absent for directories and occasionally for large files.
    pub download_url: Option<String>,
}

impl RemoteEntry {
    pub fn file(name: &str, path: &str, sha: &str, download_url: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
            sha: sha.to_string(),
            kind: EntryKind::File,
            download_url: download_url.map(str::to_string),
        }
    }

    pub fn dir(name: &str, path: &str) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
            sha: String::new(),
            kind: EntryKind::Dir,
            download_url: None,
        }
    }
}

/// Trait for content hosts.
#[async_trait]
pub trait ContentApi: Send + Sync {
    /// List the direct children of a folder.
    async fn list(&self, path: &str) -> Result<Vec<RemoteEntry>, FetchError>;

    /// Timestamp of the most recent commit touching `path`.
    ///
    /// `Ok(None)` when the host knows the path but has no history for it.
    async fn latest_commit(&self, path: &str) -> Result<Option<DateTime<Utc>>, FetchError>;

    /// Fetch a small text file by absolute URL.
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError>;

    /// Raw-content URL for a repository path.
    fn raw_url(&self, path: &str) -> String;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;
    use std::time::Duration;

    pub const MOCK_RAW_ROOT: &str = "https://raw.test/org/repo/main";

    /// Mock host that serves canned responses and records every call.
    /// Uses Mutex so it is Sync and can sit behind the async trait.
    #[derive(Default)]
    pub struct MockApi {
        pub listings: Mutex<HashMap<String, Result<Vec<RemoteEntry>, FetchError>>>,
        pub commits: Mutex<HashMap<String, Result<Option<DateTime<Utc>>, FetchError>>>,
        pub texts: Mutex<HashMap<String, Result<String, FetchError>>>,
        /// One-shot listings served before `listings`, each after its delay.
        pub queued_listings: Mutex<VecDeque<(Duration, Result<Vec<RemoteEntry>, FetchError>)>>,
        pub commit_delay: Mutex<Option<Duration>>,
        pub calls: Mutex<Vec<RecordedCall>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedCall {
        List(String),
        LatestCommit(String),
        FetchText(String),
    }

    impl MockApi {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_listing(self, path: &str, entries: Vec<RemoteEntry>) -> Self {
            self.listings
                .lock()
                .unwrap()
                .insert(path.to_string(), Ok(entries));
            self
        }

        pub fn with_listing_error(self, path: &str, err: FetchError) -> Self {
            self.listings
                .lock()
                .unwrap()
                .insert(path.to_string(), Err(err));
            self
        }

        pub fn with_commit(self, path: &str, at: DateTime<Utc>) -> Self {
            self.commits
                .lock()
                .unwrap()
                .insert(path.to_string(), Ok(Some(at)));
            self
        }

        pub fn with_commit_error(self, path: &str, err: FetchError) -> Self {
            self.commits
                .lock()
                .unwrap()
                .insert(path.to_string(), Err(err));
            self
        }

        pub fn with_text(self, url: &str, body: &str) -> Self {
            self.texts
                .lock()
                .unwrap()
                .insert(url.to_string(), Ok(body.to_string()));
            self
        }

        /// Queue a listing answered after `delay_ms`, ahead of the canned ones.
        /// Queued listings are handed out in call order.
        pub fn with_delayed_listing(
            self,
            delay_ms: u64,
            result: Result<Vec<RemoteEntry>, FetchError>,
        ) -> Self {
            self.queued_listings
                .lock()
                .unwrap()
                .push_back((Duration::from_millis(delay_ms), result));
            self
        }

        /// Delay every commit lookup by `delay_ms`.
        pub fn with_commit_delay(self, delay_ms: u64) -> Self {
            *self.commit_delay.lock().unwrap() = Some(Duration::from_millis(delay_ms));
            self
        }

        /// Replace a listing after construction (e.g. between two loads).
        pub fn set_listing(&self, path: &str, result: Result<Vec<RemoteEntry>, FetchError>) {
            self.listings
                .lock()
                .unwrap()
                .insert(path.to_string(), result);
        }

        pub fn get_calls(&self) -> Vec<RecordedCall> {
            self.calls.lock().unwrap().clone()
        }

        pub fn list_calls(&self) -> usize {
            self.get_calls()
                .iter()
                .filter(|c| matches!(c, RecordedCall::List(_)))
                .count()
        }
    }

    #[async_trait]
    impl ContentApi for MockApi {
        async fn list(&self, path: &str) -> Result<Vec<RemoteEntry>, FetchError> {
            self.calls
                .lock()
                .unwrap()
                .push(RecordedCall::List(path.to_string()));
            let queued = self.queued_listings.lock().unwrap().pop_front();
            if let Some((delay, result)) = queued {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                return result;
            }
            self.listings
                .lock()
                .unwrap()
                .get(path)
                .cloned()
                .unwrap_or_else(|| Err(FetchError::NotFound(path.to_string())))
        }

        async fn latest_commit(&self, path: &str) -> Result<Option<DateTime<Utc>>, FetchError> {
            self.calls
                .lock()
                .unwrap()
                .push(RecordedCall::LatestCommit(path.to_string()));
            let delay = *self.commit_delay.lock().unwrap();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            self.commits
                .lock()
                .unwrap()
                .get(path)
                .cloned()
                .unwrap_or(Ok(None))
        }

        async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
            self.calls
                .lock()
                .unwrap()
                .push(RecordedCall::FetchText(url.to_string()));
            self.texts
                .lock()
                .unwrap()
                .get(url)
                .cloned()
                .unwrap_or_else(|| Err(FetchError::NotFound(url.to_string())))
        }

        fn raw_url(&self, path: &str) -> String {
            format!("{MOCK_RAW_ROOT}/{path}")
        }
    }

    #[tokio::test]
    async fn mock_records_calls() {
        let api = MockApi::new().with_listing("F", vec![RemoteEntry::dir("a", "F/a")]);
        let entries = api.list("F").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(api.latest_commit("F/a").await.unwrap(), None);

        assert_eq!(
            api.get_calls(),
            vec![
                RecordedCall::List("F".to_string()),
                RecordedCall::LatestCommit("F/a".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn mock_serves_queued_listings_first() {
        let api = MockApi::new()
            .with_listing("F", vec![])
            .with_delayed_listing(5, Ok(vec![RemoteEntry::dir("a", "F/a")]));
        assert_eq!(api.list("F").await.unwrap().len(), 1);
        assert!(api.list("F").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn mock_unknown_listing_is_not_found() {
        let api = MockApi::new();
        let err = api.list("missing").await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::NotFound);
    }

    #[test]
    fn kinds_match_variants() {
        assert_eq!(
            FetchError::RateLimited { reset_at: None }.kind(),
            FailureKind::RateLimited
        );
        assert_eq!(
            FetchError::MalformedResponse("x".into()).kind(),
            FailureKind::MalformedResponse
        );
        assert_eq!(FetchError::Network("x".into()).kind(), FailureKind::Network);
        assert_eq!(
            FetchError::UnexpectedStatus {
                status: 500,
                url: "u".into()
            }
            .kind(),
            FailureKind::UnexpectedStatus
        );
    }

    #[test]
    fn rate_limit_message_explains_quota() {
        let msg = FetchError::RateLimited { reset_at: None }.user_message();
        assert!(msg.contains("request limit"));
        assert!(msg.contains("try again later"));
    }

    #[test]
    fn rate_limit_message_includes_reset_time() {
        let reset_at = DateTime::from_timestamp(1_700_000_000, 0);
        let msg = FetchError::RateLimited { reset_at }.user_message();
        assert!(msg.contains("22:13 UTC"), "{msg}");
    }

    #[test]
    fn messages_differ_by_kind() {
        let network = FetchError::Network("x".into()).user_message();
        let malformed = FetchError::MalformedResponse("x".into()).user_message();
        assert_ne!(network, malformed);
    }
}
