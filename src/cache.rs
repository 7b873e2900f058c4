//! Local collection cache with a fixed time-to-live.
//!
//! A gallery load costs one listing request plus one commit lookup per
//! image, against an API that allows anonymous clients 60 requests an
//! hour. This module keeps the last successful snapshot of each folder so
//! that reopening the gallery within the TTL costs nothing.
//!
//! # Design
//!
//! Storage is a plain string key/value slot store ([`CacheStorage`]),
//! mirroring browser local storage: [`FileStorage`] for the CLI and server,
//! [`MemoryStorage`] for tests and embedding. Each collection occupies two
//! slots:
//!
//! - **`{namespace}:v{CACHE_VERSION}`**: the JSON-serialized
//!   [`CollectionCache`].
//! - **`{namespace}:v{CACHE_VERSION}:timestamp`**: the fetch time in
//!   milliseconds since the epoch, read for the freshness check without
//!   parsing the payload.
//!
//! Bumping [`CACHE_VERSION`] orphans old payloads instead of
//! mis-deserializing them.
//!
//! ## Freshness
//!
//! A hit requires both slots present, parseable, and
//! `now - timestamp < ttl`. Anything else is a miss: there is no
//! stale-while-revalidate. A corrupted payload is logged and treated
//! exactly like an absent one.
//!
//! ## Failure policy
//!
//! [`CachedSource::fetch`] invalidates the collection's slots whenever the
//! primary listing fails, so a snapshot the pipeline could not confirm is
//! never served again. Failures are surfaced loudly instead.
//!
//! Fetches of one namespace are numbered as they start. Only the most
//! recently started fetch may write or invalidate the slots: an older
//! request finishing late returns its result to the caller and leaves the
//! cache alone, so a slow forced refresh cannot replace or delete the
//! snapshot of a newer one.

use crate::remote::{ContentApi, FetchError, fetch_collection};
use crate::types::CollectionCache;
use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// Version of the payload format. Bump this to invalidate all existing
/// caches when [`CollectionCache`] changes shape.
pub const CACHE_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// String key/value slot store.
pub trait CacheStorage: Send + Sync {
    /// Read a slot. Unreadable slots are `None`.
    fn get(&self, key: &str) -> Option<String>;

    /// Overwrite a slot.
    fn set(&self, key: &str, value: &str) -> Result<(), CacheError>;

    /// Delete a slot. Removing an absent slot is not an error.
    fn remove(&self, key: &str) -> Result<(), CacheError>;
}

/// One file per slot inside a directory.
///
/// File names are the SHA-256 of the key, so any namespace string is a
/// safe file name.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn slot_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", hash_key(key)))
    }
}

impl CacheStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.slot_path(key)).ok()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.slot_path(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        match fs::remove_file(self.slot_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process slot store.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slots: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every write is a single map operation, so a panic elsewhere cannot
    /// leave the map half-updated and a poisoned lock is safe to reuse.
    fn slots(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CacheStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.slots().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        self.slots().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        self.slots().remove(key);
        Ok(())
    }
}

impl<T: CacheStorage + ?Sized> CacheStorage for Arc<T> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        (**self).remove(key)
    }
}

/// SHA-256 of a cache key, as a hex string.
pub fn hash_key(key: &str) -> String {
    format!("{:x}", Sha256::digest(key.as_bytes()))
}

/// Slot holding the JSON payload for `namespace`.
pub fn payload_key(namespace: &str) -> String {
    format!("{namespace}:v{CACHE_VERSION}")
}

/// Slot holding the fetch timestamp (ms) for `namespace`.
pub fn timestamp_key(namespace: &str) -> String {
    format!("{namespace}:v{CACHE_VERSION}:timestamp")
}

/// TTL-aware view over a [`CacheStorage`].
pub struct CacheStore {
    storage: Box<dyn CacheStorage>,
    ttl: Duration,
}

impl CacheStore {
    pub fn new(storage: impl CacheStorage + 'static, ttl: Duration) -> Self {
        Self {
            storage: Box::new(storage),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Whether a snapshot stamped `fetched_ms` is still fresh at `now`.
    pub fn is_fresh(&self, fetched_ms: i64, now: DateTime<Utc>) -> bool {
        now.timestamp_millis() - fetched_ms < self.ttl.num_milliseconds()
    }

    /// Return the snapshot for `namespace` if present and fresh at `now`.
    pub fn load(&self, namespace: &str, now: DateTime<Utc>) -> Option<CollectionCache> {
        let Some(raw_ts) = self.storage.get(&timestamp_key(namespace)) else {
            tracing::debug!(namespace, "cache miss: absent");
            return None;
        };
        let Ok(fetched_ms) = raw_ts.trim().parse::<i64>() else {
            tracing::debug!(namespace, "cache miss: unreadable timestamp");
            return None;
        };
        if !self.is_fresh(fetched_ms, now) {
            tracing::debug!(namespace, "cache miss: expired");
            return None;
        }
        let payload = self.storage.get(&payload_key(namespace))?;
        match serde_json::from_str::<CollectionCache>(&payload) {
            Ok(collection) => {
                tracing::debug!(namespace, items = collection.items.len(), "cache hit");
                Some(collection)
            }
            Err(e) => {
                tracing::debug!(namespace, error = %e, "cache miss: corrupt payload");
                None
            }
        }
    }

    /// Overwrite the snapshot for `namespace`.
    pub fn save(&self, namespace: &str, collection: &CollectionCache) -> Result<(), CacheError> {
        let json = serde_json::to_string(collection)?;
        self.storage.set(&payload_key(namespace), &json)?;
        self.storage.set(
            &timestamp_key(namespace),
            &collection.fetched_at.timestamp_millis().to_string(),
        )?;
        Ok(())
    }

    /// Delete both slots for `namespace`.
    pub fn invalidate(&self, namespace: &str) -> Result<(), CacheError> {
        self.storage.remove(&payload_key(namespace))?;
        self.storage.remove(&timestamp_key(namespace))?;
        Ok(())
    }
}

/// Where a fetched snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Cache,
    Remote,
}

/// Cache-first access to a remote folder.
pub struct CachedSource {
    api: Arc<dyn ContentApi>,
    store: CacheStore,
    /// Number of the latest fetch started per namespace.
    generations: Mutex<HashMap<String, u64>>,
}

impl CachedSource {
    pub fn new(api: Arc<dyn ContentApi>, store: CacheStore) -> Self {
        Self {
            api,
            store,
            generations: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    pub fn api(&self) -> &dyn ContentApi {
        self.api.as_ref()
    }

    fn generations(&self) -> MutexGuard<'_, HashMap<String, u64>> {
        self.generations.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a fetch of `namespace`, superseding every earlier one.
    fn begin(&self, namespace: &str) -> u64 {
        let mut generations = self.generations();
        let latest = generations.entry(namespace.to_string()).or_insert(0);
        *latest += 1;
        *latest
    }

    fn is_latest(&self, namespace: &str, generation: u64) -> bool {
        self.generations().get(namespace).copied() == Some(generation)
    }

    /// Return the snapshot for `folder` under cache key `namespace`.
    ///
    /// Fresh hit (unless `force`) → cached snapshot. Otherwise the remote
    /// is called; success overwrites the cache, failure invalidates it.
    /// Neither happens when another fetch of the same namespace started
    /// in the meantime. Cache write errors are logged and never fail the
    /// fetch.
    pub async fn fetch(
        &self,
        namespace: &str,
        folder: &str,
        force: bool,
        now: DateTime<Utc>,
    ) -> Result<(CollectionCache, Origin), FetchError> {
        let generation = self.begin(namespace);
        if !force && let Some(collection) = self.store.load(namespace, now) {
            return Ok((collection, Origin::Cache));
        }

        let result = fetch_collection(self.api.as_ref(), folder, now).await;
        if !self.is_latest(namespace, generation) {
            tracing::debug!(namespace, generation, "superseded fetch, cache left untouched");
            return result.map(|collection| (collection, Origin::Remote));
        }

        match result {
            Ok(collection) => {
                if let Err(e) = self.store.save(namespace, &collection) {
                    tracing::warn!(namespace, error = %e, "failed to write cache");
                }
                Ok((collection, Origin::Remote))
            }
            Err(e) => {
                tracing::error!(namespace, error = %e, "folder listing failed, dropping cache");
                if let Err(cache_err) = self.store.invalidate(namespace) {
                    tracing::warn!(namespace, error = %cache_err, "failed to invalidate cache");
                }
                Err(e)
            }
        }
    }
}
