//! # Juju Gallery
//!
//! The content pipeline behind La Grotte de Juju's fan-art gallery and comic
//! library. Images live in a public GitHub repository; this crate lists
//! them, remembers the listing for a while, and lays them out as a dense
//! "bento" grid of mixed tile sizes.
//!
//! # Architecture: Fetch → Cache → Control → Pack
//!
//! ```text
//! 1. Remote    contents + commits API  →  Vec<ImageEntry>     (N+1 fan-out)
//! 2. Cache     CollectionCache snapshot, 30-minute TTL          (key/value slots)
//! 3. Gallery   sort, search, paginate, load-all gate            (pure state machine)
//! 4. Layout    first-fit bento packing with weighted sizes      (seedable RNG)
//! ```
//!
//! Each stage is testable on its own: the remote client sits behind the
//! [`remote::ContentApi`] trait, the cache behind [`cache::CacheStorage`],
//! and the controller and packer are synchronous functions of their inputs
//! plus an injected random source.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`remote`] | GitHub contents/commits client, failure taxonomy, concurrent commit lookups |
//! | [`cache`] | Versioned key/value snapshot store with TTL and the cache-first fetch policy |
//! | [`layout`] | Virtual grid and first-fit bento packer |
//! | [`gallery`] | Gallery state machine: ordering, search, pagination, out-of-order load safety |
//! | [`viewer`] | Lightbox and comic reader navigation |
//! | [`comics`] | Comic folder summaries, page ordering, placeholder library |
//! | [`server`] | `axum` proxy exposing the comic folders as JSON |
//! | [`render`] | Standalone HTML bento page using Maud |
//! | [`config`] | `config.toml` loading, merging and validation |
//! | [`types`] | Shared types (`ImageEntry`, `SizeClass`, `CollectionCache`) |
//! | [`naming`] | Image-extension filter and page-number parsing |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Content Id Over Path
//!
//! Entries are identified by the host's content hash, not their path. An
//! artist replacing `dragon.png` with a new drawing keeps the path but gets a
//! new id, so list diffing and the lightbox never confuse the two.
//!
//! ## Fail Loud on Listing Errors
//!
//! When the folder listing fails, the cached snapshot for that folder is
//! deleted and the error is shown with a retry action. A transient blip
//! costs one refetch; in exchange the gallery never keeps serving a
//! snapshot it could not confirm. Individual commit-date lookups, on the
//! other hand, never fail a load: the entry just sorts as oldest.
//!
//! ## Randomized Layout, Injected Randomness
//!
//! The bento arrangement is deliberately different on every load. The
//! packer takes the random source as a parameter, so production seeds from
//! the OS and tests use fixed seeds to check the no-gap and no-overlap
//! invariants over hundreds of layouts.

pub mod cache;
pub mod comics;
pub mod config;
pub mod gallery;
pub mod layout;
pub mod naming;
pub mod output;
pub mod remote;
pub mod render;
pub mod server;
pub mod types;
pub mod viewer;

#[cfg(test)]
pub(crate) mod test_helpers;
