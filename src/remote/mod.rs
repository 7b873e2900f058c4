//! Remote content client.
//!
//! | Operation | Host call |
//! |---|---|
//! | **List folder** | `GET /repos/{owner}/{repo}/contents/{path}` |
//! | **Latest commit** | `GET /repos/{owner}/{repo}/commits?path=..&per_page=1` |
//! | **Text file** | `GET {download_url}` |
//!
//! The module is split into:
//! - **Listing**: Pure parsing of host responses (unit testable)
//! - **Backend**: [`ContentApi`] trait + failure taxonomy
//! - **GitHub**: [`GithubApi`], the reqwest implementation
//! - **Operations**: High-level functions combining listing + backend

pub mod backend;
pub mod github;
pub mod listing;
pub mod operations;

pub use backend::{ContentApi, EntryKind, FailureKind, FetchError, RemoteEntry};
pub use github::GithubApi;
pub use operations::{fetch_collection, list_directory};
