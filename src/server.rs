//! Comic-folder proxy server.
//!
//! Thin HTTP wrappers over [`crate::comics`]:
//!
//! | Route | Response |
//! |---|---|
//! | `GET /api/bd-folders` | Every comic summary (placeholders when the host fails) |
//! | `POST /api/bd-folders` | `{ "folderName": "..." }` → `{ name, pages }` |
//! | `GET /health` | `ok` |

use crate::comics::{comics_or_fallback, folder_pages};
use crate::remote::{ContentApi, FetchError};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("upstream error: {0}")]
    Upstream(#[from] FetchError),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match self {
            ServerError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, serde_json::json!({ "error": msg }))
            }
            ServerError::Upstream(e) => {
                tracing::error!(error = %e, "comic fetch failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({
                        "error": "Failed to fetch comic",
                        "details": e.to_string(),
                    }),
                )
            }
            ServerError::Io(e) => {
                tracing::error!(error = %e, "server IO error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({ "error": "An internal error occurred" }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub api: Arc<dyn ContentApi>,
    /// Repository folder whose sub-folders are comics.
    pub comics_root: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FolderRequest {
    #[serde(default)]
    folder_name: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/bd-folders", get(list_folders).post(one_folder))
        .route("/health", get(health))
        .with_state(state)
}

async fn list_folders(State(state): State<AppState>) -> impl IntoResponse {
    Json(comics_or_fallback(state.api.as_ref(), &state.comics_root).await)
}

async fn one_folder(
    State(state): State<AppState>,
    Json(request): Json<FolderRequest>,
) -> Result<impl IntoResponse, ServerError> {
    let name = request
        .folder_name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ServerError::BadRequest("folderName is required".to_string()))?;

    let pages = folder_pages(state.api.as_ref(), &state.comics_root, &name).await?;
    Ok(Json(pages))
}

async fn health() -> &'static str {
    "ok"
}

/// Serve until Ctrl+C.
pub async fn serve(bind: &str, state: AppState) -> Result<(), ServerError> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!(addr = %listener.local_addr()?, "serving comic folders");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
