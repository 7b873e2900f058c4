//! GitHub contents/commits API client.
//!
//! Requests go out with `Accept: application/vnd.github.v3+json` and the
//! configured `User-Agent`; GitHub rejects requests without one. Status
//! classification and body parsing are pure functions so the mapping is
//! tested without a server.

use super::backend::{ContentApi, FetchError, RemoteEntry};
use super::listing::{parse_contents, parse_latest_commit};
use crate::config::GithubConfig;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header;

const ACCEPT: &str = "application/vnd.github.v3+json";

pub struct GithubApi {
    client: reqwest::Client,
    config: GithubConfig,
}

impl GithubApi {
    pub fn new(config: GithubConfig) -> Result<Self, FetchError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static(ACCEPT));
        if let Some(token) = &config.token {
            let value = header::HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| FetchError::Network(format!("invalid token header: {e}")))?;
            headers.insert(header::AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(config.timeout())
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn repo_url(&self) -> String {
        format!(
            "{}/repos/{}/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.owner,
            self.config.repo
        )
    }

    pub fn contents_url(&self, path: &str) -> String {
        format!("{}/contents/{}", self.repo_url(), path.trim_matches('/'))
    }

    /// Send a request and return the body of a 2xx response.
    async fn body(&self, request: reqwest::RequestBuilder) -> Result<String, FetchError> {
        let resp = request.send().await.map_err(transport_error)?;
        let url = resp.url().to_string();
        let reset = resp
            .headers()
            .get("x-ratelimit-reset")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        classify_status(resp.status().as_u16(), &url, reset.as_deref())?;
        resp.text().await.map_err(transport_error)
    }
}

#[async_trait]
impl ContentApi for GithubApi {
    async fn list(&self, path: &str) -> Result<Vec<RemoteEntry>, FetchError> {
        let url = self.contents_url(path);
        tracing::debug!(%url, "listing folder");
        let body = self.body(self.client.get(&url)).await?;
        parse_contents(&body)
    }

    async fn latest_commit(&self, path: &str) -> Result<Option<DateTime<Utc>>, FetchError> {
        let request = self
            .client
            .get(format!("{}/commits", self.repo_url()))
            .query(&[("path", path), ("per_page", "1")]);
        let body = self.body(request).await?;
        parse_latest_commit(&body)
    }

    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        self.body(self.client.get(url)).await
    }

    fn raw_url(&self, path: &str) -> String {
        format!("{}/{}", self.config.raw_root(), path.trim_start_matches('/'))
    }
}

fn transport_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Network("request timed out".to_string())
    } else {
        FetchError::Network(e.to_string())
    }
}

/// Map an HTTP status to success or the failure taxonomy.
///
/// `ratelimit_reset` is the raw `x-ratelimit-reset` header (epoch seconds).
pub fn classify_status(
    status: u16,
    url: &str,
    ratelimit_reset: Option<&str>,
) -> Result<(), FetchError> {
    match status {
        200..=299 => Ok(()),
        403 | 429 => Err(FetchError::RateLimited {
            reset_at: ratelimit_reset
                .and_then(|raw| raw.trim().parse::<i64>().ok())
                .and_then(|secs| DateTime::from_timestamp(secs, 0)),
        }),
        404 => Err(FetchError::NotFound(url.to_string())),
        _ => Err(FetchError::UnexpectedStatus {
            status,
            url: url.to_string(),
        }),
    }
}
