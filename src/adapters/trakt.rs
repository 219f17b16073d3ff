use crate::adapters::http::{read_json, send_with_retry, RetryPolicy};
use crate::config::toml_config::TraktConfig;
use crate::core::{ReferenceEntry, ReferenceListPort};
use crate::utils::error::{Result, SyncError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

pub const DEFAULT_API_URL: &str = "https://api.trakt.tv";
const API_VERSION: &str = "2";

#[derive(Debug, Deserialize)]
struct TraktListItem {
    rank: Option<u32>,
    movie: Option<TraktMovie>,
}

#[derive(Debug, Deserialize)]
struct TraktMovie {
    title: String,
    year: Option<i32>,
    #[serde(default)]
    ids: TraktIds,
}

#[derive(Debug, Default, Deserialize)]
struct TraktIds {
    imdb: Option<String>,
}

impl TraktListItem {
    fn into_entry(self) -> Option<ReferenceEntry> {
        let movie = self.movie?;
        Some(ReferenceEntry {
            identifier: movie.ids.imdb.filter(|id| !id.trim().is_empty()),
            title: movie.title,
            year: movie.year,
            rank: self.rank,
        })
    }
}

/// Turns a public list URL into its API path, e.g.
/// `https://trakt.tv/users/justin/lists/imdb-top-rated-movies?sort=rank`
/// becomes `justin/lists/imdb-top-rated-movies`.
pub fn list_path(list_url: &str) -> Result<String> {
    let invalid = |reason: &str| SyncError::InvalidListUrl {
        url: list_url.to_string(),
        reason: reason.to_string(),
    };

    let url = Url::parse(list_url).map_err(|e| invalid(&e.to_string()))?;
    let (_, path) = url
        .path()
        .split_once("/users/")
        .ok_or_else(|| invalid("expected a path containing /users/"))?;

    let path = path.trim_matches('/');
    if path.is_empty() {
        return Err(invalid("missing user and list name"));
    }
    Ok(path.to_string())
}

pub struct TraktClient {
    api_url: String,
    api_key: String,
    timeout: Option<Duration>,
    client: Client,
    retry: RetryPolicy,
}

impl TraktClient {
    pub fn new(config: &TraktConfig, retry: RetryPolicy) -> Self {
        Self {
            api_url: config
                .api_url
                .as_deref()
                .unwrap_or(DEFAULT_API_URL)
                .trim_end_matches('/')
                .to_string(),
            api_key: config.api_key.clone(),
            timeout: config.timeout_seconds.map(Duration::from_secs),
            client: Client::new(),
            retry,
        }
    }

    fn items_endpoint(&self, list_url: &str) -> Result<String> {
        Ok(format!("{}/users/{}/items/movies", self.api_url, list_path(list_url)?))
    }
}

#[async_trait]
impl ReferenceListPort for TraktClient {
    async fn fetch_list(&self, list_url: &str) -> Result<Vec<ReferenceEntry>> {
        let endpoint = self.items_endpoint(list_url)?;
        tracing::debug!("📡 Fetching Trakt list {} via {}", list_url, endpoint);

        let response = send_with_retry(&self.retry, "fetch_list", list_url, || {
            let mut request = self
                .client
                .get(&endpoint)
                .header("Content-Type", "application/json")
                .header("trakt-api-version", API_VERSION)
                .header("trakt-api-key", &self.api_key);
            if let Some(timeout) = self.timeout {
                request = request.timeout(timeout);
            }
            request
        })
        .await?;

        let items: Vec<TraktListItem> = read_json(response, "fetch_list", list_url).await?;
        let total = items.len();
        let entries: Vec<ReferenceEntry> = items
            .into_iter()
            .filter_map(TraktListItem::into_entry)
            .collect();

        if entries.len() < total {
            tracing::debug!("Ignored {} list items that are not movies", total - entries.len());
        }
        Ok(entries)
    }
}
