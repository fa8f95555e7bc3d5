//! Remote catalog tier (pokemontcg.io v2)
//!
//! One attempt per card, no retries: a failed lookup falls through to the
//! retry backlog. Requests are spaced by a minimum interval shared by every
//! worker using the same client.

use crate::db::catalog_values::CatalogCategory;
use crate::error::{SyncError, SyncResult};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Default API root
pub const DEFAULT_BASE_URL: &str = "https://api.pokemontcg.io/v2";
const USER_AGENT: &str = concat!("ptcg-sync/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Live lookup of single card records
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Fetch one card record; `Ok(None)` when the source does not know the id
    async fn fetch_card(&self, card_id: &str) -> SyncResult<Option<Value>>;
}

/// Rate limiter enforcing a minimum interval between requests
struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval,
        }
    }

    /// Wait if necessary to comply with rate limit
    async fn wait(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                tracing::debug!("Rate limiting: waiting {:?}", wait_time);
                tokio::time::sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }
}

/// pokemontcg.io API client
pub struct PokemonTcgClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    rate_limiter: Arc<RateLimiter>,
}

impl PokemonTcgClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        min_interval: Duration,
    ) -> SyncResult<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| SyncError::Remote(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            rate_limiter: Arc::new(RateLimiter::new(min_interval)),
        })
    }

    fn card_url(&self, card_id: &str) -> String {
        format!("{}/cards/{}", self.base_url, card_id)
    }

    /// Rate-limited GET returning the `data` member; `Ok(None)` on 404
    async fn get_data(&self, url: &str) -> SyncResult<Option<Value>> {
        self.rate_limiter.wait().await;

        let mut request = self.http_client.get(url);
        if let Some(key) = &self.api_key {
            request = request.header("X-Api-Key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SyncError::Remote(e.to_string()))?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(SyncError::Remote(format!(
                "{} returned {}: {}",
                url,
                status.as_u16(),
                error_text
            )));
        }

        let mut body: Value = response
            .json()
            .await
            .map_err(|e| SyncError::Remote(e.to_string()))?;

        match body.get_mut("data").map(Value::take) {
            Some(Value::Null) | None => Err(SyncError::Remote(format!(
                "{} response has no `data` member",
                url
            ))),
            Some(data) => Ok(Some(data)),
        }
    }

    /// Vocabulary of one classification field (`GET {base}/types` and friends)
    pub async fn fetch_catalog_values(&self, category: CatalogCategory) -> SyncResult<Vec<String>> {
        let url = format!("{}/{}", self.base_url, category.endpoint());
        tracing::debug!(category = category.as_str(), url = %url, "Querying remote vocabulary");

        match self.get_data(&url).await? {
            Some(Value::Array(items)) => Ok(items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect()),
            _ => Err(SyncError::Remote(format!(
                "{} response has no value list under `data`",
                url
            ))),
        }
    }
}

#[async_trait]
impl RemoteSource for PokemonTcgClient {
    async fn fetch_card(&self, card_id: &str) -> SyncResult<Option<Value>> {
        let url = self.card_url(card_id);
        tracing::debug!(card_id = %card_id, url = %url, "Querying remote catalog");

        match self.get_data(&url).await? {
            None => Ok(None),
            Some(card @ Value::Object(_)) => Ok(Some(card)),
            Some(_) => Err(SyncError::Remote(format!(
                "{} response has no card object under `data`",
                url
            ))),
        }
    }
}
