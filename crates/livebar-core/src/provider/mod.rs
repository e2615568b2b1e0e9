//! Stream provider client (Twitch Helix).
//!
//! Owns the app access token, throttling and pagination for every call made
//! to the provider. One instance is shared by all destination tasks.

pub mod models;
pub mod pages;
pub mod token;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use self::models::{HelixGame, HelixStream, TokenResponse};
use self::pages::Paginator;
pub use self::pages::Page;
pub use self::token::TokenCache;
use crate::domain::{LivebarError, Result, StreamRecord, TokenLease};
use crate::ports::{Clock, HttpRequest, HttpTransport, Method, StreamDirectory};

pub const HELIX_API_BASE: &str = "https://api.twitch.tv/helix";
pub const TWITCH_TOKEN_URL: &str = "https://id.twitch.tv/oauth2/token";

/// Helix accepts at most 100 names / ids / results per call.
pub const MAX_PAGE_SIZE: usize = 100;

/// Used when a 429 arrives without a usable `Ratelimit-Reset` header.
const DEFAULT_RESET_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub client_id: String,
    pub client_secret: String,
    pub api_base: String,
    pub token_url: String,

    /// Throttled responses (429/503) tolerated per request before giving up.
    pub max_attempts: u32,

    /// Wait after a 503.
    pub busy_delay: Duration,

    /// `first=` for stream listings.
    pub page_size: usize,

    /// Stream pages read per chunk of game ids.
    pub stream_pages: usize,
}

impl ProviderConfig {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            api_base: HELIX_API_BASE.to_string(),
            token_url: TWITCH_TOKEN_URL.to_string(),
            max_attempts: 3,
            busy_delay: Duration::from_secs(5),
            page_size: MAX_PAGE_SIZE,
            stream_pages: 1,
        }
    }
}

pub struct ProviderClient {
    transport: Arc<dyn HttpTransport>,
    clock: Arc<dyn Clock>,
    config: ProviderConfig,
    tokens: TokenCache,
    /// Rate limits are per client id, so a 429 seen by one task holds back all of them.
    blocked_until: Mutex<Option<Instant>>,
}

impl ProviderClient {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        clock: Arc<dyn Clock>,
        config: ProviderConfig,
    ) -> Self {
        Self {
            transport,
            clock,
            config,
            tokens: TokenCache::new(),
            blocked_until: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn tokens(&self) -> &TokenCache {
        &self.tokens
    }

    /// Returns a valid bearer token, exchanging credentials first if needed.
    pub async fn ensure_token(&self) -> Result<String> {
        self.tokens
            .get_or_refresh(self.clock.as_ref(), || self.exchange_credentials())
            .await
    }

    async fn exchange_credentials(&self) -> Result<TokenLease> {
        info!("Requesting provider app access token");
        let request = HttpRequest::post(&self.config.token_url).form(vec![
            ("client_id".to_string(), self.config.client_id.clone()),
            ("client_secret".to_string(), self.config.client_secret.clone()),
            ("grant_type".to_string(), "client_credentials".to_string()),
        ]);

        let response = self.transport.send(request).await?;
        if !response.is_success() {
            let body = response.text();
            return Err(match response.status {
                400 | 401 | 403 => LivebarError::Unauthorized(body),
                status => LivebarError::Http { status, body },
            });
        }

        let token: TokenResponse = serde_json::from_slice(&response.body)?;
        debug!(expires_in = token.expires_in, "Provider token issued");
        Ok(TokenLease::new(
            token.access_token,
            self.clock.now(),
            token.expires_in,
        ))
    }

    /// Issues one API call and returns the decoded body.
    ///
    /// - 429: wait until `Ratelimit-Reset`, retry
    /// - 503: wait `busy_delay`, retry
    /// - 401: drop the token, refresh, retry once
    ///
    /// Throttled retries are bounded by `max_attempts`.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        params: &[(String, String)],
    ) -> Result<Value> {
        let url = format!("{}{}", self.config.api_base, path);
        let mut throttled = 0u32;
        let mut reauthorized = false;

        loop {
            self.wait_for_rate_limit().await;
            let bearer = self.ensure_token().await?;

            let request = HttpRequest::new(method, url.as_str())
                .header("Client-Id", self.config.client_id.as_str())
                .header("Authorization", format!("Bearer {bearer}"))
                .query(params);
            debug!(%url, params = params.len(), "Provider request");

            let response = self.transport.send(request).await?;
            match response.status {
                429 => {
                    throttled += 1;
                    if throttled >= self.config.max_attempts {
                        return Err(LivebarError::RateLimited {
                            attempts: throttled,
                        });
                    }
                    let delay = self.reset_delay(response.header("ratelimit-reset"));
                    warn!(%url, delay_secs = delay.as_secs(), "Provider rate limit hit");
                    self.block_for(delay);
                }
                503 => {
                    throttled += 1;
                    if throttled >= self.config.max_attempts {
                        return Err(LivebarError::Unavailable {
                            attempts: throttled,
                        });
                    }
                    warn!(%url, "Provider busy, retrying in {:?}", self.config.busy_delay);
                    tokio::time::sleep(self.config.busy_delay).await;
                }
                401 => {
                    if reauthorized {
                        return Err(LivebarError::Unauthorized(response.text()));
                    }
                    reauthorized = true;
                    warn!(%url, "Provider rejected token, refreshing");
                    self.tokens.invalidate(&bearer).await;
                }
                _ if response.is_success() => {
                    return Ok(serde_json::from_slice(&response.body)?);
                }
                status => {
                    return Err(LivebarError::Http {
                        status,
                        body: response.text(),
                    });
                }
            }
        }
    }

    /// Walks a cursor-paginated endpoint.
    pub fn paginate(
        &self,
        method: Method,
        path: &str,
        params: Vec<(String, String)>,
    ) -> Paginator<'_> {
        Paginator::new(self, method, path, params)
    }

    /// Game id -> name for every configured name the provider knows.
    ///
    /// The returned name is the configured spelling, so a format table keyed by
    /// "league of legends" still matches "League of Legends".
    pub async fn resolve_game_ids(&self, names: &[String]) -> Result<HashMap<String, String>> {
        let mut mapping = HashMap::new();
        for chunk in names.chunks(MAX_PAGE_SIZE) {
            let params: Vec<(String, String)> = chunk
                .iter()
                .map(|name| ("name".to_string(), name.clone()))
                .collect();
            let body = self.request(Method::Get, "/games", &params).await?;

            for raw in Page::from_body(body).data {
                let game: HelixGame = match serde_json::from_value(raw) {
                    Ok(game) => game,
                    Err(e) => {
                        warn!("Skipping malformed game entry: {e}");
                        continue;
                    }
                };
                let name = chunk
                    .iter()
                    .find(|n| n.eq_ignore_ascii_case(&game.name))
                    .cloned()
                    .unwrap_or(game.name);
                mapping.insert(game.id, name);
            }
        }
        Ok(mapping)
    }

    /// Live streams for the given game ids, provider order preserved.
    pub async fn list_streams(&self, game_ids: &[String]) -> Result<Vec<StreamRecord>> {
        let mut streams = Vec::new();
        for chunk in game_ids.chunks(MAX_PAGE_SIZE) {
            let mut params: Vec<(String, String)> = chunk
                .iter()
                .map(|id| ("game_id".to_string(), id.clone()))
                .collect();
            params.push(("first".to_string(), self.config.page_size.to_string()));

            let mut pages = self.paginate(Method::Get, "/streams", params);
            let mut read = 0;
            while read < self.config.stream_pages {
                let Some(page) = pages.next_page().await? else {
                    break;
                };
                read += 1;
                for raw in page.data {
                    match serde_json::from_value::<HelixStream>(raw) {
                        Ok(stream) => streams.push(StreamRecord::from(stream)),
                        Err(e) => warn!("Skipping malformed stream entry: {e}"),
                    }
                }
            }
        }
        Ok(streams)
    }

    fn reset_delay(&self, header: Option<&str>) -> Duration {
        let Some(reset) = header.and_then(|h| h.trim().parse::<i64>().ok()) else {
            return DEFAULT_RESET_DELAY;
        };
        let secs = reset - self.clock.now().timestamp();
        Duration::from_secs(secs.max(0) as u64)
    }

    fn block_for(&self, delay: Duration) {
        let until = Instant::now() + delay;
        let mut blocked = self.blocked_until.lock().unwrap_or_else(|e| e.into_inner());
        if blocked.is_none_or(|current| current < until) {
            *blocked = Some(until);
        }
    }

    async fn wait_for_rate_limit(&self) {
        let until = *self.blocked_until.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(until) = until.filter(|u| *u > Instant::now()) {
            tokio::time::sleep_until(until).await;
        }
    }
}

#[async_trait]
impl StreamDirectory for ProviderClient {
    async fn resolve_game_ids(&self, names: &[String]) -> Result<HashMap<String, String>> {
        ProviderClient::resolve_game_ids(self, names).await
    }

    async fn list_streams(&self, game_ids: &[String]) -> Result<Vec<StreamRecord>> {
        ProviderClient::list_streams(self, game_ids).await
    }
}
