//! RedditDocumentStore - subreddit の sidebar と wiki への書き込み
//!
//! Script-app OAuth (password grant) against reddit.com, then plain form posts
//! to the moderation endpoints on oauth.reddit.com.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::domain::{LivebarError, Result, TokenLease};
use crate::ports::{Clock, DocumentStore, HttpRequest, HttpResponse, HttpTransport, Method};
use crate::provider::TokenCache;

pub const REDDIT_TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
pub const REDDIT_API_BASE: &str = "https://oauth.reddit.com";

/// Settings keys that `about/edit` and `site_admin` spell differently.
const RENAMED_SETTINGS: [(&str, &str); 5] = [
    ("subreddit_type", "type"),
    ("language", "lang"),
    ("content_options", "link_type"),
    ("default_set", "allow_top"),
    ("header_hover_text", "header-title"),
];

#[derive(Debug, Clone)]
pub struct RedditConfig {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
    pub token_url: String,
    pub api_base: String,
}

impl RedditConfig {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            username: username.into(),
            password: password.into(),
            token_url: REDDIT_TOKEN_URL.to_string(),
            api_base: REDDIT_API_BASE.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PasswordGrant {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    error: Option<String>,
}

pub struct RedditDocumentStore {
    transport: Arc<dyn HttpTransport>,
    clock: Arc<dyn Clock>,
    config: RedditConfig,
    tokens: TokenCache,
}

impl RedditDocumentStore {
    pub fn new(transport: Arc<dyn HttpTransport>, clock: Arc<dyn Clock>, config: RedditConfig) -> Self {
        Self {
            transport,
            clock,
            config,
            tokens: TokenCache::new(),
        }
    }

    async fn bearer(&self) -> Result<String> {
        self.tokens
            .get_or_refresh(self.clock.as_ref(), || self.login())
            .await
    }

    async fn login(&self) -> Result<TokenLease> {
        info!(username = %self.config.username, "Logging in to Reddit");
        let basic = STANDARD.encode(format!(
            "{}:{}",
            self.config.client_id, self.config.client_secret
        ));
        let request = HttpRequest::post(&self.config.token_url)
            .header("Authorization", format!("Basic {basic}"))
            .form(vec![
                ("grant_type".to_string(), "password".to_string()),
                ("username".to_string(), self.config.username.clone()),
                ("password".to_string(), self.config.password.clone()),
            ]);

        let response = self.transport.send(request).await?;
        if matches!(response.status, 400 | 401 | 403) {
            return Err(LivebarError::Unauthorized(response.text()));
        }
        if !response.is_success() {
            return Err(LivebarError::from_status(response.status, response.text()));
        }

        // a wrong password is a 200 with an `error` field
        let grant: PasswordGrant = serde_json::from_slice(&response.body)?;
        match (grant.access_token, grant.error) {
            (Some(token), None) => Ok(TokenLease::new(
                token,
                self.clock.now(),
                grant.expires_in.unwrap_or(3600),
            )),
            (_, error) => Err(LivebarError::Unauthorized(
                error.unwrap_or_else(|| "no access token in response".to_string()),
            )),
        }
    }

    /// Sends an authenticated request. A 401 drops the token and retries once.
    async fn call(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        form: Option<Vec<(String, String)>>,
    ) -> Result<Value> {
        let url = format!("{}{}", self.config.api_base, path);
        let mut reauthorized = false;

        loop {
            let bearer = self.bearer().await?;
            let mut request = HttpRequest::new(method, url.as_str())
                .header("Authorization", format!("bearer {bearer}"))
                .query(query);
            if let Some(form) = &form {
                request = request.form(form.clone());
            }
            debug!(%url, "Reddit request");

            let response = self.transport.send(request).await?;
            if response.status == 401 && !reauthorized {
                reauthorized = true;
                warn!(%url, "Reddit rejected token, logging in again");
                self.tokens.invalidate(&bearer).await;
                continue;
            }
            return decode(response);
        }
    }

    async fn settings(&self, destination: &str) -> Result<serde_json::Map<String, Value>> {
        let body = self
            .call(Method::Get, &format!("/r/{destination}/about/edit"), &[], None)
            .await?;
        match body.get("data") {
            Some(Value::Object(data)) => Ok(data.clone()),
            _ => Err(LivebarError::Rejected(format!(
                "no settings returned for /r/{destination}"
            ))),
        }
    }
}

/// Maps a response to the body or a classified error.
fn decode(response: HttpResponse) -> Result<Value> {
    if !response.is_success() {
        return Err(LivebarError::from_status(response.status, response.text()));
    }
    if response.body.is_empty() {
        return Ok(Value::Null);
    }
    let body: Value = serde_json::from_slice(&response.body)?;
    if let Some(errors) = body.pointer("/json/errors").and_then(Value::as_array) {
        if !errors.is_empty() {
            return Err(LivebarError::Rejected(Value::Array(errors.clone()).to_string()));
        }
    }
    Ok(body)
}

/// Reddit returns sidebar markdown with `&`, `<` and `>` escaped.
pub fn unescape_html(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Turns the `about/edit` payload into a `site_admin` form.
fn settings_form(data: &serde_json::Map<String, Value>) -> Vec<(String, String)> {
    data.iter()
        .filter_map(|(key, value)| {
            let key = RENAMED_SETTINGS
                .iter()
                .find(|(from, _)| *from == key.as_str())
                .map_or(key.as_str(), |(_, to)| *to);
            let value = match value {
                Value::String(s) => s.clone(),
                Value::Bool(b) => b.to_string(),
                Value::Number(n) => n.to_string(),
                _ => return None,
            };
            Some((key.to_string(), value))
        })
        .collect()
}

#[async_trait]
impl DocumentStore for RedditDocumentStore {
    async fn get_description(&self, destination: &str) -> Result<String> {
        let data = self.settings(destination).await?;
        let description = data
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default();
        Ok(unescape_html(description))
    }

    async fn set_description(&self, destination: &str, text: &str) -> Result<()> {
        let data = self.settings(destination).await?;
        let sr = data
            .get("subreddit_id")
            .and_then(Value::as_str)
            .unwrap_or(destination)
            .to_string();

        let mut form: Vec<(String, String)> = settings_form(&data)
            .into_iter()
            .filter(|(key, _)| !matches!(key.as_str(), "description" | "sr" | "api_type"))
            .collect();
        form.push(("sr".to_string(), sr));
        form.push(("description".to_string(), text.to_string()));
        form.push(("api_type".to_string(), "json".to_string()));

        self.call(Method::Post, "/api/site_admin", &[], Some(form))
            .await?;
        Ok(())
    }

    async fn write_wiki_page(
        &self,
        destination: &str,
        page: &str,
        text: &str,
        reason: &str,
    ) -> Result<()> {
        let form = vec![
            ("page".to_string(), page.to_string()),
            ("content".to_string(), text.to_string()),
            ("reason".to_string(), reason.to_string()),
        ];
        self.call(
            Method::Post,
            &format!("/r/{destination}/api/wiki/edit"),
            &[],
            Some(form),
        )
        .await?;
        Ok(())
    }
}
