use crate::error::LookupError;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://typeahead-js-twitter-api-proxy.herokuapp.com/demo/search";

/// Profile and latest post returned by the lookup proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupRecord {
    pub name: String,
    pub handle: String,
    pub body: String,
    pub retweets: u64,
    pub likes: u64,
    pub avatar_url: String,
}

#[derive(Debug, Deserialize)]
struct ApiUser {
    name: String,
    screen_name: String,
    profile_image_url_https: String,
    status: ApiStatus,
}

#[derive(Debug, Deserialize)]
struct ApiStatus {
    text: String,
    retweet_count: u64,
    favorite_count: u64,
}

#[async_trait]
pub trait ProfileLookup: Send + Sync {
    async fn lookup(&self, handle: &str) -> Result<LookupRecord, LookupError>;
}

pub struct HttpLookup {
    endpoint: String,
    client: reqwest::Client,
}

/// Shared HTTP client for lookups and avatar downloads.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, LookupError> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("tweetcard/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

impl HttpLookup {
    pub fn new(endpoint: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            endpoint: endpoint.into(),
            client,
        }
    }

    fn request_url(&self, handle: &str) -> String {
        let separator = if self.endpoint.contains('?') { '&' } else { '?' };
        format!(
            "{}{}q={}",
            self.endpoint,
            separator,
            urlencoding::encode(handle)
        )
    }
}

/// Parse the proxy's JSON array, taking the first entry. The whole record
/// must be present; nothing is returned from a half-formed entry.
pub fn parse_response(body: &str, handle: &str) -> Result<LookupRecord, LookupError> {
    let users: Vec<ApiUser> = serde_json::from_str(body)?;
    let user = users
        .into_iter()
        .next()
        .ok_or_else(|| LookupError::NotFound(handle.to_string()))?;

    Ok(LookupRecord {
        name: user.name,
        handle: user.screen_name,
        body: user.status.text,
        retweets: user.status.retweet_count,
        likes: user.status.favorite_count,
        avatar_url: user.profile_image_url_https,
    })
}

#[async_trait]
impl ProfileLookup for HttpLookup {
    async fn lookup(&self, handle: &str) -> Result<LookupRecord, LookupError> {
        let handle = handle.trim().trim_start_matches('@');
        if handle.is_empty() {
            return Err(LookupError::EmptyHandle);
        }

        let url = self.request_url(handle);
        tracing::debug!(%url, "looking up profile");

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(LookupError::Status(response.status()));
        }

        let body = response.text().await?;
        parse_response(&body, handle)
    }
}
