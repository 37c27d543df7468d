pub mod error;
pub mod types;

pub use error::{Result, TwitterError};
pub use types::{
    parse_twitter_date, PlaceTrends, ResultType, SearchMetadata, SearchParams, SearchResponse,
    Status, TokenResponse, Trend, TrendLocation, TweetUser, MAX_SEARCH_COUNT,
};

use chrono::{DateTime, TimeZone, Utc};
use serde::de::DeserializeOwned;
use std::time::Duration;

const BASE_URL: &str = "https://api.twitter.com";

/// Applied to every request, including the token exchange.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Response header carrying the epoch second at which the current window resets.
const RATE_LIMIT_RESET_HEADER: &str = "x-rate-limit-reset";

/// App-only (bearer token) client for the Twitter v1.1 REST API.
///
/// Immutable after construction; clone it or share it behind an `Arc` to use
/// it from several tasks at once.
#[derive(Clone)]
pub struct TwitterClient {
    client: reqwest::Client,
    base_url: String,
    bearer_token: String,
}

impl TwitterClient {
    /// Exchange an API key/secret pair for an app-only bearer token.
    pub async fn authenticate(api_key: &str, api_secret: &str) -> Result<Self> {
        Self::authenticate_at(BASE_URL, api_key, api_secret).await
    }

    /// Same as [`TwitterClient::authenticate`] against a different API host.
    pub async fn authenticate_at(base_url: &str, api_key: &str, api_secret: &str) -> Result<Self> {
        let client = http_client()?;
        let base_url = base_url.trim_end_matches('/').to_string();

        tracing::debug!("twitter: requesting app-only bearer token");
        let resp = client
            .post(format!("{base_url}/oauth2/token"))
            .basic_auth(api_key, Some(api_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TwitterError::Auth {
                status: status.as_u16(),
                message: body,
            });
        }

        let token: TokenResponse = resp.json().await?;
        if !token.token_type.eq_ignore_ascii_case("bearer") {
            return Err(TwitterError::Auth {
                status: status.as_u16(),
                message: format!("unexpected token type: {}", token.token_type),
            });
        }

        Ok(Self {
            client,
            base_url,
            bearer_token: token.access_token,
        })
    }

    /// Build a client around an already issued bearer token.
    pub fn with_bearer_token(bearer_token: impl Into<String>) -> Result<Self> {
        Self::with_bearer_token_at(BASE_URL, bearer_token)
    }

    /// Same as [`TwitterClient::with_bearer_token`] against a different API host.
    pub fn with_bearer_token_at(base_url: &str, bearer_token: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            bearer_token: bearer_token.into(),
        })
    }

    /// Every location the platform currently reports trends for.
    pub async fn trends_available(&self) -> Result<Vec<TrendLocation>> {
        self.get_json("/1.1/trends/available.json", &[]).await
    }

    /// Current trending topics for one WOEID.
    pub async fn trends_place(&self, woeid: i64) -> Result<Vec<Trend>> {
        let places: Vec<PlaceTrends> = self
            .get_json("/1.1/trends/place.json", &[("id", woeid.to_string())])
            .await?;

        Ok(places
            .into_iter()
            .next()
            .map(|place| place.trends)
            .unwrap_or_default())
    }

    /// One page of `search/tweets.json`.
    pub async fn search_tweets(&self, params: &SearchParams) -> Result<SearchResponse> {
        let resp: SearchResponse = self
            .get_json("/1.1/search/tweets.json", &params.to_query())
            .await?;
        tracing::debug!(
            query = params.query.as_str(),
            count = resp.statuses.len(),
            has_next = resp.search_metadata.next_results.is_some(),
            "twitter: search page fetched"
        );
        Ok(resp)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.bearer_token)
            .query(query)
            .send()
            .await?;

        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let reset_at = resp
                .headers()
                .get(RATE_LIMIT_RESET_HEADER)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_reset_header);
            tracing::debug!(path, ?reset_at, "twitter: rate limited");
            return Err(TwitterError::RateLimited { reset_at });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TwitterError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

fn http_client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?)
}

fn parse_reset_header(raw: &str) -> Option<DateTime<Utc>> {
    let secs: i64 = raw.trim().parse().ok()?;
    Utc.timestamp_opt(secs, 0).single()
}
