use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

/// `created_at` format used across the v1.1 API, e.g. `Wed Oct 10 20:19:24 +0000 2018`.
const TWITTER_DATE_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// Maximum `count` accepted by the standard search endpoint.
pub const MAX_SEARCH_COUNT: u32 = 100;

// --- Auth ---

/// Response of the OAuth2 client-credentials exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub token_type: String,
    pub access_token: String,
}

// --- Trends ---

/// One entry of `trends/available.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct TrendLocation {
    pub name: String,
    pub woeid: i64,
    pub country: Option<String>,
    #[serde(rename = "countryCode")]
    pub country_code: Option<String>,
    #[serde(rename = "parentid")]
    pub parent_id: Option<i64>,
}

/// One element of the `trends/place.json` array. The API always returns
/// exactly one element for a single `id`.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceTrends {
    pub trends: Vec<Trend>,
    pub as_of: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Trend {
    pub name: String,
    pub url: Option<String>,
    pub query: Option<String>,
    pub tweet_volume: Option<i64>,
}

// --- Search ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultType {
    Mixed,
    Recent,
    Popular,
}

impl ResultType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultType::Mixed => "mixed",
            ResultType::Recent => "recent",
            ResultType::Popular => "popular",
        }
    }
}

/// Parameters for `search/tweets.json`.
#[derive(Debug, Clone)]
pub struct SearchParams {
    pub query: String,
    pub lang: Option<String>,
    pub result_type: ResultType,
    pub count: u32,
    /// Only return statuses with an id at or below this one. Drives pagination.
    pub max_id: Option<String>,
}

impl SearchParams {
    pub fn popular(query: impl Into<String>, count: u32) -> Self {
        Self {
            query: query.into(),
            lang: None,
            result_type: ResultType::Popular,
            count: count.clamp(1, MAX_SEARCH_COUNT),
            max_id: None,
        }
    }

    pub fn lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    pub fn max_id(mut self, max_id: Option<String>) -> Self {
        self.max_id = max_id;
        self
    }

    pub(crate) fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("q", self.query.clone()),
            ("result_type", self.result_type.as_str().to_string()),
            ("count", self.count.to_string()),
            ("tweet_mode", "extended".to_string()),
        ];
        if let Some(lang) = &self.lang {
            query.push(("lang", lang.clone()));
        }
        if let Some(max_id) = &self.max_id {
            query.push(("max_id", max_id.clone()));
        }
        query
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    pub statuses: Vec<Status>,
    pub search_metadata: SearchMetadata,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchMetadata {
    /// Query string for the next (older) page, e.g. `?max_id=123&q=%23rust&count=100`.
    /// Absent on the last page.
    pub next_results: Option<String>,
    pub count: Option<u32>,
}

impl SearchMetadata {
    /// The `max_id` to request the next page with, if there is one.
    pub fn next_max_id(&self) -> Option<String> {
        let next = self.next_results.as_deref()?;
        url::form_urlencoded::parse(next.trim_start_matches('?').as_bytes())
            .find(|(key, _)| key == "max_id")
            .map(|(_, value)| value.into_owned())
            .filter(|value| !value.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TweetUser {
    pub screen_name: String,
    pub name: Option<String>,
}

/// A single status (tweet) from a search page.
#[derive(Debug, Clone, Deserialize)]
pub struct Status {
    pub id_str: String,
    #[serde(deserialize_with = "deserialize_twitter_date")]
    pub created_at: DateTime<Utc>,
    pub full_text: Option<String>,
    pub text: Option<String>,
    pub user: TweetUser,
    pub lang: Option<String>,
}

impl Status {
    /// Returns whichever text field is populated, preferring `full_text`.
    pub fn content(&self) -> &str {
        self.full_text
            .as_deref()
            .or(self.text.as_deref())
            .unwrap_or_default()
    }
}

/// Parse a v1.1 `created_at` timestamp into UTC.
pub fn parse_twitter_date(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(raw, TWITTER_DATE_FORMAT)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn deserialize_twitter_date<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_twitter_date(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid created_at: {raw}")))
}
