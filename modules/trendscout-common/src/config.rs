use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::TrendScoutError;
use crate::types::{LanguageCode, Location};

/// Locations the collector watches when none are given.
pub const DEFAULT_LOCATIONS: &str = "london,dublin,toronto,vancouver,zurich,amsterdam";

/// API key/secret pair read from the local credentials resource.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    #[serde(rename = "API_KEY")]
    pub api_key: String,
    #[serde(rename = "API_SECRET")]
    pub api_secret: String,
}

impl Credentials {
    /// Read `{"API_KEY": "...", "API_SECRET": "..."}` from `path`.
    pub fn from_file(path: &Path) -> Result<Self, TrendScoutError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            TrendScoutError::Config(format!(
                "cannot read credentials file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_json(&raw).map_err(|e| match e {
            TrendScoutError::Config(msg) => {
                TrendScoutError::Config(format!("{}: {msg}", path.display()))
            }
            other => other,
        })
    }

    pub fn from_json(raw: &str) -> Result<Self, TrendScoutError> {
        let creds: Credentials = serde_json::from_str(raw)
            .map_err(|e| TrendScoutError::Config(format!("malformed credentials: {e}")))?;
        if creds.api_key.trim().is_empty() || creds.api_secret.trim().is_empty() {
            return Err(TrendScoutError::Config(
                "API_KEY and API_SECRET must both be non-empty".to_string(),
            ));
        }
        Ok(creds)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &preview(&self.api_key))
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

/// Settings for one collection pass.
#[derive(Debug, Clone)]
pub struct ScoutConfig {
    pub locations: Vec<Location>,
    pub language: LanguageCode,
    /// Cap on posts kept per hashtag.
    pub max_results: usize,
    /// Posts requested per search page (platform maximum is 100).
    pub page_size: u32,
    /// Regions or hashtags fetched at the same time.
    pub concurrency: usize,
    /// Wait applied when a paginated search is throttled.
    pub pagination_cooldown: Duration,
    /// Wait applied once when a region's trend fetch hits the hourly limit.
    pub trends_cooldown: Duration,
    pub output_dir: PathBuf,
}

impl Default for ScoutConfig {
    fn default() -> Self {
        Self {
            locations: Location::parse_list(DEFAULT_LOCATIONS),
            language: LanguageCode::default(),
            max_results: 100,
            page_size: 100,
            concurrency: 4,
            pagination_cooldown: Duration::from_secs(15 * 60),
            trends_cooldown: Duration::from_secs(3605),
            output_dir: PathBuf::from("trending_tweets"),
        }
    }
}

impl ScoutConfig {
    /// Clamp values that would make the pipeline misbehave.
    pub fn normalized(mut self) -> Self {
        self.page_size = self.page_size.clamp(1, 100);
        self.concurrency = self.concurrency.max(1);
        self
    }

    pub fn log_redacted(&self) {
        let locations: Vec<&str> = self.locations.iter().map(Location::as_str).collect();
        tracing::info!("Config loaded:");
        tracing::info!("  locations: {}", locations.join(","));
        tracing::info!("  language: {}", self.language);
        tracing::info!("  max_results: {}", self.max_results);
        tracing::info!("  page_size: {}", self.page_size);
        tracing::info!("  concurrency: {}", self.concurrency);
        tracing::info!(
            "  cooldowns: pagination={}s trends={}s",
            self.pagination_cooldown.as_secs(),
            self.trends_cooldown.as_secs()
        );
        tracing::info!("  output_dir: {}", self.output_dir.display());
    }
}

fn preview(val: &str) -> String {
    let n: usize = val.chars().take(4).map(char::len_utf8).sum();
    format!("{}...({} chars)", &val[..n], val.len())
}
