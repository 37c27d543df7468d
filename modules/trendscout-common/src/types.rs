use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TrendScoutError;

/// Marker a trending topic must start with to count as a hashtag.
pub const HASHTAG_MARKER: char = '#';

/// Timestamp format of the `created_at` column in post rows.
pub const POST_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

// --- Locations and regions ---

/// A place name as requested by the caller, trimmed and lower-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location(String);

impl Location {
    pub fn new(name: &str) -> Self {
        Self(name.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split a comma separated list, dropping empty entries.
    pub fn parse_list(raw: &str) -> Vec<Location> {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Location::new)
            .collect()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Location {
    fn from(name: &str) -> Self {
        Location::new(name)
    }
}

/// Opaque platform key for a trend-reporting region (a WOEID on Twitter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionId(pub i64);

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One entry of the platform's region directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub name: String,
    pub id: RegionId,
}

impl Region {
    pub fn new(name: impl Into<String>, id: i64) -> Self {
        Self {
            name: name.into(),
            id: RegionId(id),
        }
    }
}

// --- Language ---

/// Two-letter ISO 639-1 language code, lower-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LanguageCode(String);

impl LanguageCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for LanguageCode {
    fn default() -> Self {
        Self("en".to_string())
    }
}

impl FromStr for LanguageCode {
    type Err = TrendScoutError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let code = raw.trim().to_ascii_lowercase();
        if code.len() != 2 || !code.chars().all(|c| c.is_ascii_lowercase()) {
            return Err(TrendScoutError::Config(format!(
                "language must be a two-letter ISO 639-1 code, got {raw:?}"
            )));
        }
        Ok(Self(code))
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// --- Trends ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendingTopic {
    pub name: String,
}

impl TrendingTopic {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn is_hashtag(&self) -> bool {
        self.name.starts_with(HASHTAG_MARKER)
    }
}

/// Unique hashtags gathered across every region of a run. Case-sensitive.
pub type HashtagSet = BTreeSet<String>;

// --- Posts ---

/// A post as returned by a platform search, before it is tied to a hashtag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub author: String,
    pub text: String,
}

/// A collected post. The same post id may show up under several hashtags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Post {
    pub id: String,
    pub hashtag: String,
    pub created_at: DateTime<Utc>,
    pub author: String,
    pub text: String,
}

impl Post {
    pub fn from_hit(hashtag: &str, hit: SearchHit) -> Self {
        Self {
            id: hit.id,
            hashtag: hashtag.to_string(),
            created_at: hit.created_at,
            author: hit.author,
            text: hit.text,
        }
    }

    pub fn formatted_created_at(&self) -> String {
        self.created_at.format(POST_TIMESTAMP_FORMAT).to_string()
    }

    /// Columns in output order: id, hashtag, created_at, author, text.
    pub fn to_row(&self) -> [String; 5] {
        [
            self.id.clone(),
            self.hashtag.clone(),
            self.formatted_created_at(),
            self.author.clone(),
            self.text.clone(),
        ]
    }
}

/// Posts for one hashtag, in the order the platform returned them.
pub type PostBatch = Vec<Post>;

/// A region or hashtag whose contribution was dropped, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    pub item: String,
    pub reason: String,
}

impl ItemFailure {
    pub fn new(item: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ItemFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.item, self.reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn location_is_trimmed_and_lowercased() {
        assert_eq!(Location::new("  London ").as_str(), "london");
    }

    #[test]
    fn location_list_skips_blanks() {
        let locations = Location::parse_list("London, ,Dublin,");
        assert_eq!(locations, vec![Location::new("london"), Location::new("dublin")]);
    }

    #[test]
    fn language_code_validation() {
        assert_eq!("EN".parse::<LanguageCode>().unwrap().as_str(), "en");
        assert!("eng".parse::<LanguageCode>().is_err());
        assert!("e1".parse::<LanguageCode>().is_err());
        assert!("".parse::<LanguageCode>().is_err());
    }

    #[test]
    fn hashtag_detection_requires_leading_marker() {
        assert!(TrendingTopic::new("#Foo").is_hashtag());
        assert!(!TrendingTopic::new("Foo").is_hashtag());
        assert!(!TrendingTopic::new("Foo #Bar").is_hashtag());
    }

    #[test]
    fn post_row_formats_timestamp_to_minutes() {
        let post = Post::from_hit(
            "#Rust",
            SearchHit {
                id: "42".into(),
                created_at: Utc.with_ymd_and_hms(2020, 5, 17, 9, 3, 59).unwrap(),
                author: "ferris".into(),
                text: "hello".into(),
            },
        );
        assert_eq!(
            post.to_row(),
            [
                "42".to_string(),
                "#Rust".to_string(),
                "2020-05-17 09:03".to_string(),
                "ferris".to_string(),
                "hello".to_string(),
            ]
        );
    }
}
