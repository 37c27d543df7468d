// The platform seam. Everything the pipeline needs from the social platform
// goes through TrendSource, so collectors can be driven by MockSource in tests
// and by TwitterClient in production.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use trendscout_common::{LanguageCode, Region, RegionId, SearchHit, TrendingTopic};
use twitter_client::{SearchParams, TwitterClient, TwitterError};

// ---------------------------------------------------------------------------
// Call outcomes
// ---------------------------------------------------------------------------

/// Why a single platform call did not produce data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// Throttled. The caller should wait and try the same call again.
    #[error("rate limited")]
    RateLimited { reset_at: Option<DateTime<Utc>> },

    /// Anything else. Retrying the same call is not expected to help.
    #[error("request failed: {0}")]
    Failed(String),
}

impl FetchError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, FetchError::RateLimited { .. })
    }
}

impl From<TwitterError> for FetchError {
    fn from(err: TwitterError) -> Self {
        match err {
            TwitterError::RateLimited { reset_at } => FetchError::RateLimited { reset_at },
            other => FetchError::Failed(other.to_string()),
        }
    }
}

pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Opaque continuation token handed back by the source for the next page.
pub type PageCursor = String;

/// One page of results plus the cursor for the following page, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next: Option<PageCursor>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self { items, next: None }
    }
}

/// "Popular posts for this hashtag in this language".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub hashtag: String,
    pub language: LanguageCode,
    pub page_size: u32,
}

// ---------------------------------------------------------------------------
// TrendSource
// ---------------------------------------------------------------------------

#[async_trait]
pub trait TrendSource: Send + Sync {
    /// Directory of every region the platform has trend data for.
    async fn regions(&self) -> FetchResult<Vec<Region>>;

    /// Current trending topics for one region. Single shot, not paginated.
    async fn trends(&self, region: RegionId) -> FetchResult<Vec<TrendingTopic>>;

    /// One page of popular posts matching `query`. `cursor` is `None` for the first page.
    async fn search_popular(
        &self,
        query: &SearchQuery,
        cursor: Option<PageCursor>,
    ) -> FetchResult<Page<SearchHit>>;
}

#[async_trait]
impl TrendSource for TwitterClient {
    async fn regions(&self) -> FetchResult<Vec<Region>> {
        let locations = self.trends_available().await?;
        Ok(locations
            .into_iter()
            .map(|loc| Region::new(loc.name, loc.woeid))
            .collect())
    }

    async fn trends(&self, region: RegionId) -> FetchResult<Vec<TrendingTopic>> {
        let trends = self.trends_place(region.0).await?;
        Ok(trends
            .into_iter()
            .map(|t| TrendingTopic::new(t.name))
            .collect())
    }

    async fn search_popular(
        &self,
        query: &SearchQuery,
        cursor: Option<PageCursor>,
    ) -> FetchResult<Page<SearchHit>> {
        let params = SearchParams::popular(query.hashtag.as_str(), query.page_size)
            .lang(query.language.as_str())
            .max_id(cursor);
        let resp = self.search_tweets(&params).await?;

        let next = resp.search_metadata.next_max_id();
        let items = resp
            .statuses
            .into_iter()
            .map(|status| SearchHit {
                text: status.content().to_string(),
                id: status.id_str,
                created_at: status.created_at,
                author: status.user.screen_name,
            })
            .collect();

        Ok(Page { items, next })
    }
}
