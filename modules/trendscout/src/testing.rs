// Test doubles for the collection pipeline.
//
// - MockSource (TrendSource): builder-configured region directory, per-region
//   trends and per-hashtag search results, with scripted throttling/failures
//   and call counters.
// - MemoryStore (RunStore): records what a run would have written.
//
// Plus helpers for building SearchHits.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use trendscout_common::{HashtagSet, Post, Region, RegionId, SearchHit, TrendingTopic};

use crate::store::{RunMeta, RunStore};
use crate::traits::{FetchError, FetchResult, Page, PageCursor, SearchQuery, TrendSource};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Fixed timestamp every test hit is created at.
pub fn test_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 6, 1, 12, 30, 0)
        .single()
        .unwrap_or_default()
}

pub fn hit(id: &str, author: &str, text: &str) -> SearchHit {
    SearchHit {
        id: id.to_string(),
        created_at: test_time(),
        author: author.to_string(),
        text: text.to_string(),
    }
}

/// `n` hits with ids `{prefix}-0 .. {prefix}-{n-1}`.
pub fn hits(prefix: &str, n: usize) -> Vec<SearchHit> {
    (0..n)
        .map(|i| hit(&format!("{prefix}-{i}"), "author", &format!("post {i} for {prefix}")))
        .collect()
}

// ---------------------------------------------------------------------------
// MockSource
// ---------------------------------------------------------------------------

/// In-memory TrendSource. Unregistered regions and hashtags answer with `Failed`.
pub struct MockSource {
    regions: Option<Vec<Region>>,
    trends: HashMap<RegionId, Vec<TrendingTopic>>,
    failing_trends: HashSet<RegionId>,
    trend_throttles: Mutex<HashMap<RegionId, u32>>,
    trend_calls: Mutex<HashMap<RegionId, u32>>,
    posts: HashMap<String, Vec<SearchHit>>,
    /// Hashtag -> first page index that fails.
    failing_searches: HashMap<String, usize>,
    search_throttles: Mutex<HashMap<String, u32>>,
    search_calls: Mutex<HashMap<String, u32>>,
    last_queries: Mutex<HashMap<String, SearchQuery>>,
    page_size: Option<usize>,
}

impl Default for MockSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSource {
    pub fn new() -> Self {
        Self {
            regions: Some(Vec::new()),
            trends: HashMap::new(),
            failing_trends: HashSet::new(),
            trend_throttles: Mutex::new(HashMap::new()),
            trend_calls: Mutex::new(HashMap::new()),
            posts: HashMap::new(),
            failing_searches: HashMap::new(),
            search_throttles: Mutex::new(HashMap::new()),
            search_calls: Mutex::new(HashMap::new()),
            last_queries: Mutex::new(HashMap::new()),
            page_size: None,
        }
    }

    pub fn on_region(mut self, name: &str, id: i64) -> Self {
        self.regions
            .get_or_insert_with(Vec::new)
            .push(Region::new(name, id));
        self
    }

    /// Make the region directory fetch fail.
    pub fn fail_regions(mut self) -> Self {
        self.regions = None;
        self
    }

    pub fn on_trends(mut self, region: i64, names: &[&str]) -> Self {
        self.trends.insert(
            RegionId(region),
            names.iter().map(|n| TrendingTopic::new(*n)).collect(),
        );
        self
    }

    /// Answer the next `times` trend calls for `region` with `RateLimited`.
    pub fn rate_limit_trends(self, region: i64, times: u32) -> Self {
        lock(&self.trend_throttles).insert(RegionId(region), times);
        self
    }

    pub fn fail_trends(mut self, region: i64) -> Self {
        self.failing_trends.insert(RegionId(region));
        self
    }

    pub fn on_posts(mut self, hashtag: &str, hits: Vec<SearchHit>) -> Self {
        self.posts.insert(hashtag.to_string(), hits);
        self
    }

    pub fn fail_search(self, hashtag: &str) -> Self {
        self.fail_search_from_page(hashtag, 0)
    }

    /// Serve pages before `page` normally, fail from `page` on.
    pub fn fail_search_from_page(mut self, hashtag: &str, page: usize) -> Self {
        self.failing_searches.insert(hashtag.to_string(), page);
        self
    }

    /// Answer the next `times` search calls for `hashtag` with `RateLimited`.
    pub fn rate_limit_search(self, hashtag: &str, times: u32) -> Self {
        lock(&self.search_throttles).insert(hashtag.to_string(), times);
        self
    }

    /// Serve at most `size` hits per page regardless of the requested page size.
    pub fn with_page_size(mut self, size: usize) -> Self {
        self.page_size = Some(size.max(1));
        self
    }

    pub fn trend_calls(&self, region: RegionId) -> u32 {
        lock(&self.trend_calls).get(&region).copied().unwrap_or(0)
    }

    pub fn search_calls(&self, hashtag: &str) -> u32 {
        lock(&self.search_calls).get(hashtag).copied().unwrap_or(0)
    }

    pub fn last_query(&self, hashtag: &str) -> Option<SearchQuery> {
        lock(&self.last_queries).get(hashtag).cloned()
    }
}

/// Consume one scripted throttle for `key`, if any are left.
fn take_throttle<K: std::hash::Hash + Eq>(throttles: &Mutex<HashMap<K, u32>>, key: &K) -> bool {
    let mut throttles = lock(throttles);
    match throttles.get_mut(key) {
        Some(remaining) if *remaining > 0 => {
            *remaining -= 1;
            true
        }
        _ => false,
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl TrendSource for MockSource {
    async fn regions(&self) -> FetchResult<Vec<Region>> {
        self.regions
            .clone()
            .ok_or_else(|| FetchError::Failed("MockSource: region directory unavailable".into()))
    }

    async fn trends(&self, region: RegionId) -> FetchResult<Vec<TrendingTopic>> {
        *lock(&self.trend_calls).entry(region).or_insert(0) += 1;

        if take_throttle(&self.trend_throttles, &region) {
            return Err(FetchError::RateLimited { reset_at: None });
        }
        if self.failing_trends.contains(&region) {
            return Err(FetchError::Failed(format!("MockSource: trends failed for {region}")));
        }
        self.trends
            .get(&region)
            .cloned()
            .ok_or_else(|| FetchError::Failed(format!("MockSource: no trends registered for {region}")))
    }

    async fn search_popular(
        &self,
        query: &SearchQuery,
        cursor: Option<PageCursor>,
    ) -> FetchResult<Page<SearchHit>> {
        let hashtag = query.hashtag.as_str();
        *lock(&self.search_calls).entry(hashtag.to_string()).or_insert(0) += 1;
        lock(&self.last_queries).insert(hashtag.to_string(), query.clone());

        if take_throttle(&self.search_throttles, &hashtag.to_string()) {
            return Err(FetchError::RateLimited { reset_at: None });
        }

        let all = self
            .posts
            .get(hashtag)
            .ok_or_else(|| FetchError::Failed(format!("MockSource: no posts registered for {hashtag}")))?;

        let size = self
            .page_size
            .unwrap_or(usize::MAX)
            .min(query.page_size as usize)
            .max(1);
        let offset: usize = match cursor {
            Some(c) => c
                .parse()
                .map_err(|_| FetchError::Failed(format!("MockSource: bad cursor {c}")))?,
            None => 0,
        };

        if let Some(&fail_from) = self.failing_searches.get(hashtag) {
            if offset / size >= fail_from {
                return Err(FetchError::Failed(format!("MockSource: search failed for {hashtag}")));
            }
        }

        let end = (offset + size).min(all.len());
        let items = all.get(offset..end).map(<[_]>::to_vec).unwrap_or_default();
        let next = (end < all.len()).then(|| end.to_string());
        Ok(Page { items, next })
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// Records hashtag writes and appended posts instead of touching the filesystem.
#[derive(Default)]
pub struct MemoryStore {
    hashtag_writes: Mutex<Vec<(RunMeta, HashtagSet)>>,
    posts: Mutex<Vec<Post>>,
    fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every write fails.
    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub fn hashtag_writes(&self) -> Vec<(RunMeta, HashtagSet)> {
        lock(&self.hashtag_writes).clone()
    }

    /// The most recent hashtag file contents.
    pub fn hashtags(&self) -> HashtagSet {
        lock(&self.hashtag_writes)
            .last()
            .map(|(_, set)| set.clone())
            .unwrap_or_default()
    }

    pub fn posts(&self) -> Vec<Post> {
        lock(&self.posts).clone()
    }

    pub fn posts_for(&self, hashtag: &str) -> Vec<Post> {
        lock(&self.posts)
            .iter()
            .filter(|p| p.hashtag == hashtag)
            .cloned()
            .collect()
    }
}

impl RunStore for MemoryStore {
    fn write_hashtags(&self, run: &RunMeta, hashtags: &HashtagSet) -> Result<()> {
        if self.fail_writes {
            bail!("MemoryStore: hashtag write refused");
        }
        lock(&self.hashtag_writes).push((run.clone(), hashtags.clone()));
        Ok(())
    }

    fn append_posts(&self, _run: &RunMeta, posts: &[Post]) -> Result<()> {
        if self.fail_writes {
            bail!("MemoryStore: post append refused");
        }
        lock(&self.posts).extend_from_slice(posts);
        Ok(())
    }
}
