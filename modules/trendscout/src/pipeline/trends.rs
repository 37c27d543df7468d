use std::time::Duration;

use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use trendscout_common::{HashtagSet, ItemFailure, RegionId, TrendingTopic};

use crate::traits::{FetchError, FetchResult, TrendSource};

/// Hashtags merged across regions, plus the regions that contributed nothing
/// because their fetch failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrendCollection {
    pub hashtags: HashtagSet,
    pub failures: Vec<ItemFailure>,
}

/// Fetches trending topics per region and keeps the hashtag-shaped ones.
pub struct TrendCollector<'a> {
    source: &'a dyn TrendSource,
    cooldown: Duration,
    concurrency: usize,
}

impl<'a> TrendCollector<'a> {
    pub fn new(source: &'a dyn TrendSource, cooldown: Duration, concurrency: usize) -> Self {
        Self {
            source,
            cooldown,
            concurrency: concurrency.max(1),
        }
    }

    pub async fn collect(&self, regions: &[RegionId]) -> TrendCollection {
        let results: Vec<_> = stream::iter(regions.iter().copied())
            .map(|region| async move { (region, self.fetch_region(region).await) })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut collection = TrendCollection::default();
        for (region, result) in results {
            match result {
                Ok(topics) => {
                    let before = collection.hashtags.len();
                    collection.hashtags.extend(
                        topics
                            .into_iter()
                            .filter(TrendingTopic::is_hashtag)
                            .map(|topic| topic.name),
                    );
                    info!(
                        %region,
                        new_hashtags = collection.hashtags.len() - before,
                        "Region trends collected"
                    );
                }
                Err(e) => {
                    warn!(%region, error = %e, "Trend fetch failed, region skipped");
                    collection
                        .failures
                        .push(ItemFailure::new(region.to_string(), e.to_string()));
                }
            }
        }

        info!(
            regions = regions.len(),
            failed = collection.failures.len(),
            hashtags = collection.hashtags.len(),
            "Trending hashtags collected"
        );
        collection
    }

    /// One call, and one more after a cooldown if the hourly limit was hit.
    async fn fetch_region(&self, region: RegionId) -> FetchResult<Vec<TrendingTopic>> {
        match self.source.trends(region).await {
            Err(FetchError::RateLimited { reset_at }) => {
                warn!(
                    %region,
                    cooldown_secs = self.cooldown.as_secs(),
                    ?reset_at,
                    "Hourly trend limit exhausted, waiting before a single retry"
                );
                tokio::time::sleep(self.cooldown).await;
                self.source.trends(region).await
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockSource;

    const HOUR: Duration = Duration::from_secs(3605);

    fn set(tags: &[&str]) -> HashtagSet {
        tags.iter().map(|t| t.to_string()).collect()
    }

    #[tokio::test]
    async fn merges_and_deduplicates_across_regions() {
        let source = MockSource::new()
            .on_trends(1, &["#Foo", "Bar", "#Foo"])
            .on_trends(2, &["#Baz"]);

        let collection = TrendCollector::new(&source, HOUR, 4)
            .collect(&[RegionId(1), RegionId(2)])
            .await;

        assert_eq!(collection.hashtags, set(&["#Foo", "#Baz"]));
        assert!(collection.failures.is_empty());
    }

    #[tokio::test]
    async fn same_hashtag_from_two_regions_appears_once() {
        let source = MockSource::new()
            .on_trends(1, &["#Shared", "#OnlyOne"])
            .on_trends(2, &["#Shared"]);

        let collection = TrendCollector::new(&source, HOUR, 1)
            .collect(&[RegionId(1), RegionId(2)])
            .await;

        assert_eq!(collection.hashtags.iter().filter(|t| *t == "#Shared").count(), 1);
        assert_eq!(collection.hashtags.len(), 2);
    }

    #[tokio::test]
    async fn only_topics_starting_with_marker_are_kept() {
        let source = MockSource::new().on_trends(
            1,
            &["#Tag", "Plain", "Mid #Tag", " #Spaced", "##Double", "#"],
        );

        let collection = TrendCollector::new(&source, HOUR, 2)
            .collect(&[RegionId(1)])
            .await;

        assert_eq!(collection.hashtags, set(&["#Tag", "##Double", "#"]));
        for tag in &collection.hashtags {
            assert!(tag.starts_with('#'));
        }
    }

    #[tokio::test]
    async fn hashtags_are_case_sensitive() {
        let source = MockSource::new().on_trends(1, &["#rust", "#Rust"]);

        let collection = TrendCollector::new(&source, HOUR, 1)
            .collect(&[RegionId(1)])
            .await;

        assert_eq!(collection.hashtags.len(), 2);
    }

    #[tokio::test]
    async fn repeated_collection_yields_equal_sets() {
        let source = MockSource::new()
            .on_trends(1, &["#A", "#B", "C"])
            .on_trends(2, &["#B", "#D"])
            .on_trends(3, &["#E"]);
        let regions = [RegionId(3), RegionId(1), RegionId(2)];

        let first = TrendCollector::new(&source, HOUR, 3).collect(&regions).await;
        let second = TrendCollector::new(&source, HOUR, 1).collect(&regions).await;

        assert_eq!(first.hashtags, second.hashtags);
    }

    #[tokio::test]
    async fn no_hashtags_is_an_empty_set_not_an_error() {
        let source = MockSource::new().on_trends(1, &["Plain", "Words"]);

        let collection = TrendCollector::new(&source, HOUR, 1)
            .collect(&[RegionId(1)])
            .await;

        assert!(collection.hashtags.is_empty());
        assert!(collection.failures.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn hourly_limit_waits_once_then_retries() {
        let source = MockSource::new()
            .on_trends(1, &["#Late"])
            .rate_limit_trends(1, 1);
        let started = tokio::time::Instant::now();

        let collection = TrendCollector::new(&source, HOUR, 1)
            .collect(&[RegionId(1)])
            .await;

        let waited = started.elapsed();
        assert_eq!(collection.hashtags, set(&["#Late"]));
        assert_eq!(source.trend_calls(RegionId(1)), 2);
        assert!(waited >= HOUR && waited < HOUR * 2, "waited {waited:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn second_rate_limit_drops_only_that_region() {
        let source = MockSource::new()
            .on_trends(1, &["#Never"])
            .rate_limit_trends(1, 2)
            .on_trends(2, &["#Kept"]);

        let collection = TrendCollector::new(&source, HOUR, 2)
            .collect(&[RegionId(1), RegionId(2)])
            .await;

        assert_eq!(collection.hashtags, set(&["#Kept"]));
        assert_eq!(collection.failures.len(), 1);
        assert_eq!(collection.failures[0].item, "1");
        assert_eq!(source.trend_calls(RegionId(1)), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn plain_failure_is_not_retried() {
        let source = MockSource::new()
            .fail_trends(1)
            .on_trends(2, &["#Fine"]);
        let started = tokio::time::Instant::now();

        let collection = TrendCollector::new(&source, HOUR, 1)
            .collect(&[RegionId(1), RegionId(2)])
            .await;

        assert_eq!(collection.hashtags, set(&["#Fine"]));
        assert_eq!(collection.failures.len(), 1);
        assert_eq!(source.trend_calls(RegionId(1)), 1);
        assert!(started.elapsed() < HOUR);
    }
}
