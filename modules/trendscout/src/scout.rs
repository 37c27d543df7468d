use std::collections::BTreeMap;
use std::sync::Arc;

use futures::StreamExt;
use tracing::{info, info_span, warn, Instrument};

use trendscout_common::{HashtagSet, ItemFailure, Location, ScoutConfig, TrendScoutError};

use crate::pipeline::{PostCollector, RegionResolver, RunStats, TrendCollector};
use crate::store::{RunMeta, RunStore};
use crate::traits::TrendSource;

/// Everything a finished run produced besides the files themselves.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run: RunMeta,
    pub stats: RunStats,
    pub unresolved: Vec<Location>,
    pub hashtags: HashtagSet,
    pub posts_per_hashtag: BTreeMap<String, usize>,
    pub region_failures: Vec<ItemFailure>,
    pub post_failures: Vec<ItemFailure>,
}

/// Runs one discovery-and-collect pass: locations -> regions -> hashtags -> posts.
///
/// The source is shared read-only; nothing is carried over between runs.
pub struct TrendScout {
    source: Arc<dyn TrendSource>,
    store: Arc<dyn RunStore>,
    config: ScoutConfig,
}

impl TrendScout {
    pub fn new(source: Arc<dyn TrendSource>, store: Arc<dyn RunStore>, config: ScoutConfig) -> Self {
        Self {
            source,
            store,
            config: config.normalized(),
        }
    }

    pub fn config(&self) -> &ScoutConfig {
        &self.config
    }

    pub async fn run(&self) -> Result<RunReport, TrendScoutError> {
        self.run_as(RunMeta::start()).await
    }

    /// Run under a caller-chosen identity (date partition and run id).
    pub async fn run_as(&self, run: RunMeta) -> Result<RunReport, TrendScoutError> {
        let span = info_span!("run", run_id = %run.run_id, date = %run.date);
        self.run_inner(run).instrument(span).await
    }

    async fn run_inner(&self, run: RunMeta) -> Result<RunReport, TrendScoutError> {
        let source = self.source.as_ref();
        let config = &self.config;
        let mut stats = RunStats {
            locations_requested: config.locations.len() as u32,
            ..RunStats::default()
        };
        info!(locations = config.locations.len(), lang = %config.language, "Trend run starting");

        // 1. Locations -> regions. The only step whose failure ends the run.
        let resolution = RegionResolver::new(source).resolve(&config.locations).await?;
        stats.locations_resolved = resolution.regions.len() as u32;

        // 2. Regions -> hashtags
        let trends = TrendCollector::new(source, config.trends_cooldown, config.concurrency)
            .collect(&resolution.regions)
            .await;
        stats.regions_failed = trends.failures.len() as u32;
        stats.hashtags_found = trends.hashtags.len() as u32;

        self.store
            .write_hashtags(&run, &trends.hashtags)
            .map_err(|e| TrendScoutError::Persistence(format!("{e:#}")))?;
        info!(count = trends.hashtags.len(), "Hashtags written");

        // 3. Hashtags -> posts, written as each hashtag completes
        let collector = PostCollector::new(
            source,
            config.page_size,
            config.pagination_cooldown,
            config.concurrency,
        );
        let mut posts_per_hashtag = BTreeMap::new();
        let mut post_failures = Vec::new();
        {
            let mut outcomes =
                collector.stream(&trends.hashtags, &config.language, config.max_results);
            while let Some((hashtag, outcome)) = outcomes.next().await {
                match outcome {
                    Ok(batch) => {
                        self.store
                            .append_posts(&run, &batch)
                            .map_err(|e| TrendScoutError::Persistence(format!("{e:#}")))?;
                        stats.posts_written += batch.len() as u32;
                        posts_per_hashtag.insert(hashtag, batch.len());
                    }
                    Err(failure) => {
                        posts_per_hashtag.insert(hashtag, 0);
                        post_failures.push(failure);
                    }
                }
            }
        }
        stats.hashtags_failed = post_failures.len() as u32;

        if !post_failures.is_empty() || !trends.failures.is_empty() {
            warn!(
                regions_failed = stats.regions_failed,
                hashtags_failed = stats.hashtags_failed,
                "Run finished with skipped items"
            );
        }
        info!(posts = stats.posts_written, "Posts written");

        Ok(RunReport {
            run,
            stats,
            unresolved: resolution.unresolved,
            hashtags: trends.hashtags,
            posts_per_hashtag,
            region_failures: trends.failures,
            post_failures,
        })
    }
}
