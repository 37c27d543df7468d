use std::collections::BTreeMap;
use std::time::Duration;

use futures::stream::{self, BoxStream, StreamExt};
use tracing::{info, warn};

use trendscout_common::{HashtagSet, ItemFailure, LanguageCode, Post, PostBatch};

use crate::pipeline::paginator::paginate;
use crate::traits::{FetchResult, SearchQuery, TrendSource};

/// Posts per hashtag. Every requested hashtag has an entry; failed ones map to
/// an empty batch and are also listed in `failures`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostCollection {
    pub batches: BTreeMap<String, PostBatch>,
    pub failures: Vec<ItemFailure>,
}

impl PostCollection {
    pub fn total_posts(&self) -> usize {
        self.batches.values().map(Vec::len).sum()
    }
}

/// Pulls popular posts for each hashtag through the rate-limited paginator.
pub struct PostCollector<'a> {
    source: &'a dyn TrendSource,
    page_size: u32,
    cooldown: Duration,
    concurrency: usize,
}

impl<'a> PostCollector<'a> {
    pub fn new(
        source: &'a dyn TrendSource,
        page_size: u32,
        cooldown: Duration,
        concurrency: usize,
    ) -> Self {
        Self {
            source,
            page_size: page_size.max(1),
            cooldown,
            concurrency: concurrency.max(1),
        }
    }

    /// Collect up to `max_results` posts for every hashtag. One hashtag failing
    /// never affects the others.
    pub async fn collect(
        &self,
        hashtags: &HashtagSet,
        language: &LanguageCode,
        max_results: usize,
    ) -> PostCollection {
        let mut collection = PostCollection::default();
        let mut outcomes = self.stream(hashtags, language, max_results);
        while let Some((hashtag, outcome)) = outcomes.next().await {
            match outcome {
                Ok(batch) => {
                    collection.batches.insert(hashtag, batch);
                }
                Err(failure) => {
                    collection.batches.insert(hashtag, Vec::new());
                    collection.failures.push(failure);
                }
            }
        }
        collection
    }

    /// Per-hashtag outcomes in completion order, at most `concurrency` in flight.
    pub fn stream<'b>(
        &'b self,
        hashtags: &'b HashtagSet,
        language: &'b LanguageCode,
        max_results: usize,
    ) -> BoxStream<'b, (String, Result<PostBatch, ItemFailure>)> {
        stream::iter(hashtags.iter().map(move |hashtag| async move {
            let outcome = match self.collect_one(hashtag, language, max_results).await {
                Ok(batch) => {
                    info!(hashtag = hashtag.as_str(), posts = batch.len(), "Posts collected");
                    Ok(batch)
                }
                Err(e) => {
                    warn!(hashtag = hashtag.as_str(), error = %e, "Post search failed, hashtag skipped");
                    Err(ItemFailure::new(hashtag.as_str(), e.to_string()))
                }
            };
            (hashtag.clone(), outcome)
        }))
        .buffer_unordered(self.concurrency)
        .boxed()
    }

    async fn collect_one(
        &self,
        hashtag: &str,
        language: &LanguageCode,
        max_results: usize,
    ) -> FetchResult<PostBatch> {
        let mut batch = PostBatch::new();
        if max_results == 0 {
            return Ok(batch);
        }

        let page_size = u32::try_from(max_results)
            .map_or(self.page_size, |cap| cap.min(self.page_size));
        let query = SearchQuery {
            hashtag: hashtag.to_string(),
            language: language.clone(),
            page_size,
        };
        let source = self.source;
        let mut pages = paginate(
            move |cursor| {
                let query = query.clone();
                async move { source.search_popular(&query, cursor).await }
            },
            self.cooldown,
        );

        // A failure part-way through discards what was gathered so far.
        while let Some(page) = pages.next().await {
            for hit in page? {
                batch.push(Post::from_hit(hashtag, hit));
                if batch.len() >= max_results {
                    return Ok(batch);
                }
            }
        }
        Ok(batch)
    }
}
