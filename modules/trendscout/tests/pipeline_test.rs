//! End-to-end runs of the collection pipeline against MockSource.
//!
//! Each test: configure MockSource + MemoryStore (or CsvStore) → TrendScout::run → assert.
//! No network, no credentials.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use trendscout::pipeline::{PostCollector, RegionResolver, TrendCollector};
use trendscout::scout::TrendScout;
use trendscout::store::{CsvStore, RunMeta};
use trendscout::testing::{hits, MemoryStore, MockSource};
use trendscout_common::{HashtagSet, LanguageCode, Location, RegionId, ScoutConfig, TrendScoutError};

fn config(locations: &[&str], max_results: usize) -> ScoutConfig {
    ScoutConfig {
        locations: locations.iter().map(|l| Location::new(l)).collect(),
        max_results,
        ..ScoutConfig::default()
    }
}

fn set(tags: &[&str]) -> HashtagSet {
    tags.iter().map(|t| t.to_string()).collect()
}

// ---------------------------------------------------------------------------
// Component scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn atlantis_is_unresolved_london_resolves() {
    let source = MockSource::new().on_region("london", 100);

    let resolution = RegionResolver::new(&source)
        .resolve(&[Location::new("london"), Location::new("atlantis")])
        .await
        .unwrap();

    assert_eq!(resolution.regions, vec![RegionId(100)]);
    assert_eq!(resolution.unresolved, vec![Location::new("atlantis")]);
}

#[tokio::test]
async fn two_regions_merge_into_foo_and_baz() {
    let source = MockSource::new()
        .on_trends(1, &["#Foo", "Bar", "#Foo"])
        .on_trends(2, &["#Baz"]);

    let collection = TrendCollector::new(&source, Duration::from_secs(3605), 2)
        .collect(&[RegionId(1), RegionId(2)])
        .await;

    assert_eq!(collection.hashtags, set(&["#Foo", "#Baz"]));
    assert_eq!(collection.hashtags.len(), 2);
}

#[tokio::test]
async fn capped_batch_for_a_and_empty_batch_for_b() {
    let source = MockSource::new()
        .on_posts("#A", hits("a", 3))
        .fail_search("#B");
    let en: LanguageCode = "en".parse().unwrap();

    let collection = PostCollector::new(&source, 100, Duration::from_secs(900), 2)
        .collect(&set(&["#A", "#B"]), &en, 2)
        .await;

    assert_eq!(collection.batches.len(), 2);
    assert_eq!(collection.batches["#A"].len(), 2);
    assert!(collection.batches["#B"].is_empty());
}

// ---------------------------------------------------------------------------
// Full runs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn full_run_writes_hashtags_and_posts() {
    let source = MockSource::new()
        .on_region("London", 44418)
        .on_region("Dublin", 560743)
        .on_trends(44418, &["#Foo", "Bar", "#Shared"])
        .on_trends(560743, &["#Shared", "#Baz"])
        .on_posts("#Foo", hits("foo", 5))
        .on_posts("#Shared", hits("shared", 1))
        .fail_search("#Baz");
    let store = Arc::new(MemoryStore::new());
    let scout = TrendScout::new(
        Arc::new(source),
        store.clone(),
        config(&["london", "dublin", "atlantis"], 3),
    );

    let report = scout.run().await.unwrap();

    assert_eq!(store.hashtags(), set(&["#Foo", "#Shared", "#Baz"]));
    assert_eq!(store.hashtag_writes().len(), 1);
    assert_eq!(store.posts_for("#Foo").len(), 3);
    assert_eq!(store.posts_for("#Shared").len(), 1);
    assert!(store.posts_for("#Baz").is_empty());

    assert_eq!(report.unresolved, vec![Location::new("atlantis")]);
    assert_eq!(report.stats.locations_requested, 3);
    assert_eq!(report.stats.locations_resolved, 2);
    assert_eq!(report.stats.hashtags_found, 3);
    assert_eq!(report.stats.hashtags_failed, 1);
    assert_eq!(report.stats.posts_written, 4);
    assert_eq!(report.posts_per_hashtag["#Baz"], 0);
    assert_eq!(report.post_failures.len(), 1);
    assert_eq!(report.post_failures[0].item, "#Baz");
}

#[tokio::test]
async fn region_failure_shrinks_output_but_run_succeeds() {
    let source = MockSource::new()
        .on_region("london", 1)
        .on_region("paris", 2)
        .fail_trends(1)
        .on_trends(2, &["#Paris"])
        .on_posts("#Paris", hits("p", 2));
    let store = Arc::new(MemoryStore::new());
    let scout = TrendScout::new(Arc::new(source), store.clone(), config(&["london", "paris"], 10));

    let report = scout.run().await.unwrap();

    assert_eq!(report.stats.regions_failed, 1);
    assert_eq!(report.region_failures[0].item, "1");
    assert_eq!(store.hashtags(), set(&["#Paris"]));
    assert_eq!(store.posts().len(), 2);
}

#[tokio::test]
async fn no_resolvable_locations_is_an_empty_run() {
    let source = MockSource::new().on_region("london", 1);
    let store = Arc::new(MemoryStore::new());
    let scout = TrendScout::new(Arc::new(source), store.clone(), config(&["atlantis"], 10));

    let report = scout.run().await.unwrap();

    assert!(report.hashtags.is_empty());
    assert_eq!(store.hashtag_writes().len(), 1);
    assert!(store.hashtags().is_empty());
    assert!(store.posts().is_empty());
}

#[tokio::test]
async fn directory_failure_aborts_before_writing() {
    let store = Arc::new(MemoryStore::new());
    let scout = TrendScout::new(
        Arc::new(MockSource::new().fail_regions()),
        store.clone(),
        config(&["london"], 10),
    );

    let err = scout.run().await.unwrap_err();

    assert!(matches!(err, TrendScoutError::RegionDirectory(_)));
    assert!(store.hashtag_writes().is_empty());
}

#[tokio::test]
async fn store_failure_is_fatal() {
    let source = MockSource::new()
        .on_region("london", 1)
        .on_trends(1, &["#Tag"]);
    let scout = TrendScout::new(
        Arc::new(source),
        Arc::new(MemoryStore::failing()),
        config(&["london"], 10),
    );

    let err = scout.run().await.unwrap_err();

    assert!(matches!(err, TrendScoutError::Persistence(_)));
}

#[tokio::test(start_paused = true)]
async fn throttling_everywhere_still_completes() {
    let source = MockSource::new()
        .on_region("london", 1)
        .on_trends(1, &["#Slow"])
        .rate_limit_trends(1, 1)
        .on_posts("#Slow", hits("s", 2))
        .rate_limit_search("#Slow", 2);
    let store = Arc::new(MemoryStore::new());
    let scout = TrendScout::new(Arc::new(source), store.clone(), config(&["london"], 10));

    let report = scout.run().await.unwrap();

    assert!(report.region_failures.is_empty());
    assert!(report.post_failures.is_empty());
    assert_eq!(store.posts().len(), 2);
}

#[tokio::test]
async fn run_as_pins_the_date_partition() {
    let source = MockSource::new()
        .on_region("london", 1)
        .on_trends(1, &["#Dated"])
        .on_posts("#Dated", hits("d", 1));
    let store = Arc::new(MemoryStore::new());
    let scout = TrendScout::new(Arc::new(source), store.clone(), config(&["london"], 10));
    let run = RunMeta::on(NaiveDate::from_ymd_opt(2020, 12, 31).unwrap());

    let report = scout.run_as(run.clone()).await.unwrap();

    assert_eq!(report.run, run);
    assert_eq!(store.hashtag_writes()[0].0, run);
}

#[tokio::test]
async fn csv_output_matches_row_shape() {
    let tmp = tempfile::tempdir().unwrap();
    let source = MockSource::new()
        .on_region("london", 1)
        .on_trends(1, &["#Csv", "NotATag"])
        .on_posts("#Csv", hits("c", 2));
    let store = Arc::new(CsvStore::new(tmp.path().join("trending_tweets")));
    let scout = TrendScout::new(Arc::new(source), store.clone(), config(&["london"], 10));
    let run = RunMeta::on(NaiveDate::from_ymd_opt(2020, 6, 1).unwrap());

    scout.run_as(run.clone()).await.unwrap();
    // Second run on the same date appends posts and rewrites hashtags.
    scout.run_as(run.clone()).await.unwrap();

    let hashtags = std::fs::read_to_string(store.hashtags_path(&run)).unwrap();
    assert_eq!(hashtags, "#Csv");

    let posts = std::fs::read_to_string(store.posts_path(&run)).unwrap();
    let lines: Vec<&str> = posts.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], "c-0,#Csv,2020-06-01 12:30,author,post 0 for c");
}

#[tokio::test]
async fn run_without_posts_still_leaves_both_files() {
    let tmp = tempfile::tempdir().unwrap();
    let source = MockSource::new()
        .on_region("london", 1)
        .on_trends(1, &["#Quiet"])
        .on_posts("#Quiet", Vec::new());
    let store = Arc::new(CsvStore::new(tmp.path()));
    let scout = TrendScout::new(Arc::new(source), store.clone(), config(&["london"], 10));
    let run = RunMeta::on(NaiveDate::from_ymd_opt(2020, 6, 2).unwrap());

    let report = scout.run_as(run.clone()).await.unwrap();

    assert_eq!(report.stats.posts_written, 0);
    assert_eq!(std::fs::read_to_string(store.hashtags_path(&run)).unwrap(), "#Quiet");
    assert_eq!(std::fs::read_to_string(store.posts_path(&run)).unwrap(), "");
}
