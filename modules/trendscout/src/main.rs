use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use trendscout::{schedule::start_schedule, scout::TrendScout, store::CsvStore};
use trendscout_common::{config::DEFAULT_LOCATIONS, Credentials, Location, ScoutConfig, TrendScoutError};
use twitter_client::TwitterClient;

#[derive(Parser)]
#[command(name = "trendscout", about = "Collect trending hashtags and their popular posts")]
struct Cli {
    /// JSON file holding API_KEY and API_SECRET
    #[arg(long, env = "TRENDSCOUT_CONFIG", default_value = "config.json")]
    config: PathBuf,

    /// Pre-issued app-only bearer token; skips the key/secret exchange when set
    #[arg(long, env = "TRENDSCOUT_BEARER_TOKEN", hide_env_values = true)]
    bearer_token: Option<String>,

    /// Comma separated location names
    #[arg(long, env = "TRENDSCOUT_LOCATIONS", default_value = DEFAULT_LOCATIONS)]
    locations: String,

    /// Two-letter ISO 639-1 language of the posts to collect
    #[arg(long, env = "TRENDSCOUT_LANG", default_value = "en")]
    lang: String,

    /// Maximum posts kept per hashtag
    #[arg(long, env = "TRENDSCOUT_MAX_RESULTS", default_value_t = 100)]
    max_results: usize,

    /// Posts requested per search page (max 100)
    #[arg(long, env = "TRENDSCOUT_PAGE_SIZE", default_value_t = 100)]
    page_size: u32,

    /// Regions/hashtags fetched concurrently
    #[arg(long, env = "TRENDSCOUT_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Wait after a throttled search page
    #[arg(long, env = "TRENDSCOUT_PAGINATION_COOLDOWN_SECS", default_value_t = 900)]
    pagination_cooldown_secs: u64,

    /// Wait after a region's hourly trend limit is hit
    #[arg(long, env = "TRENDSCOUT_TRENDS_COOLDOWN_SECS", default_value_t = 3605)]
    trends_cooldown_secs: u64,

    /// Directory the dated CSV files are written to
    #[arg(long, env = "TRENDSCOUT_OUTPUT_DIR", default_value = "trending_tweets")]
    output_dir: PathBuf,

    /// Cron expression (UTC, seconds first, e.g. "0 0 0 * * *"). Runs once when absent.
    #[arg(long, env = "TRENDSCOUT_SCHEDULE")]
    schedule: Option<String>,

    /// Emit logs as JSON
    #[arg(long, env = "TRENDSCOUT_JSON_LOGS")]
    json_logs: bool,
}

impl Cli {
    fn scout_config(&self) -> Result<ScoutConfig, TrendScoutError> {
        Ok(ScoutConfig {
            locations: Location::parse_list(&self.locations),
            language: self.lang.parse()?,
            max_results: self.max_results,
            page_size: self.page_size,
            concurrency: self.concurrency,
            pagination_cooldown: Duration::from_secs(self.pagination_cooldown_secs),
            trends_cooldown: Duration::from_secs(self.trends_cooldown_secs),
            output_dir: self.output_dir.clone(),
        }
        .normalized())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::from_default_env().add_directive("trendscout=info".parse()?);
    if cli.json_logs {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    info!("Trendscout starting...");

    // Load config
    let config = cli.scout_config()?;
    config.log_redacted();

    // Authenticate once; the client is shared read-only by every component
    let client = match cli.bearer_token.as_deref() {
        Some(token) => {
            info!("Using pre-issued bearer token");
            TwitterClient::with_bearer_token(token)
                .map_err(|e| TrendScoutError::Config(format!("http client setup failed: {e}")))?
        }
        None => {
            let credentials = Credentials::from_file(&cli.config)?;
            let client = TwitterClient::authenticate(&credentials.api_key, &credentials.api_secret)
                .await
                .map_err(|e| TrendScoutError::Config(format!("authentication failed: {e}")))?;
            info!("Authenticated with app-only bearer token");
            client
        }
    };

    let store = CsvStore::new(config.output_dir.clone());
    let scout = Arc::new(TrendScout::new(Arc::new(client), Arc::new(store), config));

    match cli.schedule.as_deref() {
        None => {
            let report = scout.run().await?;
            info!("{}", report.stats);
        }
        Some(cron) => {
            let mut scheduler = start_schedule(cron, scout).await?;
            tokio::signal::ctrl_c().await?;
            info!("Shutting down scheduler");
            scheduler.shutdown().await?;
        }
    }

    Ok(())
}
