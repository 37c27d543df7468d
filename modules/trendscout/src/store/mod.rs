// Where a run's output goes. The pipeline only talks to RunStore; CsvStore is
// the production implementation, MemoryStore (testing) the in-memory one.

mod csv_store;

pub use csv_store::CsvStore;

use anyhow::Result;
use chrono::{Local, NaiveDate};
use uuid::Uuid;

use trendscout_common::{HashtagSet, Post};

/// Identity of one collection pass. The date is fixed when the run starts so
/// every file of a run lands in the same partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunMeta {
    pub run_id: Uuid,
    pub date: NaiveDate,
}

impl RunMeta {
    pub fn start() -> Self {
        Self::on(Local::now().date_naive())
    }

    pub fn on(date: NaiveDate) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            date,
        }
    }
}

pub trait RunStore: Send + Sync {
    /// Replace the run date's hashtag list.
    fn write_hashtags(&self, run: &RunMeta, hashtags: &HashtagSet) -> Result<()>;

    /// Add rows to the run date's post table.
    fn append_posts(&self, run: &RunMeta, posts: &[Post]) -> Result<()>;
}
