use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use trendscout_common::{HashtagSet, Post};

use super::{RunMeta, RunStore};

/// Dated CSV files under one directory:
/// `<date>-hashtags.csv` (overwritten per run) and `<date>-tweets.csv` (appended).
pub struct CsvStore {
    dir: PathBuf,
}

impl CsvStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn hashtags_path(&self, run: &RunMeta) -> PathBuf {
        self.dir.join(format!("{}-hashtags.csv", run.date.format("%Y-%m-%d")))
    }

    pub fn posts_path(&self, run: &RunMeta) -> PathBuf {
        self.dir.join(format!("{}-tweets.csv", run.date.format("%Y-%m-%d")))
    }

    fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create output dir {}", self.dir.display()))
    }
}

impl RunStore for CsvStore {
    fn write_hashtags(&self, run: &RunMeta, hashtags: &HashtagSet) -> Result<()> {
        self.ensure_dir()?;
        let path = self.hashtags_path(run);
        let body = hashtags
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n");
        fs::write(&path, body).with_context(|| format!("Failed to write {}", path.display()))?;
        debug!(path = %path.display(), count = hashtags.len(), "Hashtags written");

        // The post file exists for every run, even one that finds no posts.
        let posts = self.posts_path(run);
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&posts)
            .with_context(|| format!("Failed to create {}", posts.display()))?;
        Ok(())
    }

    fn append_posts(&self, run: &RunMeta, posts: &[Post]) -> Result<()> {
        if posts.is_empty() {
            return Ok(());
        }
        self.ensure_dir()?;
        let path = self.posts_path(run);
        append_rows(&path, posts).with_context(|| format!("Failed to append to {}", path.display()))?;
        debug!(path = %path.display(), count = posts.len(), "Posts appended");
        Ok(())
    }
}

fn append_rows(path: &Path, posts: &[Post]) -> Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    for post in posts {
        writer.write_record(post.to_row())?;
    }
    writer.flush()?;
    Ok(())
}
