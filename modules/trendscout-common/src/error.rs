use thiserror::Error;

/// Run-level failures. Anything reaching the caller as one of these aborts the run;
/// throttling and per-item failures are handled inside the pipeline and never show up here.
#[derive(Error, Debug)]
pub enum TrendScoutError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Region directory unavailable: {0}")]
    RegionDirectory(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
