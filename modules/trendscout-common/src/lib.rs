pub mod config;
pub mod error;
pub mod types;

pub use config::{Credentials, ScoutConfig};
pub use error::TrendScoutError;
pub use types::*;
