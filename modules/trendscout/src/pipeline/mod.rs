pub mod paginator;
pub mod posts;
pub mod regions;
pub mod stats;
pub mod trends;

pub use paginator::paginate;
pub use posts::{PostCollection, PostCollector};
pub use regions::{RegionResolution, RegionResolver};
pub use stats::RunStats;
pub use trends::{TrendCollection, TrendCollector};
