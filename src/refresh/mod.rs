mod aggregator;
mod bucket;
mod orchestrator;
mod pool;

pub use aggregator::SymbolAggregator;
pub use bucket::{bucket_key, should_refresh, BUCKET_SECS};
pub use orchestrator::{Clock, RefreshService};
pub use pool::{BoundedPool, TaskOutcome};
