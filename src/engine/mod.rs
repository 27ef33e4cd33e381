//! Pooling core: keyed sub-pools, lifecycle dispatch and timers.

mod lifecycle;
mod registry;
mod release;
mod stats;
mod subpool;

pub use registry::ObjectPool;
pub use release::ReleaseId;
pub use stats::PoolStats;
