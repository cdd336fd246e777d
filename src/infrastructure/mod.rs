//! 基础设施层：持有周期回调和持久化这类资源，只暴露能力

pub mod elapsed_store;
pub mod tick_source;

pub use elapsed_store::{is_storable_attempt_id, AttemptEnding, ElapsedStore, FileElapsedStore, MemoryElapsedStore};
pub use tick_source::{LeaseId, Tick, TickLease, TickSource, TimerId, TokioTickSource, VirtualClock};
