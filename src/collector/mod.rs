//! Remote-JVM introspection collector
//!
//! Everything scoped to polling one target: connection lifecycle, object
//! tree discovery, the adaptive fetch policy, value flattening, and the
//! per-target collection loop.

pub mod connection;
pub mod flatten;
pub mod framework;
pub mod policy;
pub mod tree;
pub mod worker;

pub use connection::{ConnectionManager, ConnectionSettings};
pub use framework::CollectorRuntime;
pub use policy::{AttributeAccessPolicy, FetchMode};
pub use tree::{ObjectTreeCache, RefreshPolicy};
pub use worker::{IterationStats, JmxCollector};
