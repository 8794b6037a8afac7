//! Cache Module
//!
//! The typed cache client and its activity counters.

mod client;
mod stats;

// Re-export public types
pub use client::Cache;
pub use stats::CacheStats;
