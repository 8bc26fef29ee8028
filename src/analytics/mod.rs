//! Top-domains leaderboard
//!
//! Counters are maintained by the store on every new record; this module
//! periodically ranks them and publishes the top entries as a snapshot that
//! readers fetch without touching the counters.

pub mod aggregator;
pub mod models;

pub use aggregator::{rank_domains, TopDomainsAggregator};
pub use models::DomainCount;
