use crate::analytics::DomainCount;
use crate::models::ShortRecord;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("short code already exists")]
    Conflict,
    /// The long URL was indexed by a concurrent insert that won the race
    #[error("long url already shortened as {code}")]
    DuplicateLongUrl { code: String },
}

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StorageStats {
    pub records: usize,
    pub long_urls: usize,
    pub domains: usize,
}

#[async_trait]
pub trait Storage: Send + Sync {
    /// Atomically insert a record under `code`, index its long URL and bump
    /// the counter of its domain. Nothing is written on conflict.
    async fn insert_if_absent(&self, code: &str, record: ShortRecord) -> StorageResult<()>;

    /// Get a record by short code, expired or not
    async fn get_by_code(&self, code: &str) -> Option<ShortRecord>;

    /// Reverse lookup used for deduplication
    async fn get_by_long_url(&self, long_url: &str) -> Option<String>;

    async fn code_exists(&self, code: &str) -> bool;

    /// Point-in-time copy of the per-domain submission counters
    async fn snapshot_domain_counts(&self) -> HashMap<String, u64>;

    /// Replace the leaderboard snapshot wholesale
    async fn publish_top_domains(&self, top: Vec<DomainCount>);

    async fn read_top_domains(&self) -> Vec<DomainCount>;

    async fn stats(&self) -> StorageStats;
}
