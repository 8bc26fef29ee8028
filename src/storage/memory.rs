use crate::analytics::DomainCount;
use crate::models::ShortRecord;
use crate::storage::{Storage, StorageError, StorageResult, StorageStats};
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Code table and dedup index; always written together.
#[derive(Debug, Default)]
struct Tables {
    by_code: HashMap<String, ShortRecord>,
    by_long_url: HashMap<String, String>,
}

/// Memory-resident record store
///
/// Three independently synchronized structures:
/// - `tables`: one read-write lock over the code table and the long-URL index
/// - `domain_counts`: sharded counters, incremented inside the `tables`
///   write section so a record and its count appear together
/// - `top_domains`: the published leaderboard, replaced by swapping an `Arc`
#[derive(Debug, Default)]
pub struct MemoryStorage {
    tables: RwLock<Tables>,
    domain_counts: DashMap<String, u64>,
    top_domains: RwLock<Arc<Vec<DomainCount>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn insert_if_absent(&self, code: &str, record: ShortRecord) -> StorageResult<()> {
        let mut tables = self.tables.write().await;

        if tables.by_code.contains_key(code) {
            return Err(StorageError::Conflict);
        }
        if let Some(existing) = tables.by_long_url.get(&record.long_url) {
            return Err(StorageError::DuplicateLongUrl {
                code: existing.clone(),
            });
        }

        self.domain_counts
            .entry(record.domain.clone())
            .and_modify(|count| *count += 1)
            .or_insert(1);
        tables
            .by_long_url
            .insert(record.long_url.clone(), code.to_string());
        tables.by_code.insert(code.to_string(), record);

        Ok(())
    }

    async fn get_by_code(&self, code: &str) -> Option<ShortRecord> {
        self.tables.read().await.by_code.get(code).cloned()
    }

    async fn get_by_long_url(&self, long_url: &str) -> Option<String> {
        self.tables.read().await.by_long_url.get(long_url).cloned()
    }

    async fn code_exists(&self, code: &str) -> bool {
        self.tables.read().await.by_code.contains_key(code)
    }

    async fn snapshot_domain_counts(&self) -> HashMap<String, u64> {
        self.domain_counts
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }

    async fn publish_top_domains(&self, top: Vec<DomainCount>) {
        let next = Arc::new(top);
        *self.top_domains.write().await = next;
    }

    async fn read_top_domains(&self) -> Vec<DomainCount> {
        let current = Arc::clone(&*self.top_domains.read().await);
        current.as_ref().clone()
    }

    async fn stats(&self) -> StorageStats {
        let tables = self.tables.read().await;
        StorageStats {
            records: tables.by_code.len(),
            long_urls: tables.by_long_url.len(),
            domains: self.domain_counts.len(),
        }
    }
}
