//! Periodic top-domains aggregation
//!
//! A single background task owns the write side of the leaderboard. Each
//! cycle copies the per-domain counters out of the store, ranks them and
//! swaps the published snapshot, so foreground requests never wait on the
//! ranking work.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, info};

use crate::analytics::models::DomainCount;
use crate::config::TopDomainsConfig;
use crate::storage::Storage;

/// Rank domains by count, highest first. Ties fall back to the domain name
/// so consecutive cycles publish the same order for the same counts.
pub fn rank_domains(counts: HashMap<String, u64>, limit: usize) -> Vec<DomainCount> {
    let mut ranked: Vec<DomainCount> = counts
        .into_iter()
        .map(|(domain, count)| DomainCount { domain, count })
        .collect();

    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.domain.cmp(&b.domain)));
    ranked.truncate(limit);
    ranked
}

/// `tokio::time::interval` panics on a zero period
const MIN_INTERVAL: Duration = Duration::from_millis(1);

pub struct TopDomainsAggregator {
    storage: Arc<dyn Storage>,
    limit: usize,
    interval: Duration,
}

impl TopDomainsAggregator {
    pub fn new(storage: Arc<dyn Storage>, config: &TopDomainsConfig) -> Self {
        Self {
            storage,
            limit: config.limit,
            interval: config.interval().max(MIN_INTERVAL),
        }
    }

    /// Run one aggregation cycle and return the published snapshot
    pub async fn run_cycle(&self) -> Vec<DomainCount> {
        let counts = self.storage.snapshot_domain_counts().await;
        let tracked = counts.len();
        let top = rank_domains(counts, self.limit);

        debug!(tracked, published = top.len(), "Published top domains");
        self.storage.publish_top_domains(top.clone()).await;
        top
    }

    /// Spawn the aggregation loop. The first cycle runs immediately; the task
    /// exits once `shutdown` flips to `true` or its sender is dropped.
    pub fn spawn(self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = time::interval(self.interval);
            interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
            info!(
                interval_ms = self.interval.as_millis() as u64,
                limit = self.limit,
                "Top domains aggregator started"
            );

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        self.run_cycle().await;
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            info!("Top domains aggregator shutting down");
                            break;
                        }
                    }
                }
            }
        })
    }
}
