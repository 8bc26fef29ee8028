//! Shortening service integration tests
//!
//! These tests drive the service, the memory store and the aggregator
//! together, covering deduplication, concurrent creation, expiry and the
//! top domains leaderboard.

use chrono::{Duration, Utc};
use shortener::analytics::{DomainCount, TopDomainsAggregator};
use shortener::config::{CodeConfig, LinkConfig, TopDomainsConfig};
use shortener::models::{RedirectTarget, ShortenRequest};
use shortener::shortener::{ResolveError, ShortenError, ShorteningService, ValidationError};
use shortener::storage::{MemoryStorage, Storage};
use std::collections::HashSet;
use std::sync::Arc;

/// Helper to create a service over fresh storage
fn create_test_service() -> (Arc<dyn Storage>, Arc<ShorteningService>) {
    let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
    let service = Arc::new(ShorteningService::new(
        Arc::clone(&storage),
        &LinkConfig::default(),
        CodeConfig::default(),
    ));
    (storage, service)
}

#[tokio::test]
async fn test_shorten_then_redirect() {
    let (_, service) = create_test_service();

    let response = service
        .shorten(ShortenRequest::new("https://example.com/path"))
        .await
        .unwrap();

    assert_eq!(response.code.len(), 6);
    assert!(response
        .code
        .bytes()
        .all(|b| b.is_ascii_digit() || b.is_ascii_uppercase()));

    let target = service.redirect(&response.code).await;
    assert_eq!(
        target,
        Some(RedirectTarget {
            long_url: "https://example.com/path".to_string(),
            domain: "http://localhost:8080".to_string(),
        })
    );
}

#[tokio::test]
async fn test_shorten_is_idempotent() {
    let (storage, service) = create_test_service();

    let first = service
        .shorten(ShortenRequest::new("https://example.com/path"))
        .await
        .unwrap();
    let second = service
        .shorten(ShortenRequest::new("https://example.com/path"))
        .await
        .unwrap();

    assert_eq!(first.code, second.code);
    assert_eq!(first.short_url, second.short_url);
    assert_eq!(first.created_at, second.created_at);
    assert_eq!(first.expiry_at, second.expiry_at);

    let stats = storage.stats().await;
    assert_eq!(stats.records, 1);
    assert_eq!(storage.snapshot_domain_counts().await["example.com"], 1);
}

#[tokio::test]
async fn test_invalid_urls_create_nothing() {
    let (storage, service) = create_test_service();

    let cases = [
        "not-a-url",
        "example.com/no-scheme",
        "https://",
        "mailto:someone",
        "http://localhost/admin",
    ];

    for input in cases {
        let result = service.shorten(ShortenRequest::new(input)).await;
        assert!(
            matches!(result, Err(ShortenError::Validation(_))),
            "{input} should be rejected, got {result:?}"
        );
    }

    assert_eq!(
        service
            .shorten(ShortenRequest::new("https://"))
            .await
            .unwrap_err(),
        ShortenError::Validation(ValidationError::MissingHost)
    );

    let stats = storage.stats().await;
    assert_eq!(stats.records, 0);
    assert_eq!(stats.long_urls, 0);
    assert!(storage.snapshot_domain_counts().await.is_empty());
}

#[tokio::test]
async fn test_expiry_is_seven_days() {
    let (_, service) = create_test_service();
    let now = Utc::now();

    let response = service
        .shorten_at(ShortenRequest::new("https://example.com/expiring"), now)
        .await
        .unwrap();

    assert_eq!(response.created_at, now);
    assert_eq!(response.expiry_at, now + Duration::days(7));

    let before = response.expiry_at - Duration::milliseconds(1);
    assert!(service.resolve_at(&response.code, before).await.is_ok());
    assert_eq!(
        service.resolve_at(&response.code, response.expiry_at).await,
        Err(ResolveError::Expired)
    );
    assert_eq!(
        service
            .resolve_at(&response.code, response.expiry_at + Duration::days(1))
            .await,
        Err(ResolveError::Expired)
    );
}

#[tokio::test]
async fn test_expired_link_keeps_its_code() {
    let (_, service) = create_test_service();
    let long_ago = Utc::now() - Duration::days(30);

    let original = service
        .shorten_at(ShortenRequest::new("https://example.com/old"), long_ago)
        .await
        .unwrap();
    assert!(service.redirect(&original.code).await.is_none());

    let again = service
        .shorten(ShortenRequest::new("https://example.com/old"))
        .await
        .unwrap();
    assert_eq!(again, original);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_distinct_urls() {
    let (storage, service) = create_test_service();
    let total = 200;

    let mut handles = vec![];
    for i in 0..total {
        let service = Arc::clone(&service);
        handles.push(tokio::spawn(async move {
            service
                .shorten(ShortenRequest::new(format!("https://site{}.com/page/{}", i % 7, i)))
                .await
                .unwrap()
        }));
    }

    let mut codes = HashSet::new();
    for handle in handles {
        codes.insert(handle.await.unwrap().code);
    }

    assert_eq!(codes.len(), total, "every url should get its own code");
    let stats = storage.stats().await;
    assert_eq!(stats.records, total);
    assert_eq!(stats.long_urls, total);

    let counted: u64 = storage.snapshot_domain_counts().await.values().sum();
    assert_eq!(counted, total as u64);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_same_url_converges() {
    let (storage, service) = create_test_service();

    let mut handles = vec![];
    for _ in 0..32 {
        let service = Arc::clone(&service);
        handles.push(tokio::spawn(async move {
            service
                .shorten(ShortenRequest::new("https://example.com/hot"))
                .await
                .unwrap()
        }));
    }

    let mut codes = HashSet::new();
    for handle in handles {
        codes.insert(handle.await.unwrap().code);
    }

    assert_eq!(codes.len(), 1, "all requests should observe the same code");
    assert_eq!(storage.stats().await.records, 1);
    assert_eq!(storage.snapshot_domain_counts().await["example.com"], 1);
}

#[tokio::test]
async fn test_top_domains_after_one_cycle() {
    let (storage, service) = create_test_service();

    let submissions = [
        ("a.com", 3),
        ("b.com", 2),
        ("c.com", 2),
        ("d.com", 1),
    ];
    for (domain, times) in submissions {
        for i in 0..times {
            service
                .shorten(ShortenRequest::new(format!("https://{domain}/{i}")))
                .await
                .unwrap();
        }
    }
    // Duplicates never count
    service
        .shorten(ShortenRequest::new("https://d.com/0"))
        .await
        .unwrap();

    assert!(service.top_domains().await.is_empty(), "nothing published yet");

    let aggregator = TopDomainsAggregator::new(Arc::clone(&storage), &TopDomainsConfig::default());
    aggregator.run_cycle().await;

    let top = service.top_domains().await;
    assert_eq!(top.len(), 3);
    assert_eq!(top[0], DomainCount::new("a.com", 3));
    let rest: HashSet<_> = top[1..].iter().map(|d| (d.domain.as_str(), d.count)).collect();
    assert_eq!(rest, HashSet::from([("b.com", 2), ("c.com", 2)]));
}

#[tokio::test]
async fn test_background_aggregator_publishes() {
    let (storage, service) = create_test_service();
    let config = TopDomainsConfig {
        limit: 3,
        interval_ms: 20,
    };
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let handle = TopDomainsAggregator::new(Arc::clone(&storage), &config).spawn(shutdown_rx);

    service
        .shorten(ShortenRequest::new("https://rust-lang.org/learn"))
        .await
        .unwrap();

    let mut published = Vec::new();
    for _ in 0..50 {
        tokio::time::sleep(tokio::time::Duration::from_millis(20)).await;
        published = service.top_domains().await;
        if !published.is_empty() {
            break;
        }
    }
    assert_eq!(published, vec![DomainCount::new("rust-lang.org", 1)]);

    shutdown_tx.send(true).unwrap();
    handle.await.unwrap();
}
