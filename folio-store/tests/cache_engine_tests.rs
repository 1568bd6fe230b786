//! Integration tests for the cache engine
//!
//! These tests verify the engine's externally observable contract:
//! - Hit/miss accounting and rate invariants
//! - Memory budget enforcement through eviction
//! - Counter-reset scoping of clear
//! - Behavior under concurrent access

use folio_store::cache::{CacheConfig, ResultCache};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_embedding_scenario() {
    let cache = ResultCache::new(CacheConfig::default());

    cache
        .put("embedding", "docA", "[0.1]".to_string(), 50)
        .await
        .unwrap();

    // First access hits
    assert!(cache.get("embedding", "docA").await.unwrap().is_some());
    let stats = cache.stats().await;
    assert_eq!(stats.hit_rate, 1.0);

    // Unknown key misses, rate halves
    assert!(cache.get("embedding", "docB").await.unwrap().is_none());
    let stats = cache.stats().await;
    assert_eq!(stats.hit_rate, 0.5);
    assert_eq!(stats.miss_rate, 0.5);
}

#[tokio::test]
async fn test_rates_sum_to_one_or_are_zero() {
    let cache = ResultCache::new(CacheConfig::default());

    // No accesses yet: both rates are zero
    let stats = cache.stats().await;
    assert_eq!(stats.hit_rate, 0.0);
    assert_eq!(stats.miss_rate, 0.0);

    cache.put("a", "k1", "v".to_string(), 1).await.unwrap();
    for i in 0..7 {
        let key = if i % 2 == 0 { "k1" } else { "absent" };
        cache.get("a", key).await.unwrap();
    }

    let stats = cache.stats().await;
    assert!(stats.hits + stats.misses > 0);
    assert!((stats.hit_rate + stats.miss_rate - 1.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_memory_budget_enforced_after_put() {
    let config = CacheConfig::builder().max_memory_bytes(1_000).build();
    let cache = ResultCache::new(config);

    for i in 0..50 {
        cache
            .put("preview", &format!("page-{}", i), "x".repeat(100), 100)
            .await
            .unwrap();

        let stats = cache.stats().await;
        assert!(
            stats.memory_usage <= 1_000,
            "memory {} exceeds budget after put {}",
            stats.memory_usage,
            i
        );
    }

    // Budget holds ten 100-byte entries
    assert_eq!(cache.len().await, 10);
}

#[tokio::test]
async fn test_eviction_spans_types() {
    let config = CacheConfig::builder().max_memory_bytes(300).build();
    let cache = ResultCache::new(config);

    cache.put("embedding", "a", "v".to_string(), 100).await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    cache.put("retrieval", "b", "v".to_string(), 100).await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    cache.put("preview", "c", "v".to_string(), 100).await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;

    // One global LRU: the oldest entry goes regardless of its type
    cache.put("retrieval", "d", "v".to_string(), 100).await.unwrap();

    assert!(!cache.contains_key("embedding", "a").await);
    assert!(cache.contains_key("retrieval", "b").await);
    assert!(cache.contains_key("preview", "c").await);
    assert!(cache.contains_key("retrieval", "d").await);
}

#[tokio::test]
async fn test_clear_all_then_fresh_stats() {
    let cache = ResultCache::new(CacheConfig::default());

    cache.put("a", "k", "v".to_string(), 10).await.unwrap();
    cache.get("a", "k").await.unwrap();
    cache.get("b", "nope").await.unwrap();

    cache.clear(None).await.unwrap();

    let stats = cache.stats().await;
    assert_eq!(stats.item_count, 0);
    assert_eq!(stats.hit_rate, 0.0);
    assert_eq!(stats.miss_rate, 0.0);
    assert!(stats.types.is_empty());
}

#[tokio::test]
async fn test_clear_type_leaves_other_types_alone() {
    let cache = ResultCache::new(CacheConfig::default());

    cache.put("embedding", "k", "v".to_string(), 10).await.unwrap();
    cache.put("retrieval", "k", "v".to_string(), 20).await.unwrap();
    cache.get("embedding", "k").await.unwrap();
    cache.get("retrieval", "k").await.unwrap();
    cache.get("retrieval", "gone").await.unwrap();

    cache.clear(Some("embedding")).await.unwrap();

    let stats = cache.stats().await;
    assert!(!stats.types.contains_key("embedding"));
    assert_eq!(stats.types["retrieval"].count, 1);
    assert_eq!(stats.types["retrieval"].hits, 1);
    assert_eq!(stats.types["retrieval"].misses, 1);
    assert_eq!(stats.memory_usage, 20);

    // Global counters now reflect only the surviving type
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
}

#[tokio::test]
async fn test_concurrent_accesses_lose_no_counts() {
    let cache = Arc::new(ResultCache::new(CacheConfig::default()));
    cache.put("a", "hot", "v".to_string(), 1).await.unwrap();

    let mut handles = Vec::new();
    for task in 0..8 {
        let cache = cache.clone();
        handles.push(tokio::spawn(async move {
            for i in 0..50 {
                // Half the accesses hit, half miss
                let key = if (task + i) % 2 == 0 { "hot" } else { "cold" };
                cache.get("a", key).await.unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let stats = cache.stats().await;
    assert_eq!(stats.hits + stats.misses, 400);
    assert_eq!(stats.hits, 200);
    assert_eq!(stats.misses, 200);
}

#[tokio::test]
async fn test_concurrent_puts_same_key_last_write_wins() {
    let cache = Arc::new(ResultCache::new(CacheConfig::default()));

    let mut handles = Vec::new();
    for task in 0..8 {
        let cache = cache.clone();
        handles.push(tokio::spawn(async move {
            cache
                .put("a", "shared", format!("writer-{}", task), 10)
                .await
                .unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    // Exactly one entry survives with one writer's value and accounting
    let stats = cache.stats().await;
    assert_eq!(stats.item_count, 1);
    assert_eq!(stats.memory_usage, 10);

    let value = cache.get("a", "shared").await.unwrap().unwrap();
    assert!(value.starts_with("writer-"));
}
