use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur with cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Cache miss: {0}")]
    CacheMiss(String),
}

/// Two-tier read cache: moka in-process (L1) over Redis (L2).
///
/// The program catalog is the hot entry here: one key feeds every
/// qualification request until an ingest invalidates it. Values are stored
/// as JSON strings in both tiers so L2 hits can backfill L1 without a
/// re-serialize. ConnectionManager is cloned per command; it multiplexes
/// internally, so no locking is needed on this side.
pub struct CacheManager {
    redis: ConnectionManager,
    l1: moka::future::Cache<String, String>,
    ttl_secs: u64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheManager {
    /// Connect to Redis and build the L1 tier
    pub async fn new(redis_url: &str, l1_size: u64, ttl_secs: u64) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)?;
        let redis = ConnectionManager::new(client).await?;

        let l1 = moka::future::CacheBuilder::new(l1_size)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Ok(Self {
            redis,
            l1,
            ttl_secs,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        })
    }

    /// Read a value, consulting L1 before L2. An L2 hit repopulates L1.
    pub async fn get<T>(&self, key: &str) -> Result<T, CacheError>
    where
        T: for<'de> Deserialize<'de>,
    {
        if let Some(json) = self.l1.get(key).await {
            tracing::trace!("L1 cache hit: {}", key);
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(serde_json::from_str(&json)?);
        }

        let mut conn = self.redis.clone();
        let value: Option<String> = conn.get(key).await?;

        match value {
            Some(json) => {
                tracing::trace!("L2 cache hit: {}", key);
                self.hits.fetch_add(1, Ordering::Relaxed);
                self.l1.insert(key.to_string(), json.clone()).await;
                Ok(serde_json::from_str(&json)?)
            }
            None => {
                tracing::trace!("Cache miss: {}", key);
                self.misses.fetch_add(1, Ordering::Relaxed);
                Err(CacheError::CacheMiss(key.to_string()))
            }
        }
    }

    /// Write a value to both tiers. L2 carries an explicit TTL; L1 expires
    /// on its own configured time-to-live.
    pub async fn set<T>(&self, key: &str, value: &T) -> Result<(), CacheError>
    where
        T: Serialize,
    {
        let json = serde_json::to_string(value)?;

        self.l1.insert(key.to_string(), json.clone()).await;

        let mut conn = self.redis.clone();
        conn.set_ex::<_, _, ()>(key, json, self.ttl_secs).await?;

        tracing::trace!("Cache set: {}", key);
        Ok(())
    }

    /// Remove one key from both tiers
    pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.l1.invalidate(key).await;

        let mut conn = self.redis.clone();
        conn.del::<_, ()>(key).await?;

        Ok(())
    }

    /// Drop every entry matching a glob pattern.
    ///
    /// L1 has no pattern scan, so it is cleared wholesale; entries refill
    /// from L2 on the next read. Pattern invalidation only happens on
    /// ingest, so the KEYS scan is acceptable here.
    pub async fn invalidate_pattern(&self, pattern: &str) -> Result<(), CacheError> {
        self.l1.invalidate_all();

        let mut conn = self.redis.clone();
        let keys: Vec<String> = conn.keys(pattern).await?;

        if !keys.is_empty() {
            conn.del::<_, ()>(keys).await?;
        }

        tracing::debug!("Invalidated cache pattern: {}", pattern);
        Ok(())
    }

    /// Hit/miss counters since startup, across both tiers
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;

        CacheStats {
            l1_size: self.l1.entry_count(),
            hit_count: hits,
            miss_count: misses,
            hit_rate: if total > 0 {
                hits as f64 / total as f64
            } else {
                0.0
            },
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub l1_size: u64,
    pub hit_count: u64,
    pub miss_count: u64,
    pub hit_rate: f64,
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Build the cache key for the active program catalog
    pub fn active_programs() -> String {
        "programs:active".to_string()
    }

    /// Build a cache key for an academic profile
    pub fn profile(user_id: &str) -> String {
        format!("profile:{}", user_id)
    }

    /// Build a cache key for a program detail page
    pub fn program_detail(program_id: &str) -> String {
        format!("detail:{}", program_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore = "Requires Redis"]
    async fn test_cache_set_get() {
        let cache = CacheManager::new("redis://127.0.0.1:6379", 1000, 60)
            .await
            .expect("Failed to create cache");

        let key = "test_key";
        let value = "test_value";

        cache.set(key, &value).await.unwrap();
        let result: String = cache.get(key).await.unwrap();
        assert_eq!(result, value);

        cache.delete(key).await.unwrap();
        assert!(cache.get::<String>(key).await.is_err());
    }

    #[test]
    fn test_cache_key_builder() {
        assert_eq!(CacheKey::active_programs(), "programs:active");
        assert_eq!(CacheKey::profile("user123"), "profile:user123");
        assert_eq!(CacheKey::program_detail("prog9"), "detail:prog9");
    }
}
