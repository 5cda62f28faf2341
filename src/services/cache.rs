//! Two-tier cache for ranked candidate decks.
//!
//! Decks live in a process-local moka cache and, when configured, in Redis so
//! that every instance serves the same deck until a swipe invalidates it.

use moka::future::{Cache, CacheBuilder};
use redis::aio::ConnectionManager;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Cached value could not be encoded: {0}")]
    Encoding(#[from] serde_json::Error),
}

type SharedRedis = Arc<Mutex<ConnectionManager>>;

pub struct CacheManager {
    local: Cache<String, Vec<u8>>,
    redis: Option<SharedRedis>,
    ttl_secs: u64,
}

impl CacheManager {
    /// Connect to Redis and put a local tier in front of it
    pub async fn new(redis_url: &str, local_capacity: u64, ttl_secs: u64) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)?;
        let connection = ConnectionManager::new(client).await?;

        Ok(Self {
            local: Self::local_tier(local_capacity, ttl_secs),
            redis: Some(Arc::new(Mutex::new(connection))),
            ttl_secs,
        })
    }

    /// Cache without Redis; decks are private to this process
    pub fn local(local_capacity: u64, ttl_secs: u64) -> Self {
        Self {
            local: Self::local_tier(local_capacity, ttl_secs),
            redis: None,
            ttl_secs,
        }
    }

    fn local_tier(capacity: u64, ttl_secs: u64) -> Cache<String, Vec<u8>> {
        CacheBuilder::new(capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .support_invalidation_closures()
            .build()
    }

    pub fn has_redis(&self) -> bool {
        self.redis.is_some()
    }

    /// Look a key up locally, then in Redis. Redis hits are copied into the
    /// local tier. `Ok(None)` is a miss on both tiers.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        if let Some(bytes) = self.local.get(key).await {
            tracing::trace!("local cache hit: {}", key);
            return Ok(Some(serde_json::from_slice(&bytes)?));
        }

        let Some(redis) = &self.redis else {
            return Ok(None);
        };

        match Self::redis_get(redis, key).await? {
            Some(json) => {
                tracing::trace!("redis cache hit: {}", key);
                let value = serde_json::from_str(&json)?;
                self.local.insert(key.to_string(), json.into_bytes()).await;
                Ok(Some(value))
            }
            None => {
                tracing::trace!("cache miss: {}", key);
                Ok(None)
            }
        }
    }

    /// Write a value to both tiers with the configured TTL
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        let json = serde_json::to_string(value)?;
        self.local.insert(key.to_string(), json.clone().into_bytes()).await;

        if let Some(redis) = &self.redis {
            let mut conn = redis.lock().await;
            redis::cmd("SETEX")
                .arg(key)
                .arg(self.ttl_secs)
                .arg(json)
                .query_async::<()>(&mut *conn)
                .await?;
        }

        Ok(())
    }

    /// Drop every entry whose key starts with `prefix`
    pub async fn invalidate_prefix(&self, prefix: &str) -> Result<(), CacheError> {
        let owned = prefix.to_string();
        if let Err(e) = self
            .local
            .invalidate_entries_if(move |key, _| key.starts_with(&owned))
        {
            tracing::warn!("local prefix invalidation unavailable, flushing: {}", e);
            self.local.invalidate_all();
        }

        if let Some(redis) = &self.redis {
            let removed = Self::redis_delete_matching(redis, &format!("{}*", prefix)).await?;
            tracing::debug!("removed {} redis entries under {}", removed, prefix);
        }

        Ok(())
    }

    async fn redis_get(redis: &SharedRedis, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = redis.lock().await;
        let value = redis::cmd("GET").arg(key).query_async(&mut *conn).await?;
        Ok(value)
    }

    async fn redis_delete_matching(redis: &SharedRedis, pattern: &str) -> Result<usize, CacheError> {
        let mut conn = redis.lock().await;
        let keys: Vec<String> = redis::cmd("KEYS").arg(pattern).query_async(&mut *conn).await?;
        if keys.is_empty() {
            return Ok(0);
        }

        let count = keys.len();
        redis::cmd("DEL").arg(keys).query_async::<()>(&mut *conn).await?;
        Ok(count)
    }
}

/// Key layout for cached decks: `candidates:{pet_id}:{limit}`
pub struct CacheKey;

impl CacheKey {
    pub fn candidates(pet_id: &str, limit: usize) -> String {
        format!("{}{}", Self::candidates_prefix(pet_id), limit)
    }

    /// Shared by every deck size of one pet, so a swipe clears them all
    pub fn candidates_prefix(pet_id: &str) -> String {
        format!("candidates:{}:", pet_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore = "Requires Redis"]
    async fn test_redis_round_trip() {
        let cache = CacheManager::new("redis://127.0.0.1:6379", 100, 60)
            .await
            .expect("Failed to connect to Redis");

        let key = CacheKey::candidates("redis-pet", 5);
        cache.set(&key, &vec!["luna".to_string()]).await.unwrap();
        cache.local.invalidate_all();

        let deck: Option<Vec<String>> = cache.get(&key).await.unwrap();
        assert_eq!(deck, Some(vec!["luna".to_string()]));
    }

    #[tokio::test]
    async fn test_local_miss_is_none() {
        let cache = CacheManager::local(10, 60);
        let deck: Option<Vec<String>> = cache.get("candidates:nobody:10").await.unwrap();
        assert!(deck.is_none());
    }

    #[tokio::test]
    async fn test_swipe_prefix_clears_only_that_pet() {
        let cache = CacheManager::local(100, 60);
        assert!(!cache.has_redis());

        cache.set(&CacheKey::candidates("p1", 10), &vec![1, 2]).await.unwrap();
        cache.set(&CacheKey::candidates("p1", 20), &vec![3]).await.unwrap();
        cache.set(&CacheKey::candidates("p10", 10), &vec![4]).await.unwrap();

        cache.invalidate_prefix(&CacheKey::candidates_prefix("p1")).await.unwrap();
        cache.local.run_pending_tasks().await;

        assert_eq!(cache.get::<Vec<i32>>(&CacheKey::candidates("p1", 10)).await.unwrap(), None);
        assert_eq!(cache.get::<Vec<i32>>(&CacheKey::candidates("p1", 20)).await.unwrap(), None);
        assert_eq!(
            cache.get::<Vec<i32>>(&CacheKey::candidates("p10", 10)).await.unwrap(),
            Some(vec![4])
        );
    }

    #[test]
    fn test_key_layout() {
        assert_eq!(CacheKey::candidates("pet123", 10), "candidates:pet123:10");
        assert_eq!(CacheKey::candidates_prefix("pet123"), "candidates:pet123:");
    }
}
