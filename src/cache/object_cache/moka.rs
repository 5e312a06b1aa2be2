use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::{Expiry, future::Cache};
use tracing::debug;

use crate::cache::{CacheResult, ObjectCache};
use crate::config::AppConfig;
use crate::declare_object_cache_plugin;

declare_object_cache_plugin!("moka", MokaCacheWrapper);

/// 条目级过期策略
///
/// 值里带着自己的 TTL，会话条目（session.ttl）和普通缓存条目
/// （cache.default_ttl）的存活时间因此可以不同。
struct PerEntryTtl;

impl Expiry<String, (String, u64)> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &(String, u64),
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(Duration::from_secs(value.1))
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &(String, u64),
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        // 覆盖写入按新值的 TTL 重新计时
        Some(Duration::from_secs(value.1))
    }
}

pub struct MokaCacheWrapper {
    inner: Cache<String, (String, u64)>,
    default_ttl: u64,
}

impl Default for MokaCacheWrapper {
    fn default() -> Self {
        Self::new().expect("MokaCacheWrapper 初始化失败，请检查配置")
    }
}

impl MokaCacheWrapper {
    pub fn new() -> Result<Self, String> {
        let config = AppConfig::get();
        let inner = Cache::builder()
            .max_capacity(config.cache.memory.max_capacity)
            .expire_after(PerEntryTtl)
            .build();

        debug!(
            "MokaCacheWrapper initialized (max capacity: {}, default TTL: {}s)",
            config.cache.memory.max_capacity, config.cache.default_ttl
        );
        Ok(Self {
            inner,
            default_ttl: config.cache.default_ttl,
        })
    }
}

#[async_trait]
impl ObjectCache for MokaCacheWrapper {
    async fn get_raw(&self, key: &str) -> CacheResult<String> {
        match self.inner.get(key).await {
            Some((value, _ttl)) => CacheResult::Found(value),
            None => CacheResult::NotFound,
        }
    }

    async fn insert_raw(&self, key: String, value: String, ttl: u64) {
        let effective_ttl = if ttl == 0 { self.default_ttl } else { ttl };
        self.inner.insert(key, (value, effective_ttl)).await;
    }

    async fn remove(&self, key: &str) {
        self.inner.invalidate(key).await;
    }

    async fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Expiry 策略单测不经过 AppConfig，直接构建 Cache
    fn build_cache() -> Cache<String, (String, u64)> {
        Cache::builder()
            .max_capacity(100)
            .expire_after(PerEntryTtl)
            .build()
    }

    #[tokio::test]
    async fn test_entries_keep_their_own_ttl() {
        let cache = build_cache();
        cache
            .insert("short".to_string(), ("a".to_string(), 1))
            .await;
        cache
            .insert("long".to_string(), ("b".to_string(), 3600))
            .await;

        tokio::time::sleep(Duration::from_millis(1100)).await;
        cache.run_pending_tasks().await;

        assert!(cache.get("short").await.is_none());
        assert_eq!(cache.get("long").await, Some(("b".to_string(), 3600)));
    }
}
