use async_trait::async_trait;
use once_cell::sync::OnceCell;
use redis::{AsyncCommands, aio::MultiplexedConnection};
use tracing::{debug, error, warn};

use crate::cache::{CacheResult, ObjectCache};
use crate::config::AppConfig;
use crate::declare_object_cache_plugin;

declare_object_cache_plugin!("redis", RedisObjectCache);

pub struct RedisObjectCache {
    client: redis::Client,
    // 多路复用连接建一次反复 clone，避免每次操作都握手
    connection: OnceCell<MultiplexedConnection>,
    key_prefix: String,
    default_ttl: u64,
}

impl RedisObjectCache {
    pub fn new() -> Result<Self, String> {
        let config = AppConfig::get();
        let redis_config = &config.cache.redis;

        let client = redis::Client::open(redis_config.url.clone())
            .map_err(|e| format!("Invalid Redis URL '{}': {e}", redis_config.url))?;

        // 启动期用同步连接探活，失败时直接让上层走 moka 回退
        let mut conn = client
            .get_connection()
            .map_err(|e| format!("Redis connection failed: {e}"))?;
        let pong: String = redis::cmd("PING")
            .query(&mut conn)
            .map_err(|e| format!("Redis ping failed: {e}"))?;

        debug!(
            "RedisObjectCache ready (prefix: '{}', TTL: {}s, ping: {})",
            redis_config.key_prefix, config.cache.default_ttl, pong
        );

        Ok(Self {
            client,
            connection: OnceCell::new(),
            key_prefix: redis_config.key_prefix.clone(),
            default_ttl: config.cache.default_ttl,
        })
    }

    /// 取多路复用连接，失败时记日志并返回 None，调用方按未命中处理。
    async fn connection(&self) -> Option<MultiplexedConnection> {
        if let Some(conn) = self.connection.get() {
            return Some(conn.clone());
        }
        match self.client.get_multiplexed_async_connection().await {
            Ok(conn) => {
                // 并发初始化时多建的连接直接丢弃
                let _ = self.connection.set(conn.clone());
                Some(conn)
            }
            Err(e) => {
                error!("Redis connection unavailable: {e}");
                None
            }
        }
    }

    fn make_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

#[async_trait]
impl ObjectCache for RedisObjectCache {
    async fn get_raw(&self, key: &str) -> CacheResult<String> {
        let Some(mut conn) = self.connection().await else {
            return CacheResult::ExistsButNoValue;
        };

        match conn.get::<_, Option<String>>(self.make_key(key)).await {
            Ok(Some(value)) => CacheResult::Found(value),
            Ok(None) => CacheResult::NotFound,
            Err(e) => {
                error!("Redis GET '{key}' failed: {e}");
                CacheResult::ExistsButNoValue
            }
        }
    }

    async fn insert_raw(&self, key: String, value: String, ttl: u64) {
        let Some(mut conn) = self.connection().await else {
            return;
        };

        let effective_ttl = if ttl == 0 { self.default_ttl } else { ttl };
        if let Err(e) = conn
            .set_ex::<_, _, ()>(self.make_key(&key), value, effective_ttl)
            .await
        {
            error!("Redis SETEX '{key}' failed: {e}");
        }
    }

    async fn remove(&self, key: &str) {
        let Some(mut conn) = self.connection().await else {
            return;
        };

        if let Err(e) = conn.del::<_, i64>(self.make_key(key)).await {
            error!("Redis DEL '{key}' failed: {e}");
        }
    }

    async fn invalidate_all(&self) {
        // 按前缀批量删除需要 SCAN，会话和用户缓存都有 TTL 兜底，这里不做
        warn!("RedisObjectCache does not implement invalidate_all");
    }
}
