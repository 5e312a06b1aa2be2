//! 会话管理
//!
//! 会话保存在对象缓存中，键为 `session:{token}`，值为用户 ID。
//! 登录成功后必须换发新 token，旧会话立即作废，防止会话固定攻击。

use std::sync::Arc;

use actix_web::cookie::time::Duration;
use actix_web::cookie::{Cookie, SameSite};
use uuid::Uuid;

use crate::cache::{CacheResult, ObjectCache};
use crate::config::AppConfig;

const SESSION_KEY_PREFIX: &str = "session:";

/// 一个已建立的会话
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user_id: i64,
}

/// 基于对象缓存的会话存储
pub struct SessionStore {
    cache: Arc<dyn ObjectCache>,
    ttl: u64,
}

impl SessionStore {
    pub fn new(cache: Arc<dyn ObjectCache>, ttl: u64) -> Self {
        Self { cache, ttl }
    }

    pub fn from_config(cache: Arc<dyn ObjectCache>) -> Self {
        Self::new(cache, AppConfig::get().session.ttl)
    }

    fn key(token: &str) -> String {
        format!("{SESSION_KEY_PREFIX}{token}")
    }

    /// 为用户建立新会话
    ///
    /// 传入旧 token 时先销毁旧会话再签发新 token。
    pub async fn establish(&self, user_id: i64, previous_token: Option<&str>) -> Session {
        if let Some(token) = previous_token {
            self.destroy(token).await;
        }

        let token = Uuid::new_v4().simple().to_string();
        self.cache
            .insert_raw(Self::key(&token), user_id.to_string(), self.ttl)
            .await;

        Session { token, user_id }
    }

    /// 换发会话 token，旧 token 作废
    ///
    /// 旧 token 无效时返回 None。
    pub async fn regenerate(&self, token: &str) -> Option<Session> {
        let user_id = self.resolve(token).await?;
        Some(self.establish(user_id, Some(token)).await)
    }

    /// 由 token 找到用户 ID
    pub async fn resolve(&self, token: &str) -> Option<i64> {
        match self.cache.get_raw(&Self::key(token)).await {
            CacheResult::Found(value) => value.parse::<i64>().ok(),
            CacheResult::NotFound | CacheResult::ExistsButNoValue => None,
        }
    }

    pub async fn destroy(&self, token: &str) {
        self.cache.remove(&Self::key(token)).await;
    }
}

/// 从请求 Cookie 中取出会话 token
pub fn extract_session_token(req: &actix_web::HttpRequest) -> Option<String> {
    req.cookie(&AppConfig::get().session.cookie_name)
        .map(|c| c.value().to_string())
}

/// 构造会话 Cookie
///
/// SameSite=Strict 加 HttpOnly，生产环境附加 Secure。
pub fn build_session_cookie(token: &str, secure: bool) -> Cookie<'static> {
    let config = AppConfig::get();
    Cookie::build(config.session.cookie_name.clone(), token.to_string())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(secure)
        .max_age(Duration::seconds(config.session.ttl as i64))
        .finish()
}

/// 构造使会话 Cookie 立即过期的删除 Cookie
pub fn build_removal_cookie() -> Cookie<'static> {
    let config = AppConfig::get();
    Cookie::build(config.session.cookie_name.clone(), "")
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .max_age(Duration::ZERO)
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use tokio::sync::RwLock;

    /// 不依赖全局配置的内存缓存，仅用于测试
    struct TestCache {
        inner: RwLock<HashMap<String, String>>,
    }

    impl TestCache {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                inner: RwLock::new(HashMap::new()),
            })
        }
    }

    #[async_trait]
    impl ObjectCache for TestCache {
        async fn get_raw(&self, key: &str) -> CacheResult<String> {
            match self.inner.read().await.get(key) {
                Some(value) => CacheResult::Found(value.clone()),
                None => CacheResult::NotFound,
            }
        }

        async fn insert_raw(&self, key: String, value: String, _ttl: u64) {
            self.inner.write().await.insert(key, value);
        }

        async fn remove(&self, key: &str) {
            self.inner.write().await.remove(key);
        }

        async fn invalidate_all(&self) {
            self.inner.write().await.clear();
        }
    }

    #[tokio::test]
    async fn test_establish_and_resolve() {
        let store = SessionStore::new(TestCache::new(), 3600);
        let session = store.establish(42, None).await;

        assert_eq!(session.user_id, 42);
        assert_eq!(session.token.len(), 32);
        assert_eq!(store.resolve(&session.token).await, Some(42));
        assert_eq!(store.resolve("unknown-token").await, None);
    }

    #[tokio::test]
    async fn test_establish_drops_previous_session() {
        let store = SessionStore::new(TestCache::new(), 3600);
        let old = store.establish(7, None).await;
        let new = store.establish(7, Some(&old.token)).await;

        assert_ne!(old.token, new.token);
        assert_eq!(store.resolve(&old.token).await, None);
        assert_eq!(store.resolve(&new.token).await, Some(7));
    }

    #[tokio::test]
    async fn test_regenerate_swaps_token_for_same_user() {
        let store = SessionStore::new(TestCache::new(), 3600);
        let original = store.establish(9, None).await;

        let regenerated = store.regenerate(&original.token).await.unwrap();
        assert_eq!(regenerated.user_id, 9);
        assert_ne!(regenerated.token, original.token);
        assert_eq!(store.resolve(&original.token).await, None);
        assert_eq!(store.resolve(&regenerated.token).await, Some(9));

        // 无效 token 不可换发
        assert!(store.regenerate(&original.token).await.is_none());
    }

    #[tokio::test]
    async fn test_destroy() {
        let store = SessionStore::new(TestCache::new(), 3600);
        let session = store.establish(1, None).await;
        store.destroy(&session.token).await;
        assert_eq!(store.resolve(&session.token).await, None);
    }
}
