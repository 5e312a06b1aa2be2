//! 固定窗口限流
//!
//! 用 `Route::wrap` 挂在登录、注册、上传这类容易被刷的端点上。限流键优先
//! 用会话用户 ID，匿名请求退回客户端 IP。计数值带窗口起点时间戳，窗口
//! 过去后重新从 1 开始，超限返回 429 和 Retry-After。

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
    http::header::{CONTENT_TYPE, HeaderName, HeaderValue},
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use moka::future::Cache;
use once_cell::sync::Lazy;
use std::rc::Rc;
use std::time::Duration;
use tracing::warn;

use crate::models::{ApiResponse, ErrorCode};

/// 进程内共享的计数表，值是 (窗口内计数, 窗口起点秒)
///
/// 窗口语义完全由时间戳决定，缓存过期只负责回收闲置条目的内存。
static RATE_LIMIT_CACHE: Lazy<Cache<String, (u32, i64)>> = Lazy::new(|| {
    Cache::builder()
        .time_to_idle(Duration::from_secs(120))
        .max_capacity(100_000)
        .build()
});

#[derive(Clone, Copy)]
struct Quota {
    max_requests: u32,
    window_secs: u64,
}

/// 端点限流配置，通过预设构造
#[derive(Clone)]
pub struct RateLimit {
    quota: Quota,
    key_prefix: &'static str,
}

impl RateLimit {
    const fn preset(max_requests: u32, window_secs: u64, key_prefix: &'static str) -> Self {
        Self {
            quota: Quota {
                max_requests,
                window_secs,
            },
            key_prefix,
        }
    }

    /// 登录端点：每分钟 5 次
    pub fn login() -> Self {
        Self::preset(5, 60, "login")
    }

    /// 注册端点：每分钟 3 次
    pub fn register() -> Self {
        Self::preset(3, 60, "register")
    }

    /// 带文件上传的创建端点：每分钟 10 次
    pub fn file_upload() -> Self {
        Self::preset(10, 60, "upload")
    }
}

/// 固定窗口推进：计入一次请求后的 (计数, 窗口起点)
///
/// 上一个窗口已经过去（或时钟回拨）时从 1 重新计数。
fn advance_window(previous: Option<(u32, i64)>, now: i64, window_secs: u64) -> (u32, i64) {
    match previous {
        Some((count, start)) if now >= start && now - start < window_secs as i64 => {
            (count.saturating_add(1), start)
        }
        _ => (1, now),
    }
}

fn is_valid_ip(ip: &str) -> bool {
    ip.parse::<std::net::IpAddr>().is_ok()
}

/// 取客户端 IP。连接信息优先，其次是代理转发头，伪造的非法值直接忽略。
/// 服务暴露在不可信网络时转发头可被伪造，部署时应由反向代理覆写。
fn client_ip(req: &ServiceRequest) -> String {
    let conn = req.connection_info();
    let direct = conn.realip_remote_addr();

    if let Some(ip) = direct
        && is_valid_ip(ip)
    {
        return ip.to_string();
    }

    // X-Forwarded-For 取列表第一项（最接近客户端），X-Real-IP 是单值
    for header in ["x-forwarded-for", "x-real-ip"] {
        let Some(value) = req.headers().get(header).and_then(|v| v.to_str().ok()) else {
            continue;
        };
        let candidate = value.split(',').next().unwrap_or("").trim();
        if is_valid_ip(candidate) {
            return candidate.to_string();
        }
    }

    direct.unwrap_or("unknown").to_string()
}

/// 已认证请求按用户限流，换 IP 也不能绕开
fn session_user_id(req: &ServiceRequest) -> Option<i64> {
    use crate::models::users::entities::User;
    req.extensions().get::<User>().map(|user| user.id)
}

fn limit_key(prefix: &str, req: &ServiceRequest) -> String {
    match session_user_id(req) {
        Some(id) => format!("{prefix}:user:{id}"),
        None => format!("{prefix}:ip:{}", client_ip(req)),
    }
}

fn limit_exceeded_response(retry_after: i64) -> HttpResponse {
    HttpResponse::build(StatusCode::TOO_MANY_REQUESTS)
        .insert_header((CONTENT_TYPE, "application/json; charset=utf-8"))
        .insert_header(("Retry-After", retry_after.to_string()))
        .insert_header(("X-RateLimit-Remaining", "0"))
        .json(ApiResponse::<()>::error_empty(
            ErrorCode::RateLimitExceeded,
            "Too many requests, please try again later",
        ))
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddleware {
            service: Rc::new(service),
            quota: self.quota,
            key_prefix: self.key_prefix,
        }))
    }
}

pub struct RateLimitMiddleware<S> {
    service: Rc<S>,
    quota: Quota,
    key_prefix: &'static str,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        let quota = self.quota;
        let key_prefix = self.key_prefix;

        Box::pin(async move {
            let cache_key = limit_key(key_prefix, &req);

            let now = chrono::Utc::now().timestamp();
            let previous = RATE_LIMIT_CACHE.get(&cache_key).await;
            let (count, window_start) = advance_window(previous, now, quota.window_secs);

            // 被拒绝的请求不写回，也就不会延长窗口
            if count > quota.max_requests {
                let retry_after = (quota.window_secs as i64 - (now - window_start)).max(1);
                warn!(
                    "Rate limit exceeded for {} ({}/{} in window)",
                    cache_key,
                    count - 1,
                    quota.max_requests
                );
                return Ok(
                    req.into_response(limit_exceeded_response(retry_after).map_into_right_body())
                );
            }

            RATE_LIMIT_CACHE
                .insert(cache_key, (count, window_start))
                .await;

            // 响应头带出剩余额度
            let remaining = quota.max_requests.saturating_sub(count);
            let mut res = srv.call(req).await?.map_into_left_body();
            let headers = res.headers_mut();
            headers.insert(
                HeaderName::from_static("x-ratelimit-limit"),
                HeaderValue::from(quota.max_requests),
            );
            headers.insert(
                HeaderName::from_static("x-ratelimit-remaining"),
                HeaderValue::from(remaining),
            );
            Ok(res)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_presets() {
        let login = RateLimit::login();
        assert_eq!(login.quota.max_requests, 5);
        assert_eq!(login.quota.window_secs, 60);
        assert_eq!(login.key_prefix, "login");

        let register = RateLimit::register();
        assert_eq!(register.quota.max_requests, 3);
        assert_eq!(register.key_prefix, "register");

        let upload = RateLimit::file_upload();
        assert_eq!(upload.quota.max_requests, 10);
        assert_eq!(upload.key_prefix, "upload");
    }

    #[test]
    fn test_advance_window_counts_within_window() {
        let (count, start) = advance_window(None, 1000, 60);
        assert_eq!((count, start), (1, 1000));

        let (count, start) = advance_window(Some((1, 1000)), 1030, 60);
        assert_eq!((count, start), (2, 1000));

        let (count, start) = advance_window(Some((2, 1000)), 1059, 60);
        assert_eq!((count, start), (3, 1000));
    }

    #[test]
    fn test_advance_window_resets_after_window() {
        let (count, start) = advance_window(Some((5, 1000)), 1060, 60);
        assert_eq!((count, start), (1, 1060));

        // 时钟回拨同样重开窗口
        let (count, start) = advance_window(Some((5, 2000)), 1000, 60);
        assert_eq!((count, start), (1, 1000));
    }

    #[test]
    fn test_ip_validation() {
        assert!(is_valid_ip("203.0.113.9"));
        assert!(is_valid_ip("::1"));
        assert!(!is_valid_ip("evil-header"));
        assert!(!is_valid_ip("203.0.113.9, 10.0.0.1"));
    }
}
