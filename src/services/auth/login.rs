use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::config::AppConfig;
use crate::models::{
    ApiResponse, ErrorCode,
    auth::{LoginRequest, LoginResponse},
};
use crate::services::{cache_from, storage_from};
use crate::utils::password::verify_password;
use crate::utils::session::{SessionStore, build_session_cookie, extract_session_token};

// 未知邮箱与密码错误必须返回一字不差的同一条消息，避免账号探测
const LOGIN_FAILED_MESSAGE: &str = "Invalid login details";

pub async fn handle_login(
    login_request: LoginRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = storage_from(request);
    let config = AppConfig::get();

    // 1. 根据邮箱获取用户信息
    match storage.get_user_by_email(&login_request.email).await {
        Ok(Some(user)) => {
            // 2. 验证密码
            if verify_password(&login_request.password, &user.password_hash) {
                // 3. 更新最后登录时间，失败不阻断登录
                let _ = storage.update_last_login(user.id).await;

                // 4. 换发会话，请求带来的旧会话一律作废
                let cache = cache_from(request);
                let sessions = SessionStore::from_config(cache.clone());
                let previous = extract_session_token(request);
                let session = sessions.establish(user.id, previous.as_deref()).await;

                // 缓存里的用户信息已过期，清掉等中间件按需回填
                cache.remove(&format!("user:{}", user.id)).await;

                tracing::info!("User {} logged in successfully", user.username);

                let cookie = build_session_cookie(&session.token, config.is_production());
                let response = LoginResponse {
                    user,
                    redirect: "/home".to_string(),
                };

                Ok(HttpResponse::Ok()
                    .cookie(cookie)
                    .json(ApiResponse::success(response, "Login successful")))
            } else {
                Ok(HttpResponse::Unauthorized().json(ApiResponse::error_empty(
                    ErrorCode::AuthFailed,
                    LOGIN_FAILED_MESSAGE,
                )))
            }
        }
        Ok(None) => Ok(HttpResponse::Unauthorized().json(ApiResponse::error_empty(
            ErrorCode::AuthFailed,
            LOGIN_FAILED_MESSAGE,
        ))),
        Err(e) => {
            tracing::error!("Login query failed: {}", e);
            Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    "Login failed",
                )),
            )
        }
    }
}
