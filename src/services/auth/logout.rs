use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::models::ApiResponse;
use crate::services::cache_from;
use crate::utils::session::{SessionStore, build_removal_cookie, extract_session_token};

/// 处理用户登出
/// 销毁服务端会话，并通过 max_age=0 的 Cookie 让浏览器删除会话标识
pub async fn handle_logout(request: &HttpRequest) -> ActixResult<HttpResponse> {
    if let Some(token) = extract_session_token(request) {
        let cache = cache_from(request);
        SessionStore::from_config(cache).destroy(&token).await;
    }

    Ok(HttpResponse::Ok()
        .cookie(build_removal_cookie())
        .json(ApiResponse::<()>::success_empty("Logout successful")))
}
