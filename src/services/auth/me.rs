use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::middlewares::RequireSession;
use crate::models::{ApiResponse, ErrorCode, auth::UserInfoResponse};

/// 返回当前登录用户信息，用户由 RequireSession 中间件放入请求扩展
pub async fn handle_me(request: &HttpRequest) -> ActixResult<HttpResponse> {
    match RequireSession::extract_user(request) {
        Some(user) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            UserInfoResponse { user },
            "OK",
        ))),
        None => Ok(HttpResponse::Unauthorized().json(ApiResponse::error_empty(
            ErrorCode::Unauthorized,
            "Authentication required",
        ))),
    }
}
