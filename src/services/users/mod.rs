pub mod create;
pub mod list;

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::models::users::requests::UserListParams;

/// 用户管理入口，管理员专用。
pub struct UserService;

impl UserService {
    // 获取用户列表
    pub async fn list_users(
        &self,
        query: UserListParams,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        list::list_users(query, request).await
    }

    // 管理员创建用户（multipart 表单，可带头像）
    pub async fn create_user(
        &self,
        payload: Multipart,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_user(payload, request).await
    }
}
