pub mod list;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

/// 角色入口，角色集合固定，只读。
pub struct RoleService;

impl RoleService {
    // 获取角色列表（管理后台建用户表单用）
    pub async fn list_roles(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        list::list_roles(request).await
    }
}
