use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};

use crate::middlewares;
use crate::models::roles::entities::Role;
use crate::services::RoleService;

static ROLE_SERVICE: RoleService = RoleService;

pub async fn list_roles(request: HttpRequest) -> ActixResult<HttpResponse> {
    ROLE_SERVICE.list_roles(&request).await
}

// 配置路由，角色列表供管理员的添加用户表单使用
pub fn configure_role_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/roles")
            .wrap(middlewares::RequireSession)
            .service(
                web::scope("")
                    .wrap(middlewares::RequireRole::new(Role::ADMIN))
                    .route("", web::get().to(list_roles)),
            ),
    );
}
