use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};

use crate::middlewares;
use crate::models::roles::entities::Role;
use crate::models::users::requests::UserListParams;
use crate::services::UserService;

static USER_SERVICE: UserService = UserService;

pub async fn list_users(
    req: HttpRequest,
    query: web::Query<UserListParams>,
) -> ActixResult<HttpResponse> {
    USER_SERVICE.list_users(query.into_inner(), &req).await
}

pub async fn create_user(
    req: HttpRequest,
    payload: actix_multipart::Multipart,
) -> ActixResult<HttpResponse> {
    USER_SERVICE.create_user(payload, &req).await
}

// 配置路由，用户管理仅限管理员
pub fn configure_user_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/users")
            .wrap(middlewares::RequireSession)
            .service(
                web::scope("")
                    .wrap(middlewares::RequireRole::new(Role::ADMIN))
                    .route("", web::get().to(list_users))
                    .route("", web::post().to(create_user)),
            ),
    );
}
