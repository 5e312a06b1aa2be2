use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};

use crate::middlewares;
use crate::models::roles::entities::Role;
use crate::services::AssignmentService;
use crate::utils::SafeIDI64;

static ASSIGNMENT_SERVICE: AssignmentService = AssignmentService;

pub async fn create_assignment(
    req: HttpRequest,
    payload: actix_multipart::Multipart,
) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE.create_assignment(payload, &req).await
}

pub async fn view_assignment(req: HttpRequest, assignment_id: SafeIDI64) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE
        .view_assignment(assignment_id.0, &req)
        .await
}

// 配置路由
pub fn configure_assignment_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/assignments")
            .wrap(middlewares::RequireSession)
            .service(
                // 创建走多阶段表单，带 PDF 上传，所以单独限流
                web::resource("").route(
                    web::post()
                        .to(create_assignment)
                        .wrap(middlewares::RateLimit::file_upload())
                        .wrap(middlewares::RequireRole::new_any(&[
                            Role::ADMIN,
                            Role::INSTRUCTOR,
                        ])),
                ),
            )
            .route("/{id}", web::get().to(view_assignment)),
    );
}
