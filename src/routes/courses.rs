use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};

use crate::middlewares;
use crate::models::courses::requests::{CourseListParams, CreateCourseRequest};
use crate::models::roles::entities::Role;
use crate::services::CourseService;

static COURSE_SERVICE: CourseService = CourseService;

pub async fn list_courses(
    req: HttpRequest,
    query: web::Query<CourseListParams>,
) -> ActixResult<HttpResponse> {
    COURSE_SERVICE.list_courses(query.into_inner(), &req).await
}

pub async fn create_course(
    req: HttpRequest,
    course_data: web::Json<CreateCourseRequest>,
) -> ActixResult<HttpResponse> {
    COURSE_SERVICE
        .create_course(course_data.into_inner(), &req)
        .await
}

// 配置路由
pub fn configure_course_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/courses")
            .wrap(middlewares::RequireSession)
            .service(
                // 登录用户都能查课程列表（添加作业表单用），创建仅限管理员和教师
                web::resource("").route(web::get().to(list_courses)).route(
                    web::post()
                        .to(create_course)
                        .wrap(middlewares::RequireRole::new_any(&[
                            Role::ADMIN,
                            Role::INSTRUCTOR,
                        ])),
                ),
            ),
    );
}
