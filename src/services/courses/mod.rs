pub mod create;
pub mod list;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::models::courses::requests::{CourseListParams, CreateCourseRequest};

/// 课程入口，目前只有建课和下拉列表两个操作。
pub struct CourseService;

impl CourseService {
    // 创建课程
    pub async fn create_course(
        &self,
        course_data: CreateCourseRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_course(course_data, request).await
    }

    // 获取课程列表（建作业表单用）
    pub async fn list_courses(
        &self,
        query: CourseListParams,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        list::list_courses(query, request).await
    }
}
