use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::models::{
    ApiResponse, ErrorCode, FieldErrors,
    courses::{requests::CreateCourseRequest, responses::CourseResponse},
};
use crate::services::storage_from;

pub async fn create_course(
    course_data: CreateCourseRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = storage_from(request);

    if course_data.name.trim().is_empty() {
        let mut errors = FieldErrors::new();
        errors.add("name", "The name field is required.");
        return Ok(HttpResponse::UnprocessableEntity().json(ApiResponse::error(
            ErrorCode::ValidationFailed,
            errors,
            "The given data was invalid.",
        )));
    }

    match storage.create_course(course_data).await {
        Ok(course) => Ok(HttpResponse::Created().json(ApiResponse::success(
            CourseResponse { course },
            "Course created successfully",
        ))),
        Err(e) => {
            tracing::error!("Course creation failed: {}", e);
            Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::CourseCreationFailed,
                    "Course creation failed",
                )),
            )
        }
    }
}
