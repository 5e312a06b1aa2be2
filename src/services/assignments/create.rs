use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::error;

use crate::models::{
    ApiResponse, ErrorCode,
    assignments::{requests::NewAssignment, responses::CreateAssignmentResponse},
};
use crate::services::storage_from;
use crate::utils::file_store::FileStore;
use crate::utils::form::FormValidator;
use crate::utils::multipart::{FormReadError, read_form};

/// 创建作业
///
/// 流程固定为 校验 -> 写文件 -> 落库，前一步失败后一步不会发生。
pub async fn create_assignment(
    mut payload: Multipart,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = storage_from(request);
    let config = crate::config::AppConfig::get();

    // 1. 读取表单到内存
    let form = match read_form(&mut payload, config.upload.max_size).await {
        Ok(form) => form,
        Err(FormReadError::FileSizeExceeded { .. }) => {
            return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                ErrorCode::FileSizeExceeded,
                "File size exceeds the limit",
            )));
        }
        Err(FormReadError::Malformed(msg)) => {
            return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                ErrorCode::PayloadMalformed,
                format!("Invalid multipart payload: {msg}"),
            )));
        }
    };

    // 2. 逐字段校验
    let mut validator = FormValidator::new(&form);

    let name = validator.required_string("name");
    let description = validator.optional_string("description");

    let start_time = validator.required_datetime("start_time");
    let end_time = validator.required_datetime("end_time");
    let late_time = validator.required_datetime("late_time");

    check_time_order(&mut validator, start_time, end_time, late_time);

    let max_submissions = validator
        .required_positive_i64("max")
        .and_then(|value| match i32::try_from(value) {
            Ok(value) => Some(value),
            Err(_) => {
                validator.add_error("max", "The max must be a number.");
                None
            }
        });

    let grade = validator.required_positive_f64("grade");

    let course_id = validator.required_positive_i64("course_id");
    if let Some(course_id) = course_id {
        match storage.get_course_by_id(course_id).await {
            Ok(Some(_)) => {}
            Ok(None) => validator.add_error("course_id", "The selected course id is invalid."),
            Err(e) => {
                error!("Course lookup failed: {}", e);
                return Ok(internal_error());
            }
        }
    }

    let group_id = validator.optional_i64("group_id");
    if let Some(group_id) = group_id {
        match storage.get_group_by_id(group_id).await {
            Ok(Some(_)) => {}
            Ok(None) => validator.add_error("group_id", "The selected group id is invalid."),
            Err(e) => {
                error!("Group lookup failed: {}", e);
                return Ok(internal_error());
            }
        }
    }

    validator.optional_file("pdf", &[".pdf"], config.upload.max_size);

    if let Err(errors) = validator.finish() {
        return Ok(HttpResponse::UnprocessableEntity().json(ApiResponse::error(
            ErrorCode::ValidationFailed,
            errors,
            "The given data was invalid.",
        )));
    }

    // 校验全部通过后必填字段一定存在
    let (
        Some(name),
        Some(start_time),
        Some(end_time),
        Some(late_time),
        Some(max_submissions),
        Some(grade),
        Some(course_id),
    ) = (
        name,
        start_time,
        end_time,
        late_time,
        max_submissions,
        grade,
        course_id,
    )
    else {
        return Ok(internal_error());
    };

    // 3. PDF 落盘（校验已通过，这是第一个副作用）
    let file_store = FileStore::from_config();
    let pdf = match form.file("pdf") {
        Some(file) => match file_store.store(&name, file) {
            Ok(stored_name) => Some(stored_name),
            Err(e) => {
                error!("PDF store failed: {}", e);
                return Ok(
                    HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                        ErrorCode::FileUploadFailed,
                        "Failed to store uploaded PDF",
                    )),
                );
            }
        },
        None => None,
    };

    // 4. 落库，失败时清掉刚写入的文件避免孤儿
    let created = storage
        .create_assignment(NewAssignment {
            name,
            description,
            start_time,
            end_time,
            late_time,
            max_submissions,
            grade,
            course_id,
            group_id,
            pdf: pdf.clone(),
        })
        .await;

    match created {
        Ok(assignment) => {
            tracing::info!("Assignment {} created (ID: {})", assignment.name, assignment.id);
            let redirect = format!("/dashboard/assignments/{}/questions", assignment.id);
            Ok(HttpResponse::Created().json(ApiResponse::success(
                CreateAssignmentResponse {
                    assignment,
                    redirect,
                },
                "Assignment created successfully",
            )))
        }
        Err(e) => {
            error!("Assignment creation failed: {}", e);
            if let Some(stored_name) = &pdf {
                file_store.remove(stored_name);
            }
            Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::AssignmentCreationFailed,
                    "Assignment creation failed",
                )),
            )
        }
    }
}

/// 时间窗口必须有序：开始 <= 截止 <= 迟交截止，缺失的时间由必填校验负责
fn check_time_order(
    validator: &mut FormValidator,
    start_time: Option<i64>,
    end_time: Option<i64>,
    late_time: Option<i64>,
) {
    if let (Some(start), Some(end)) = (start_time, end_time)
        && end < start
    {
        validator.add_error(
            "end_time",
            "The end time must be a date after or equal to start time.",
        );
    }
    if let (Some(end), Some(late)) = (end_time, late_time)
        && late < end
    {
        validator.add_error(
            "late_time",
            "The late time must be a date after or equal to end time.",
        );
    }
}

fn internal_error() -> HttpResponse {
    HttpResponse::InternalServerError().json(ApiResponse::error_empty(
        ErrorCode::AssignmentCreationFailed,
        "Assignment creation failed",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::multipart::FormPayload;

    fn run_check(start: i64, end: i64, late: i64) -> Result<(), crate::models::FieldErrors> {
        let form = FormPayload::default();
        let mut validator = FormValidator::new(&form);
        check_time_order(&mut validator, Some(start), Some(end), Some(late));
        validator.finish()
    }

    #[test]
    fn test_ordered_times_pass() {
        assert!(run_check(100, 200, 300).is_ok());
        // 相等的边界允许
        assert!(run_check(100, 100, 100).is_ok());
    }

    #[test]
    fn test_end_before_start_flags_end_time() {
        let errors = run_check(200, 100, 300).unwrap_err();
        assert_eq!(
            errors.get("end_time"),
            Some("The end time must be a date after or equal to start time.")
        );
        assert!(!errors.contains("late_time"));
    }

    #[test]
    fn test_late_before_end_flags_late_time() {
        let errors = run_check(100, 300, 200).unwrap_err();
        assert_eq!(
            errors.get("late_time"),
            Some("The late time must be a date after or equal to end time.")
        );
        assert!(!errors.contains("end_time"));
    }

    #[test]
    fn test_missing_times_add_nothing() {
        let form = FormPayload::default();
        let mut validator = FormValidator::new(&form);
        check_time_order(&mut validator, None, Some(100), None);
        assert!(validator.finish().is_ok());
    }
}
