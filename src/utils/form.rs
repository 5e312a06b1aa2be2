//! 表单字段校验
//!
//! 对已缓冲的 multipart 表单做逐字段校验，错误按字段聚合，
//! 校验过程只读取表单，不产生任何副作用。

use chrono::{NaiveDate, NaiveDateTime};

use crate::models::FieldErrors;
use crate::utils::file_magic::validate_magic_bytes;
use crate::utils::multipart::{FormPayload, UploadedFile};

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// 解析日期时间为 Unix 时间戳（秒），支持 datetime-local 与纯日期两种输入
pub fn parse_datetime(value: &str) -> Option<i64> {
    let value = value.trim();
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt.and_utc().timestamp());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp())
}

/// 按字段收集校验错误的表单校验器
///
/// 每个取值方法在校验失败时记录该字段的错误并返回 `None`，
/// 全部字段处理完后用 [`FormValidator::finish`] 取结果。
pub struct FormValidator<'a> {
    form: &'a FormPayload,
    errors: FieldErrors,
}

impl<'a> FormValidator<'a> {
    pub fn new(form: &'a FormPayload) -> Self {
        Self {
            form,
            errors: FieldErrors::new(),
        }
    }

    /// 记录一条字段错误（用于校验器覆盖不到的业务规则）
    pub fn add_error(&mut self, field: &str, message: &str) {
        self.errors.add(field, message);
    }

    pub fn has_error(&self, field: &str) -> bool {
        self.errors.contains(field)
    }

    /// 校验通过返回 Ok，否则返回聚合的字段错误
    pub fn finish(self) -> Result<(), FieldErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }

    fn present(&self, field: &str) -> Option<&'a str> {
        self.form
            .first(field)
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    pub fn required_string(&mut self, field: &str) -> Option<String> {
        match self.present(field) {
            Some(value) => Some(value.to_string()),
            None => {
                self.errors
                    .add(field, &format!("The {} field is required.", label(field)));
                None
            }
        }
    }

    pub fn optional_string(&mut self, field: &str) -> Option<String> {
        self.present(field).map(str::to_string)
    }

    /// 必填字符串且长度在 [min, max] 之间（按字符计）
    pub fn required_string_between(
        &mut self,
        field: &str,
        min: usize,
        max: usize,
    ) -> Option<String> {
        let value = self.required_string(field)?;
        let chars = value.chars().count();
        if chars < min {
            self.errors.add(
                field,
                &format!("The {} must be at least {min} characters.", label(field)),
            );
            return None;
        }
        if chars > max {
            self.errors.add(
                field,
                &format!(
                    "The {} may not be greater than {max} characters.",
                    label(field)
                ),
            );
            return None;
        }
        Some(value)
    }

    /// 必填日期时间，返回 Unix 时间戳（秒）
    pub fn required_datetime(&mut self, field: &str) -> Option<i64> {
        let value = self.required_string(field)?;
        match parse_datetime(&value) {
            Some(ts) => Some(ts),
            None => {
                self.errors
                    .add(field, &format!("The {} is not a valid date.", label(field)));
                None
            }
        }
    }

    /// 可选日期（如出生日期），返回规范化的 `YYYY-MM-DD`
    pub fn optional_date(&mut self, field: &str) -> Option<String> {
        let value = self.present(field)?;
        match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
            Ok(date) => Some(date.format("%Y-%m-%d").to_string()),
            Err(_) => {
                self.errors
                    .add(field, &format!("The {} is not a valid date.", label(field)));
                None
            }
        }
    }

    pub fn required_positive_i64(&mut self, field: &str) -> Option<i64> {
        let value = self.required_string(field)?;
        match value.parse::<i64>() {
            Ok(n) if n > 0 => Some(n),
            Ok(_) => {
                self.errors.add(
                    field,
                    &format!("The {} must be greater than 0.", label(field)),
                );
                None
            }
            Err(_) => {
                self.errors
                    .add(field, &format!("The {} must be a number.", label(field)));
                None
            }
        }
    }

    pub fn required_positive_f64(&mut self, field: &str) -> Option<f64> {
        let value = self.required_string(field)?;
        match value.parse::<f64>() {
            Ok(n) if n > 0.0 => Some(n),
            Ok(_) => {
                self.errors.add(
                    field,
                    &format!("The {} must be greater than 0.", label(field)),
                );
                None
            }
            Err(_) => {
                self.errors
                    .add(field, &format!("The {} must be a number.", label(field)));
                None
            }
        }
    }

    pub fn optional_i64(&mut self, field: &str) -> Option<i64> {
        let value = self.present(field)?;
        match value.parse::<i64>() {
            Ok(n) => Some(n),
            Err(_) => {
                self.errors
                    .add(field, &format!("The {} must be a number.", label(field)));
                None
            }
        }
    }

    /// `{field}_confirmation` 必须与 `{field}` 一致
    pub fn require_confirmed(&mut self, field: &str) {
        let original = self.form.first(field).unwrap_or_default();
        let confirmation = self
            .form
            .first(&format!("{field}_confirmation"))
            .unwrap_or_default();
        if original != confirmation {
            self.errors.add(
                field,
                &format!("The {} confirmation does not match.", label(field)),
            );
        }
    }

    /// 至少一个值的重复字段（`role[]`）
    pub fn required_values(&mut self, field: &str) -> Option<Vec<String>> {
        let values: Vec<String> = self
            .form
            .all(field)
            .iter()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect();
        if values.is_empty() {
            self.errors
                .add(field, &format!("The {} field is required.", label(field)));
            return None;
        }
        Some(values)
    }

    /// 可选文件：扩展名白名单、魔术字节、大小上限（KB 粒度的提示消息）
    ///
    /// 文件缺失时返回 `None` 且不记错误，调用方自行决定是否必填。
    pub fn optional_file(
        &mut self,
        field: &str,
        allowed_extensions: &[&str],
        max_size: usize,
    ) -> Option<&'a UploadedFile> {
        let file = self.form.file(field)?;

        if !allowed_extensions
            .iter()
            .any(|ext| *ext == file.extension)
        {
            self.errors.add(
                field,
                &format!(
                    "The {} must be a file of type: {}.",
                    label(field),
                    allowed_extensions
                        .iter()
                        .map(|ext| ext.trim_start_matches('.'))
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            );
            return None;
        }

        if !validate_magic_bytes(&file.data, &file.extension) {
            self.errors.add(
                field,
                &format!(
                    "The {} content does not match its file type.",
                    label(field)
                ),
            );
            return None;
        }

        if file.size() > max_size {
            self.errors.add(
                field,
                &format!(
                    "The {} may not be greater than {} kilobytes.",
                    label(field),
                    max_size / 1024
                ),
            );
            return None;
        }

        Some(file)
    }
}

/// 字段名用于错误消息时下划线转空格
fn label(field: &str) -> String {
    field.replace('_', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::multipart::FormPayload;

    fn assignment_form() -> FormPayload {
        let mut form = FormPayload::default();
        form.insert_field("name", "HW1");
        form.insert_field("start_time", "2024-01-01T00:00");
        form.insert_field("end_time", "2024-02-01T00:00");
        form.insert_field("late_time", "2024-02-08T00:00");
        form.insert_field("max", "3");
        form.insert_field("grade", "100");
        form.insert_field("course_id", "1");
        form
    }

    #[test]
    fn test_valid_assignment_fields() {
        let form = assignment_form();
        let mut validator = FormValidator::new(&form);

        assert_eq!(validator.required_string("name").as_deref(), Some("HW1"));
        let start = validator.required_datetime("start_time");
        let end = validator.required_datetime("end_time");
        let late = validator.required_datetime("late_time");
        assert!(start < end && end < late);
        assert_eq!(validator.required_positive_i64("max"), Some(3));
        assert_eq!(validator.required_positive_f64("grade"), Some(100.0));
        assert!(validator.optional_string("description").is_none());
        assert!(validator.finish().is_ok());
    }

    #[test]
    fn test_missing_required_fields_collects_errors() {
        let form = FormPayload::default();
        let mut validator = FormValidator::new(&form);

        assert!(validator.required_string("name").is_none());
        assert!(validator.required_datetime("start_time").is_none());
        assert!(validator.required_positive_i64("max").is_none());

        let errors = validator.finish().unwrap_err();
        assert_eq!(errors.len(), 3);
        assert_eq!(errors.get("name"), Some("The name field is required."));
        assert_eq!(
            errors.get("start_time"),
            Some("The start time field is required.")
        );
    }

    #[test]
    fn test_invalid_datetime_and_number() {
        let mut form = FormPayload::default();
        form.insert_field("start_time", "not-a-date");
        form.insert_field("max", "-1");
        form.insert_field("grade", "many");

        let mut validator = FormValidator::new(&form);
        assert!(validator.required_datetime("start_time").is_none());
        assert!(validator.required_positive_i64("max").is_none());
        assert!(validator.required_positive_f64("grade").is_none());

        let errors = validator.finish().unwrap_err();
        assert_eq!(
            errors.get("start_time"),
            Some("The start time is not a valid date.")
        );
        assert_eq!(errors.get("max"), Some("The max must be greater than 0."));
        assert_eq!(errors.get("grade"), Some("The grade must be a number."));
    }

    #[test]
    fn test_validation_does_not_consume_the_form() {
        let form = assignment_form();
        {
            let mut validator = FormValidator::new(&form);
            validator.required_string("name");
            assert!(validator.finish().is_ok());
        }
        // 再次校验同一份表单得到同样的结果
        let mut validator = FormValidator::new(&form);
        assert_eq!(validator.required_string("name").as_deref(), Some("HW1"));
        assert!(validator.finish().is_ok());
    }

    #[test]
    fn test_confirmation_mismatch() {
        let mut form = FormPayload::default();
        form.insert_field("password", "secret1");
        form.insert_field("password_confirmation", "secret2");

        let mut validator = FormValidator::new(&form);
        validator.require_confirmed("password");
        let errors = validator.finish().unwrap_err();
        assert_eq!(
            errors.get("password"),
            Some("The password confirmation does not match.")
        );
    }

    #[test]
    fn test_repeated_role_values() {
        let mut form = FormPayload::default();
        form.insert_field("role[]", "student");
        form.insert_field("role[]", "instructor");

        let mut validator = FormValidator::new(&form);
        assert_eq!(
            validator.required_values("role"),
            Some(vec!["student".to_string(), "instructor".to_string()])
        );
        assert!(validator.finish().is_ok());

        let empty = FormPayload::default();
        let mut validator = FormValidator::new(&empty);
        assert!(validator.required_values("role").is_none());
        let errors = validator.finish().unwrap_err();
        assert_eq!(errors.get("role"), Some("The role field is required."));
    }

    #[test]
    fn test_optional_file_rules() {
        let mut form = FormPayload::default();
        form.insert_file(
            "pdf",
            UploadedFile {
                original_name: "notes.pdf".to_string(),
                extension: ".pdf".to_string(),
                content_type: "application/pdf".to_string(),
                data: b"%PDF-1.4 fake body".to_vec(),
            },
        );

        let mut validator = FormValidator::new(&form);
        let file = validator.optional_file("pdf", &[".pdf"], 1024);
        assert!(file.is_some());
        assert!(validator.finish().is_ok());

        // 扩展名不在白名单
        let mut validator = FormValidator::new(&form);
        assert!(validator.optional_file("pdf", &[".png"], 1024).is_none());
        let errors = validator.finish().unwrap_err();
        assert_eq!(
            errors.get("pdf"),
            Some("The pdf must be a file of type: png.")
        );

        // 内容与扩展名不匹配
        let mut bad = FormPayload::default();
        bad.insert_file(
            "pdf",
            UploadedFile {
                original_name: "notes.pdf".to_string(),
                extension: ".pdf".to_string(),
                content_type: "application/pdf".to_string(),
                data: b"not a pdf at all".to_vec(),
            },
        );
        let mut validator = FormValidator::new(&bad);
        assert!(validator.optional_file("pdf", &[".pdf"], 1024).is_none());
        assert!(validator.finish().is_err());

        // 文件缺失不记错误
        let empty = FormPayload::default();
        let mut validator = FormValidator::new(&empty);
        assert!(validator.optional_file("pdf", &[".pdf"], 1024).is_none());
        assert!(validator.finish().is_ok());
    }
}
