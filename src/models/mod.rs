//! 业务模型定义
//!
//! 与 entity 模块的数据库实体分离，HTTP 层与存储层之间统一使用这些模型。

pub mod assignments;
pub mod auth;
pub mod common;
pub mod courses;
pub mod roles;
pub mod users;

pub use common::pagination::{DEFAULT_PAGE_SIZE, PaginationInfo, PaginationQuery};
pub use common::response::ApiResponse;
pub use common::validation::FieldErrors;

/// 应用启动时间，用于启动日志与健康信息
#[derive(Debug, Clone)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}

/// 业务错误码，HTTP 状态码之外的细分错误
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    // 400x 请求错误
    BadRequest = 4000,
    FileTypeNotAllowed = 4001,
    FileSizeExceeded = 4002,
    PayloadMalformed = 4003,

    // 401x 认证错误
    Unauthorized = 4010,
    AuthFailed = 4011,

    // 403x 权限错误
    Forbidden = 4030,

    // 404x 资源不存在
    NotFound = 4040,
    UserNotFound = 4041,
    CourseNotFound = 4042,
    AssignmentNotFound = 4043,
    RoleNotFound = 4044,

    // 409x 资源冲突
    UserAlreadyExists = 4091,

    // 422x 表单校验失败
    ValidationFailed = 4220,

    // 429x 频率限制
    RateLimitExceeded = 4290,

    // 500x 服务器错误
    InternalServerError = 5000,
    UserCreationFailed = 5001,
    AssignmentCreationFailed = 5002,
    CourseCreationFailed = 5003,
    RegisterFailed = 5004,
    FileUploadFailed = 5005,
}
