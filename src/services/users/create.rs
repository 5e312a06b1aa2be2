use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::error;

use crate::models::{
    ApiResponse, ErrorCode,
    roles::entities::Role,
    users::{requests::NewUser, responses::CreateUserResponse},
};
use crate::services::storage_from;
use crate::utils::file_store::FileStore;
use crate::utils::form::FormValidator;
use crate::utils::multipart::{FormReadError, read_form};
use crate::utils::password::hash_password;
use crate::utils::validate::validate_email;

/// 头像允许的扩展名
const IMAGE_EXTENSIONS: [&str; 3] = [".jpg", ".jpeg", ".png"];

/// 管理员创建用户
///
/// 表单整体缓冲后先完成全部校验，任何校验失败都在写盘和落库之前返回，
/// 不留下半成品状态。
pub async fn create_user(mut payload: Multipart, request: &HttpRequest) -> ActixResult<HttpResponse> {
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

    let username = validator.required_string("username");
    if let Some(ref username) = username {
        match storage.get_user_by_username(username).await {
            Ok(Some(_)) => validator.add_error("username", "The username has already been taken."),
            Ok(None) => {}
            Err(e) => {
                error!("Username check failed: {}", e);
                return Ok(internal_error());
            }
        }
    }

    let email = validator.required_string("email");
    if let Some(ref email) = email {
        if let Err(msg) = validate_email(email) {
            validator.add_error("email", msg);
        } else {
            match storage.get_user_by_email(email).await {
                Ok(Some(_)) => validator.add_error("email", "The email has already been taken."),
                Ok(None) => {}
                Err(e) => {
                    error!("Email check failed: {}", e);
                    return Ok(internal_error());
                }
            }
        }
    }

    let password = validator.required_string("password");
    if let Some(ref password) = password
        && password.chars().count() < 6
    {
        validator.add_error("password", "The password must be at least 6 characters.");
    }
    validator.require_confirmed("password");

    // 每个请求的角色都必须在角色注册表里
    let mut roles: Vec<Role> = Vec::new();
    if let Some(role_names) = validator.required_values("role") {
        for role_name in &role_names {
            match storage.get_role_by_name(role_name).await {
                Ok(Some(role)) => roles.push(role),
                Ok(None) => {
                    validator.add_error("role", "The selected role is invalid.");
                    break;
                }
                Err(e) => {
                    error!("Role lookup failed: {}", e);
                    return Ok(internal_error());
                }
            }
        }
    }

    let birth_date = validator.optional_date("birth_date");
    let title = validator.optional_string("title");
    let university_id = validator.optional_string("university_id");
    let phone = validator.optional_string("phone");

    validator.optional_file("image", &IMAGE_EXTENSIONS, config.upload.image_max_size);

    if let Err(errors) = validator.finish() {
        return Ok(HttpResponse::UnprocessableEntity().json(ApiResponse::error(
            ErrorCode::ValidationFailed,
            errors,
            "The given data was invalid.",
        )));
    }

    // 校验全部通过后字段一定存在
    let (Some(name), Some(username), Some(email), Some(password)) =
        (name, username, email, password)
    else {
        return Ok(internal_error());
    };

    // 3. 头像落盘（校验已通过，这是第一个副作用）
    let file_store = FileStore::from_config();
    let image = match form.file("image") {
        Some(file) => match file_store.store(&username, file) {
            Ok(stored_name) => Some(stored_name),
            Err(e) => {
                error!("Image store failed: {}", e);
                return Ok(
                    HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                        ErrorCode::FileUploadFailed,
                        "Failed to store uploaded image",
                    )),
                );
            }
        },
        None => None,
    };

    // 4. 哈希密码并落库
    let password_hash = match hash_password(&password) {
        Ok(hash) => hash,
        Err(e) => {
            error!("Password hashing failed: {}", e);
            cleanup_image(&file_store, &image);
            return Ok(internal_error());
        }
    };

    let created = storage
        .create_user(NewUser {
            name,
            username,
            email,
            password_hash,
            birth_date,
            title,
            university_id,
            phone,
            image: image.clone(),
        })
        .await;

    let user = match created {
        Ok(user) => user,
        Err(e) => {
            let msg = format!("User creation failed: {e}");
            error!("{}", msg);
            cleanup_image(&file_store, &image);
            // 判断是否唯一约束冲突（与预检查之间存在竞争窗口）
            if msg.contains("UNIQUE constraint failed") {
                return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                    ErrorCode::UserAlreadyExists,
                    "Username or email already exists",
                )));
            }
            return Ok(HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::UserCreationFailed,
                "User creation failed",
            )));
        }
    };

    // 5. 角色关联，用户行保存之后逐个挂接，失败不回滚已保存的用户
    for role in &roles {
        if let Err(e) = storage.assign_role(user.id, role.id).await {
            error!("Failed to assign role {} to user {}: {}", role.name, user.id, e);
            return Ok(HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::UserCreationFailed,
                "User creation failed",
            )));
        }
    }

    // 重新取用户带上角色列表
    let user = match storage.get_user_by_id(user.id).await {
        Ok(Some(user)) => user,
        _ => user,
    };

    tracing::info!("Admin created user {} with {} role(s)", user.username, roles.len());

    Ok(HttpResponse::Created().json(ApiResponse::success(
        CreateUserResponse {
            user,
            redirect: "/dashboard/users".to_string(),
        },
        "User created successfully!",
    )))
}

fn internal_error() -> HttpResponse {
    HttpResponse::InternalServerError().json(ApiResponse::error_empty(
        ErrorCode::UserCreationFailed,
        "User creation failed",
    ))
}

/// 删除已写入的头像文件，只在后续步骤失败时调用
fn cleanup_image(file_store: &FileStore, image: &Option<String>) {
    if let Some(stored_name) = image {
        file_store.remove(stored_name);
    }
}
