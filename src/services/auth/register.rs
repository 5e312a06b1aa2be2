use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::config::AppConfig;
use crate::models::{
    ApiResponse, ErrorCode, FieldErrors,
    auth::{LoginResponse, RegisterRequest},
    roles::entities::Role,
    users::requests::NewUser,
};
use crate::services::{cache_from, storage_from};
use crate::utils::password::hash_password;
use crate::utils::session::{SessionStore, build_session_cookie, extract_session_token};
use crate::utils::validate::{validate_email, validate_name, validate_password, validate_username};

pub async fn handle_register(
    register_request: RegisterRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = storage_from(request);
    let config = AppConfig::get();

    // 1. 字段校验，错误按字段聚合后一次性返回
    let mut errors = FieldErrors::new();

    if let Err(msg) = validate_name(&register_request.name) {
        errors.add("name", msg);
    }

    match validate_username(&register_request.username) {
        Err(msg) => errors.add("username", msg),
        Ok(()) => match storage.get_user_by_username(&register_request.username).await {
            Ok(Some(_)) => errors.add("username", "The username has already been taken."),
            Ok(None) => {}
            Err(e) => {
                tracing::error!("Register username check failed: {}", e);
                return Ok(
                    HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                        ErrorCode::RegisterFailed,
                        "Register failed",
                    )),
                );
            }
        },
    }

    match validate_email(&register_request.email) {
        Err(msg) => errors.add("email", msg),
        Ok(()) => match storage.get_user_by_email(&register_request.email).await {
            Ok(Some(_)) => errors.add("email", "The email has already been taken."),
            Ok(None) => {}
            Err(e) => {
                tracing::error!("Register email check failed: {}", e);
                return Ok(
                    HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                        ErrorCode::RegisterFailed,
                        "Register failed",
                    )),
                );
            }
        },
    }

    let password_check = validate_password(&register_request.password);
    if !password_check.is_valid {
        errors.add("password", password_check.error_message());
    }

    if !errors.is_empty() {
        return Ok(HttpResponse::UnprocessableEntity().json(ApiResponse::error(
            ErrorCode::ValidationFailed,
            errors,
            "The given data was invalid.",
        )));
    }

    // 2. 哈希密码
    let password_hash = match hash_password(&register_request.password) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::error!("Password hashing failed: {}", e);
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::RegisterFailed,
                    "Register failed",
                )),
            );
        }
    };

    // 3. 创建用户
    let created = storage
        .create_user(NewUser {
            name: register_request.name,
            username: register_request.username,
            email: register_request.email,
            password_hash,
            birth_date: None,
            title: None,
            university_id: None,
            phone: None,
            image: None,
        })
        .await;

    let user = match created {
        Ok(user) => user,
        Err(e) => {
            tracing::error!("User creation failed: {}", e);
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::RegisterFailed,
                    "Register failed",
                )),
            );
        }
    };

    // 4. 自助注册的账号默认持有 student 角色
    match storage.get_role_by_name(Role::STUDENT).await {
        Ok(Some(role)) => {
            if let Err(e) = storage.assign_role(user.id, role.id).await {
                tracing::error!("Failed to assign student role to user {}: {}", user.id, e);
            }
        }
        Ok(None) => {
            tracing::error!("Role registry is missing the '{}' role", Role::STUDENT);
        }
        Err(e) => {
            tracing::error!("Role lookup failed during register: {}", e);
        }
    }

    // 角色关联之后重新取用户，让响应带上最新的角色列表
    let user = match storage.get_user_by_id(user.id).await {
        Ok(Some(user)) => user,
        _ => user,
    };

    tracing::info!("User {} registered", user.username);

    // 5. 注册即登录，建立会话
    let cache = cache_from(request);
    let sessions = SessionStore::from_config(cache);
    let previous = extract_session_token(request);
    let session = sessions.establish(user.id, previous.as_deref()).await;
    let cookie = build_session_cookie(&session.token, config.is_production());

    let response = LoginResponse {
        user,
        redirect: "/home".to_string(),
    };

    Ok(HttpResponse::Created()
        .cookie(cookie)
        .json(ApiResponse::success(response, "Registration successful")))
}
