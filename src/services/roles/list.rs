use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::models::{ApiResponse, ErrorCode, roles::responses::RoleListResponse};
use crate::services::storage_from;

pub async fn list_roles(request: &HttpRequest) -> ActixResult<HttpResponse> {
    let storage = storage_from(request);

    match storage.list_roles().await {
        Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            RoleListResponse { items },
            "Role list retrieved successfully",
        ))),
        Err(e) => {
            tracing::error!("Failed to retrieve role list: {}", e);
            Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    "Failed to retrieve role list",
                )),
            )
        }
    }
}
