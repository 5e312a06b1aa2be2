//! 路径参数安全提取器
//!
//! 将 `/{id}` 之类的路径段解析为有界的 i64，解析失败直接返回统一格式的 400，
//! 处理函数拿到的值保证有效。

use actix_web::dev::Payload;
use actix_web::error::InternalError;
use actix_web::{FromRequest, HttpRequest, HttpResponse};
use futures_util::future::{Ready, ready};

use crate::models::{ApiResponse, ErrorCode};

/// 通用的 `{id}` 路径参数，正整数
pub struct SafeIDI64(pub i64);

fn invalid_id_response(message: &str) -> actix_web::Error {
    let response = HttpResponse::BadRequest().json(ApiResponse::<()>::error_empty(
        ErrorCode::BadRequest,
        message,
    ));
    InternalError::from_response(message.to_string(), response).into()
}

impl FromRequest for SafeIDI64 {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let parsed = req
            .match_info()
            .get("id")
            .and_then(|raw| raw.parse::<i64>().ok())
            .filter(|id| *id > 0);

        ready(match parsed {
            Some(id) => Ok(SafeIDI64(id)),
            None => Err(invalid_id_response("Invalid ID in request path")),
        })
    }
}
