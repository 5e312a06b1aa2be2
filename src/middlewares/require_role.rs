//! 基于角色的访问控制
//!
//! 挂在 `RequireSession` 之后，从请求扩展里取出已认证用户并核对角色：
//! `RequireRole::new(Role::ADMIN)` 要求持有该角色，
//! `RequireRole::new_any(&[Role::ADMIN, Role::INSTRUCTOR])` 任一命中即放行。
//! 没有用户信息返回 401，角色不符返回 403。

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use tracing::info;

use crate::models::{ErrorCode, users::entities};

use super::create_error_response;

enum RoleMatch {
    All,
    Any,
}

struct RoleCheck {
    names: Vec<String>,
    mode: RoleMatch,
}

impl RoleCheck {
    fn satisfied_by(&self, user: &entities::User) -> bool {
        match self.mode {
            RoleMatch::All => self.names.iter().all(|name| user.has_role(name)),
            RoleMatch::Any => self.names.iter().any(|name| user.has_role(name)),
        }
    }
}

#[derive(Clone)]
pub struct RequireRole {
    check: Rc<RoleCheck>,
}

impl RequireRole {
    /// 要求持有指定角色
    pub fn new(role: &str) -> Self {
        Self {
            check: Rc::new(RoleCheck {
                names: vec![role.to_string()],
                mode: RoleMatch::All,
            }),
        }
    }

    /// 要求持有列表中任一角色
    pub fn new_any(roles: &[&str]) -> Self {
        Self {
            check: Rc::new(RoleCheck {
                names: roles.iter().map(|r| r.to_string()).collect(),
                mode: RoleMatch::Any,
            }),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireRole
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireRoleMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireRoleMiddleware {
            service: Rc::new(service),
            check: self.check.clone(),
        }))
    }
}

pub struct RequireRoleMiddleware<S> {
    service: Rc<S>,
    check: Rc<RoleCheck>,
}

impl<S, B> Service<ServiceRequest> for RequireRoleMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        let check = self.check.clone();

        Box::pin(async move {
            let user = req.extensions().get::<entities::User>().cloned();

            let Some(user) = user else {
                info!("Role check without session user, mount RequireSession before RequireRole");
                return Ok(req.into_response(
                    create_error_response(
                        StatusCode::UNAUTHORIZED,
                        ErrorCode::Unauthorized,
                        "Authentication required",
                    )
                    .map_into_right_body(),
                ));
            };

            if check.satisfied_by(&user) {
                let res = srv.call(req).await?;
                return Ok(res.map_into_left_body());
            }

            info!(
                "Access denied for user {} (roles: {:?}), required: {:?}",
                user.id, user.roles, check.names
            );
            Ok(req.into_response(
                create_error_response(StatusCode::FORBIDDEN, ErrorCode::Forbidden, "Access denied.")
                    .map_into_right_body(),
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::roles::entities::Role;

    fn user_with_roles(roles: &[&str]) -> entities::User {
        entities::User {
            id: 1,
            name: "Test User".to_string(),
            username: "testuser".to_string(),
            email: "test@example.com".to_string(),
            password_hash: String::new(),
            birth_date: None,
            title: None,
            university_id: None,
            phone: None,
            image: None,
            roles: roles.iter().map(|r| r.to_string()).collect(),
            last_login: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_all_mode_requires_every_role() {
        let check = RoleCheck {
            names: vec![Role::ADMIN.to_string(), Role::INSTRUCTOR.to_string()],
            mode: RoleMatch::All,
        };
        assert!(check.satisfied_by(&user_with_roles(&[Role::ADMIN, Role::INSTRUCTOR])));
        assert!(!check.satisfied_by(&user_with_roles(&[Role::ADMIN])));
    }

    #[test]
    fn test_any_mode_accepts_first_match() {
        let check = RoleCheck {
            names: vec![Role::ADMIN.to_string(), Role::INSTRUCTOR.to_string()],
            mode: RoleMatch::Any,
        };
        assert!(check.satisfied_by(&user_with_roles(&[Role::INSTRUCTOR])));
        assert!(!check.satisfied_by(&user_with_roles(&[Role::STUDENT])));
    }
}
