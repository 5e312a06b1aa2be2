pub mod assignments;
pub mod auth;
pub mod courses;
pub mod roles;
pub mod users;

pub use assignments::AssignmentService;
pub use auth::AuthService;
pub use courses::CourseService;
pub use roles::RoleService;
pub use users::UserService;

use actix_web::HttpRequest;
use std::sync::Arc;

use crate::cache::ObjectCache;
use crate::storage::Storage;

/// 从 app_data 取全局存储句柄。启动时一定注入过，取不到说明装配顺序出了问题。
pub(crate) fn storage_from(request: &HttpRequest) -> Arc<dyn Storage> {
    request
        .app_data::<actix_web::web::Data<Arc<dyn Storage>>>()
        .expect("Storage not found in app data")
        .get_ref()
        .clone()
}

/// 同上，取全局缓存句柄。
pub(crate) fn cache_from(request: &HttpRequest) -> Arc<dyn ObjectCache> {
    request
        .app_data::<actix_web::web::Data<Arc<dyn ObjectCache>>>()
        .expect("Cache not found in app data")
        .get_ref()
        .clone()
}
