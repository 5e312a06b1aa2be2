use std::sync::Arc;

use crate::models::{
    assignments::{entities::Assignment, requests::NewAssignment},
    courses::{
        entities::{Course, CourseGroup},
        requests::{CourseListQuery, CreateCourseRequest},
        responses::CourseListResponse,
    },
    roles::entities::Role,
    users::{
        entities::User,
        requests::{NewUser, UserListQuery},
        responses::UserListResponse,
    },
};

use crate::errors::Result;

pub mod sea_orm_storage;

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 用户管理方法
    // 创建用户（角色通过 assign_role 单独关联）
    async fn create_user(&self, user: NewUser) -> Result<User>;
    // 通过ID获取用户信息
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>>;
    // 通过用户名获取用户信息
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    // 通过邮箱获取用户信息
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    // 列出用户，支持按角色过滤
    async fn list_users_with_pagination(&self, query: UserListQuery) -> Result<UserListResponse>;
    // 更新用户最后登录时间
    async fn update_last_login(&self, id: i64) -> Result<bool>;
    // 用户总数，用于启动时判断是否初始化管理员
    async fn count_users(&self) -> Result<u64>;

    /// 角色管理方法
    // 列出全部角色
    async fn list_roles(&self) -> Result<Vec<Role>>;
    // 通过名字获取角色
    async fn get_role_by_name(&self, name: &str) -> Result<Option<Role>>;
    // 创建角色
    async fn create_role(&self, name: &str) -> Result<Role>;
    // 给用户关联角色，重复关联视为成功
    async fn assign_role(&self, user_id: i64, role_id: i64) -> Result<()>;
    // 列出用户持有的角色名
    async fn list_role_names_for_user(&self, user_id: i64) -> Result<Vec<String>>;

    /// 课程管理方法
    // 创建课程
    async fn create_course(&self, course: CreateCourseRequest) -> Result<Course>;
    // 通过ID获取课程信息
    async fn get_course_by_id(&self, course_id: i64) -> Result<Option<Course>>;
    // 列出课程
    async fn list_courses_with_pagination(
        &self,
        query: CourseListQuery,
    ) -> Result<CourseListResponse>;
    // 通过ID获取课程分组
    async fn get_group_by_id(&self, group_id: i64) -> Result<Option<CourseGroup>>;

    /// 作业管理方法
    // 创建作业
    async fn create_assignment(&self, assignment: NewAssignment) -> Result<Assignment>;
    // 通过ID获取作业信息
    async fn get_assignment_by_id(&self, assignment_id: i64) -> Result<Option<Assignment>>;
}

pub async fn create_storage() -> Result<Arc<dyn Storage>> {
    let storage = sea_orm_storage::SeaOrmStorage::new_async().await?;
    Ok(Arc::new(storage))
}
