//! SeaORM 存储实现
//!
//! 统一的数据库存储层，支持 SQLite、PostgreSQL 和 MySQL。

mod assignments;
mod courses;
mod roles;
mod users;

use crate::config::AppConfig;
use crate::errors::{CourseHubError, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;
use tracing::info;

/// SeaORM 存储实现
#[derive(Clone)]
pub struct SeaOrmStorage {
    pub(crate) db: DatabaseConnection,
}

/// 给 DbErr 补上操作语境再转统一错误类型，免得每个查询都写一遍闭包
pub(crate) trait DbResultExt<T> {
    fn db_context(self, context: &str) -> Result<T>;
}

impl<T> DbResultExt<T> for std::result::Result<T, sea_orm::DbErr> {
    fn db_context(self, context: &str) -> Result<T> {
        self.map_err(|e| CourseHubError::database_operation(format!("{context}: {e}")))
    }
}

impl SeaOrmStorage {
    /// 创建新的 SeaORM 存储实例
    pub async fn new_async() -> Result<Self> {
        let config = AppConfig::get();
        let db_url = Self::build_database_url(&config.database.url)?;

        // 根据数据库类型选择连接方式
        let db = if db_url.starts_with("sqlite://") {
            Self::connect_sqlite(&db_url, config).await?
        } else {
            Self::connect_generic(&db_url, config).await?
        };

        // 运行迁移
        Migrator::up(&db, None).await.db_context("数据库迁移失败")?;

        info!("SeaORM 存储初始化完成，数据库: {}", db_url);

        Ok(Self { db })
    }

    /// SQLite 专用连接（WAL + pragma 优化）
    async fn connect_sqlite(url: &str, config: &AppConfig) -> Result<DatabaseConnection> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{
            SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
        };
        use std::str::FromStr;

        let opt = SqliteConnectOptions::from_str(url)
            .map_err(|e| CourseHubError::database_config(format!("SQLite URL 解析失败: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5))
            .pragma("cache_size", "-64000")
            .pragma("temp_store", "memory")
            .pragma("mmap_size", "536870912")
            .pragma("wal_autocheckpoint", "1000");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.database.pool_size)
            .min_connections(1)
            .test_before_acquire(true)
            .acquire_timeout(Duration::from_secs(config.database.timeout))
            .idle_timeout(Duration::from_secs(300))
            .connect_with(opt)
            .await
            .map_err(|e| CourseHubError::database_connection(format!("SQLite 连接失败: {e}")))?;

        Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
    }

    /// 通用连接（PostgreSQL、MySQL 等）
    async fn connect_generic(url: &str, config: &AppConfig) -> Result<DatabaseConnection> {
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(config.database.pool_size)
            .min_connections(5)
            .connect_timeout(Duration::from_secs(config.database.timeout))
            .acquire_timeout(Duration::from_secs(config.database.timeout))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .sqlx_logging(false)
            .sqlx_logging_level(tracing::log::LevelFilter::Debug);

        Database::connect(opt)
            .await
            .map_err(|e| CourseHubError::database_connection(format!("无法连接到数据库: {e}")))
    }

    /// 从 URL 自动推断数据库类型并构建连接 URL
    fn build_database_url(url: &str) -> Result<String> {
        if url.starts_with("sqlite://") {
            Ok(url.to_string())
        } else if url.ends_with(".db") || url.ends_with(".sqlite") || url == ":memory:" {
            Ok(format!("sqlite://{}?mode=rwc", url))
        } else if url.starts_with("postgres://")
            || url.starts_with("postgresql://")
            || url.starts_with("mysql://")
            || url.starts_with("mariadb://")
        {
            Ok(url.to_string())
        } else {
            Err(CourseHubError::database_config(format!(
                "无法从 URL 推断数据库类型: {url}. 支持: sqlite://, postgres://, mysql://, 或 .db/.sqlite 文件路径"
            )))
        }
    }
}

// Storage trait 实现
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
use crate::storage::Storage;
use async_trait::async_trait;

#[async_trait]
impl Storage for SeaOrmStorage {
    // 用户模块
    async fn create_user(&self, user: NewUser) -> Result<User> {
        self.create_user_impl(user).await
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        self.get_user_by_id_impl(id).await
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.get_user_by_username_impl(username).await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.get_user_by_email_impl(email).await
    }

    async fn list_users_with_pagination(&self, query: UserListQuery) -> Result<UserListResponse> {
        self.list_users_with_pagination_impl(query).await
    }

    async fn update_last_login(&self, id: i64) -> Result<bool> {
        self.update_last_login_impl(id).await
    }

    async fn count_users(&self) -> Result<u64> {
        self.count_users_impl().await
    }

    // 角色模块
    async fn list_roles(&self) -> Result<Vec<Role>> {
        self.list_roles_impl().await
    }

    async fn get_role_by_name(&self, name: &str) -> Result<Option<Role>> {
        self.get_role_by_name_impl(name).await
    }

    async fn create_role(&self, name: &str) -> Result<Role> {
        self.create_role_impl(name).await
    }

    async fn assign_role(&self, user_id: i64, role_id: i64) -> Result<()> {
        self.assign_role_impl(user_id, role_id).await
    }

    async fn list_role_names_for_user(&self, user_id: i64) -> Result<Vec<String>> {
        self.list_role_names_for_user_impl(user_id).await
    }

    // 课程模块
    async fn create_course(&self, course: CreateCourseRequest) -> Result<Course> {
        self.create_course_impl(course).await
    }

    async fn get_course_by_id(&self, course_id: i64) -> Result<Option<Course>> {
        self.get_course_by_id_impl(course_id).await
    }

    async fn list_courses_with_pagination(
        &self,
        query: CourseListQuery,
    ) -> Result<CourseListResponse> {
        self.list_courses_with_pagination_impl(query).await
    }

    async fn get_group_by_id(&self, group_id: i64) -> Result<Option<CourseGroup>> {
        self.get_group_by_id_impl(group_id).await
    }

    // 作业模块
    async fn create_assignment(&self, assignment: NewAssignment) -> Result<Assignment> {
        self.create_assignment_impl(assignment).await
    }

    async fn get_assignment_by_id(&self, assignment_id: i64) -> Result<Option<Assignment>> {
        self.get_assignment_by_id_impl(assignment_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::requests::NewUser;

    /// 内存数据库，单连接保证所有语句落在同一个库上
    async fn memory_storage() -> SeaOrmStorage {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1).sqlx_logging(false);
        let db = Database::connect(opt)
            .await
            .expect("连接内存数据库失败");
        Migrator::up(&db, None).await.expect("迁移失败");
        SeaOrmStorage { db }
    }

    fn new_user(name: &str, username: &str, email: &str) -> NewUser {
        NewUser {
            name: name.to_string(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$fake".to_string(),
            birth_date: None,
            title: None,
            university_id: None,
            phone: None,
            image: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_fetch_user() {
        let storage = memory_storage().await;

        let created = storage
            .create_user_impl(new_user("John Doe", "jdoe", "jdoe@example.com"))
            .await
            .unwrap();
        assert!(created.id > 0);
        assert!(created.roles.is_empty());

        let by_email = storage
            .get_user_by_email_impl("jdoe@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_email.id, created.id);
        assert_eq!(by_email.username, "jdoe");

        let by_username = storage.get_user_by_username_impl("jdoe").await.unwrap();
        assert!(by_username.is_some());
        assert!(
            storage
                .get_user_by_email_impl("nobody@example.com")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let storage = memory_storage().await;

        storage
            .create_user_impl(new_user("First", "first", "same@example.com"))
            .await
            .unwrap();
        let result = storage
            .create_user_impl(new_user("Second", "second", "same@example.com"))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_role_assignment_and_lookup() {
        let storage = memory_storage().await;

        let user = storage
            .create_user_impl(new_user("John Doe", "jdoe", "jdoe@example.com"))
            .await
            .unwrap();
        let student = storage.create_role_impl("student").await.unwrap();
        let instructor = storage.create_role_impl("instructor").await.unwrap();

        storage.assign_role_impl(user.id, student.id).await.unwrap();
        storage
            .assign_role_impl(user.id, instructor.id)
            .await
            .unwrap();
        // 重复关联不报错也不产生重复行
        storage.assign_role_impl(user.id, student.id).await.unwrap();

        let names = storage.list_role_names_for_user_impl(user.id).await.unwrap();
        assert_eq!(names, vec!["student".to_string(), "instructor".to_string()]);

        let fetched = storage.get_user_by_id_impl(user.id).await.unwrap().unwrap();
        assert!(fetched.has_role("student"));
        assert!(fetched.has_role("instructor"));

        assert!(
            storage
                .get_role_by_name_impl("admin")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_list_users_filtered_by_role() {
        let storage = memory_storage().await;

        let student_role = storage.create_role_impl("student").await.unwrap();
        let instructor_role = storage.create_role_impl("instructor").await.unwrap();

        let alice = storage
            .create_user_impl(new_user("Alice Green", "alice", "alice@example.com"))
            .await
            .unwrap();
        let bob = storage
            .create_user_impl(new_user("Bob Stone", "bob", "bob@example.com"))
            .await
            .unwrap();
        let carol = storage
            .create_user_impl(new_user("Carol White", "carol", "carol@example.com"))
            .await
            .unwrap();

        storage
            .assign_role_impl(alice.id, student_role.id)
            .await
            .unwrap();
        storage
            .assign_role_impl(bob.id, student_role.id)
            .await
            .unwrap();
        storage
            .assign_role_impl(carol.id, instructor_role.id)
            .await
            .unwrap();

        let students = storage
            .list_users_with_pagination_impl(UserListQuery {
                role: Some("student".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(students.pagination.total, 2);
        assert!(students.items.iter().all(|u| u.has_role("student")));

        // 未知角色得到空列表而不是错误
        let none = storage
            .list_users_with_pagination_impl(UserListQuery {
                role: Some("ghost".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(none.pagination.total, 0);
        assert!(none.items.is_empty());

        // 搜索
        let found = storage
            .list_users_with_pagination_impl(UserListQuery {
                search: Some("stone".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(found.items.len(), 1);
        assert_eq!(found.items[0].username, "bob");
    }

    #[tokio::test]
    async fn test_update_last_login_and_count() {
        let storage = memory_storage().await;
        assert_eq!(storage.count_users_impl().await.unwrap(), 0);

        let user = storage
            .create_user_impl(new_user("John Doe", "jdoe", "jdoe@example.com"))
            .await
            .unwrap();
        assert_eq!(storage.count_users_impl().await.unwrap(), 1);
        assert!(user.last_login.is_none());

        assert!(storage.update_last_login_impl(user.id).await.unwrap());
        let fetched = storage.get_user_by_id_impl(user.id).await.unwrap().unwrap();
        assert!(fetched.last_login.is_some());

        assert!(!storage.update_last_login_impl(9999).await.unwrap());
    }

    #[tokio::test]
    async fn test_course_and_assignment_flow() {
        let storage = memory_storage().await;

        let course = storage
            .create_course_impl(CreateCourseRequest {
                name: "Programming 101".to_string(),
                description: Some("Intro course".to_string()),
            })
            .await
            .unwrap();
        assert!(course.id > 0);

        let start = chrono::Utc::now().timestamp();
        let assignment = storage
            .create_assignment_impl(NewAssignment {
                name: "HW1".to_string(),
                description: None,
                start_time: start,
                end_time: start + 86400,
                late_time: start + 2 * 86400,
                max_submissions: 3,
                grade: 100.0,
                course_id: course.id,
                group_id: None,
                pdf: None,
            })
            .await
            .unwrap();

        let fetched = storage
            .get_assignment_by_id_impl(assignment.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.name, "HW1");
        assert_eq!(fetched.max_submissions, 3);
        assert_eq!(fetched.grade, 100.0);
        assert_eq!(fetched.course_id, course.id);
        assert!(fetched.pdf.is_none());
        assert!(fetched.group_id.is_none());

        assert!(
            storage
                .get_assignment_by_id_impl(9999)
                .await
                .unwrap()
                .is_none()
        );
        assert!(storage.get_group_by_id_impl(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_courses_pagination() {
        let storage = memory_storage().await;

        for i in 1..=20 {
            storage
                .create_course_impl(CreateCourseRequest {
                    name: format!("Course {i}"),
                    description: None,
                })
                .await
                .unwrap();
        }

        let page = storage
            .list_courses_with_pagination_impl(CourseListQuery {
                page: Some(2),
                size: Some(15),
            })
            .await
            .unwrap();
        assert_eq!(page.pagination.total, 20);
        assert_eq!(page.pagination.total_pages, 2);
        assert_eq!(page.items.len(), 5);
    }
}
