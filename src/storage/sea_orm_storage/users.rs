use super::{DbResultExt, SeaOrmStorage};
use crate::entity::prelude::UserRoles;
use crate::entity::users::{ActiveModel, Column, Entity as Users, Model as UserModel};
use crate::errors::Result;
use crate::models::{
    DEFAULT_PAGE_SIZE, PaginationInfo,
    users::{
        entities::User,
        requests::{NewUser, UserListQuery},
        responses::UserListResponse,
    },
};
use crate::utils::escape_like_pattern;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

impl SeaOrmStorage {
    /// 创建用户
    ///
    /// 新用户没有任何角色，角色由调用方通过 assign_role 关联。
    pub async fn create_user_impl(&self, user: NewUser) -> Result<User> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            name: Set(user.name),
            username: Set(user.username),
            email: Set(user.email),
            password_hash: Set(user.password_hash),
            birth_date: Set(user.birth_date),
            title: Set(user.title),
            university_id: Set(user.university_id),
            phone: Set(user.phone),
            image: Set(user.image),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model.insert(&self.db).await.db_context("创建用户失败")?;
        Ok(result.into_user(Vec::new()))
    }

    /// 通过 ID 获取用户
    pub async fn get_user_by_id_impl(&self, id: i64) -> Result<Option<User>> {
        let model = Users::find_by_id(id)
            .one(&self.db)
            .await
            .db_context("查询用户失败")?;
        self.with_roles(model).await
    }

    pub async fn get_user_by_username_impl(&self, username: &str) -> Result<Option<User>> {
        self.find_user_by(Column::Username, username).await
    }

    pub async fn get_user_by_email_impl(&self, email: &str) -> Result<Option<User>> {
        self.find_user_by(Column::Email, email).await
    }

    /// 分页列出用户，支持按角色过滤与关键字搜索
    pub async fn list_users_with_pagination_impl(
        &self,
        query: UserListQuery,
    ) -> Result<UserListResponse> {
        let page = query.page.unwrap_or(1).max(1) as u64;
        let size = query.size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, 100) as u64;

        let mut select = Users::find();

        // 角色筛选，未知角色名直接得到空列表
        if let Some(ref role) = query.role {
            match self.get_role_by_name_impl(role).await? {
                Some(role) => {
                    select = select
                        .inner_join(UserRoles)
                        .filter(crate::entity::user_roles::Column::RoleId.eq(role.id))
                        .distinct();
                }
                None => {
                    return Ok(UserListResponse {
                        items: Vec::new(),
                        pagination: PaginationInfo::from_counts(page, size, 0, 0),
                    });
                }
            }
        }

        // 搜索条件
        if let Some(ref search) = query.search
            && !search.trim().is_empty()
        {
            let escaped = escape_like_pattern(search.trim());
            select = select.filter(
                Condition::any()
                    .add(Column::Name.contains(&escaped))
                    .add(Column::Username.contains(&escaped))
                    .add(Column::Email.contains(&escaped)),
            );
        }

        let paginator = select
            .order_by_desc(Column::CreatedAt)
            .paginate(&self.db, size);
        let total = paginator.num_items().await.db_context("查询用户总数失败")?;
        let pages = paginator.num_pages().await.db_context("查询用户页数失败")?;
        let users = paginator
            .fetch_page(page - 1)
            .await
            .db_context("查询用户列表失败")?;

        // 当前页用户的角色一次性查出
        let ids: Vec<i64> = users.iter().map(|m| m.id).collect();
        let mut role_names = self.role_names_by_user_ids_impl(&ids).await?;

        Ok(UserListResponse {
            items: users
                .into_iter()
                .map(|m| {
                    let roles = role_names.remove(&m.id).unwrap_or_default();
                    m.into_user(roles)
                })
                .collect(),
            pagination: PaginationInfo::from_counts(page, size, total, pages),
        })
    }

    /// 更新用户最后登录时间
    pub async fn update_last_login_impl(&self, id: i64) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();

        let result = Users::update_many()
            .col_expr(Column::LastLogin, sea_orm::sea_query::Expr::value(now))
            .filter(Column::Id.eq(id))
            .exec(&self.db)
            .await
            .db_context("更新最后登录时间失败")?;

        Ok(result.rows_affected > 0)
    }

    /// 统计用户数量
    pub async fn count_users_impl(&self) -> Result<u64> {
        Users::find().count(&self.db).await.db_context("统计用户数量失败")
    }

    /// 按单列等值条件查用户，用户名和邮箱两条路径共用
    async fn find_user_by(&self, column: Column, value: &str) -> Result<Option<User>> {
        let model = Users::find()
            .filter(column.eq(value))
            .one(&self.db)
            .await
            .db_context("查询用户失败")?;
        self.with_roles(model).await
    }

    /// 给查询结果附上角色名列表
    async fn with_roles(&self, model: Option<UserModel>) -> Result<Option<User>> {
        match model {
            Some(model) => {
                let roles = self.list_role_names_for_user_impl(model.id).await?;
                Ok(Some(model.into_user(roles)))
            }
            None => Ok(None),
        }
    }
}
