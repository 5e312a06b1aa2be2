use std::collections::HashMap;

use super::{DbResultExt, SeaOrmStorage};
use crate::entity::prelude::{Roles, UserRoles};
use crate::entity::{roles, user_roles};
use crate::errors::Result;
use crate::models::roles::entities::Role;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

impl SeaOrmStorage {
    /// 列出全部角色
    pub async fn list_roles_impl(&self) -> Result<Vec<Role>> {
        let result = Roles::find()
            .order_by_asc(roles::Column::Id)
            .all(&self.db)
            .await
            .db_context("查询角色失败")?;

        Ok(result.into_iter().map(|m| m.into_role()).collect())
    }

    /// 通过名字获取角色
    pub async fn get_role_by_name_impl(&self, name: &str) -> Result<Option<Role>> {
        let result = Roles::find()
            .filter(roles::Column::Name.eq(name))
            .one(&self.db)
            .await
            .db_context("查询角色失败")?;

        Ok(result.map(|m| m.into_role()))
    }

    /// 创建角色
    pub async fn create_role_impl(&self, name: &str) -> Result<Role> {
        let model = roles::ActiveModel {
            name: Set(name.to_string()),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .db_context("创建角色失败")?;

        Ok(result.into_role())
    }

    /// 给用户关联角色，已关联时直接返回成功
    pub async fn assign_role_impl(&self, user_id: i64, role_id: i64) -> Result<()> {
        let existing = UserRoles::find()
            .filter(user_roles::Column::UserId.eq(user_id))
            .filter(user_roles::Column::RoleId.eq(role_id))
            .one(&self.db)
            .await
            .db_context("查询角色关联失败")?;

        if existing.is_some() {
            return Ok(());
        }

        let model = user_roles::ActiveModel {
            user_id: Set(user_id),
            role_id: Set(role_id),
            assigned_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        model
            .insert(&self.db)
            .await
            .db_context("关联角色失败")?;

        Ok(())
    }

    /// 列出用户持有的角色名，按关联先后排序
    pub async fn list_role_names_for_user_impl(&self, user_id: i64) -> Result<Vec<String>> {
        let rows = UserRoles::find()
            .filter(user_roles::Column::UserId.eq(user_id))
            .order_by_asc(user_roles::Column::Id)
            .find_also_related(Roles)
            .all(&self.db)
            .await
            .db_context("查询用户角色失败")?;

        Ok(rows
            .into_iter()
            .filter_map(|(_, role)| role.map(|r| r.name))
            .collect())
    }

    /// 批量查出一组用户的角色名，用于列表页避免逐个查询
    pub(crate) async fn role_names_by_user_ids_impl(
        &self,
        user_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<String>>> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = UserRoles::find()
            .filter(user_roles::Column::UserId.is_in(user_ids.to_vec()))
            .order_by_asc(user_roles::Column::Id)
            .find_also_related(Roles)
            .all(&self.db)
            .await
            .db_context("查询用户角色失败")?;

        let mut map: HashMap<i64, Vec<String>> = HashMap::new();
        for (link, role) in rows {
            if let Some(role) = role {
                map.entry(link.user_id).or_default().push(role.name);
            }
        }
        Ok(map)
    }
}
