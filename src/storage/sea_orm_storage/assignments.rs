use super::{DbResultExt, SeaOrmStorage};
use crate::entity::assignments::{ActiveModel, Entity as Assignments};
use crate::errors::Result;
use crate::models::assignments::{entities::Assignment, requests::NewAssignment};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};

impl SeaOrmStorage {
    /// 创建作业
    ///
    /// 外键有效性由调用方校验，这里只负责落库。
    pub async fn create_assignment_impl(&self, assignment: NewAssignment) -> Result<Assignment> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            name: Set(assignment.name),
            description: Set(assignment.description),
            start_time: Set(assignment.start_time),
            end_time: Set(assignment.end_time),
            late_time: Set(assignment.late_time),
            max_submissions: Set(assignment.max_submissions),
            grade: Set(assignment.grade),
            course_id: Set(assignment.course_id),
            group_id: Set(assignment.group_id),
            pdf: Set(assignment.pdf),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .db_context("创建作业失败")?;

        Ok(result.into_assignment())
    }

    /// 通过 ID 获取作业
    pub async fn get_assignment_by_id_impl(&self, assignment_id: i64) -> Result<Option<Assignment>> {
        let result = Assignments::find_by_id(assignment_id)
            .one(&self.db)
            .await
            .db_context("查询作业失败")?;

        Ok(result.map(|m| m.into_assignment()))
    }
}
