use super::{DbResultExt, SeaOrmStorage};
use crate::entity::courses::{ActiveModel, Column, Entity as Courses};
use crate::entity::prelude::CourseGroups;
use crate::errors::Result;
use crate::models::{
    DEFAULT_PAGE_SIZE, PaginationInfo,
    courses::{
        entities::{Course, CourseGroup},
        requests::{CourseListQuery, CreateCourseRequest},
        responses::CourseListResponse,
    },
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryOrder, Set};

impl SeaOrmStorage {
    /// 创建课程
    pub async fn create_course_impl(&self, course: CreateCourseRequest) -> Result<Course> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            name: Set(course.name),
            description: Set(course.description),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .db_context("创建课程失败")?;

        Ok(result.into_course())
    }

    /// 通过 ID 获取课程
    pub async fn get_course_by_id_impl(&self, course_id: i64) -> Result<Option<Course>> {
        let result = Courses::find_by_id(course_id)
            .one(&self.db)
            .await
            .db_context("查询课程失败")?;

        Ok(result.map(|m| m.into_course()))
    }

    /// 分页列出课程
    pub async fn list_courses_with_pagination_impl(
        &self,
        query: CourseListQuery,
    ) -> Result<CourseListResponse> {
        let page = query.page.unwrap_or(1).max(1) as u64;
        let size = query.size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, 100) as u64;

        let paginator = Courses::find()
            .order_by_desc(Column::CreatedAt)
            .paginate(&self.db, size);

        let total = paginator
            .num_items()
            .await
            .db_context("查询课程总数失败")?;

        let pages = paginator
            .num_pages()
            .await
            .db_context("查询课程页数失败")?;

        let courses = paginator
            .fetch_page(page - 1)
            .await
            .db_context("查询课程列表失败")?;

        Ok(CourseListResponse {
            items: courses.into_iter().map(|m| m.into_course()).collect(),
            pagination: PaginationInfo::from_counts(page, size, total, pages),
        })
    }

    /// 通过 ID 获取课程分组
    pub async fn get_group_by_id_impl(&self, group_id: i64) -> Result<Option<CourseGroup>> {
        let result = CourseGroups::find_by_id(group_id)
            .one(&self.db)
            .await
            .db_context("查询课程分组失败")?;

        Ok(result.map(|m| m.into_course_group()))
    }
}
