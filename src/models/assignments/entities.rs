use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 作业实体
//
// pdf 保存的是派生后的存储文件名，不含路径。
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct Assignment {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub start_time: chrono::DateTime<chrono::Utc>,
    pub end_time: chrono::DateTime<chrono::Utc>,
    pub late_time: chrono::DateTime<chrono::Utc>,
    pub max_submissions: i32,
    pub grade: f64,
    pub course_id: i64,
    pub group_id: Option<i64>,
    pub pdf: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
