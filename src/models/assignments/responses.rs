use super::entities::Assignment;
use serde::Serialize;
use ts_rs::TS;

// 作业创建成功响应，redirect 指向该作业的题目编辑页
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct CreateAssignmentResponse {
    pub assignment: Assignment,
    pub redirect: String,
}

// 作业详情响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct AssignmentResponse {
    pub assignment: Assignment,
}
