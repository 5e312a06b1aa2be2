use super::entities::Role;
use serde::Serialize;
use ts_rs::TS;

// 角色列表响应，供管理端建用户表单使用
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/role.ts")]
pub struct RoleListResponse {
    pub items: Vec<Role>,
}
