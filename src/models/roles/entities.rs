use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 角色实体，来自 roles 注册表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/role.ts")]
pub struct Role {
    pub id: i64,
    pub name: String,
}

impl Role {
    pub const STUDENT: &'static str = "student";
    pub const INSTRUCTOR: &'static str = "instructor";
    pub const ADMIN: &'static str = "admin";

    /// 启动时写入 roles 表的内置角色
    pub fn builtin_names() -> &'static [&'static str] {
        &[Self::STUDENT, Self::INSTRUCTOR, Self::ADMIN]
    }
}
