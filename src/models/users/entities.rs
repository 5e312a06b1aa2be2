use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 用户实体
//
// roles 为角色名集合，角色本身由 roles 表统一登记。
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub struct User {
    pub id: i64,
    pub name: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)] // 不序列化到JSON响应中
    #[ts(skip)]
    pub password_hash: String,
    pub birth_date: Option<String>,
    pub title: Option<String>,
    pub university_id: Option<String>,
    pub phone: Option<String>,
    pub image: Option<String>,
    pub roles: Vec<String>,
    pub last_login: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl User {
    /// 检查用户是否拥有指定角色
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// 检查用户是否拥有任意一个指定角色
    pub fn has_any_role(&self, roles: &[&str]) -> bool {
        roles.iter().any(|role| self.has_role(role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user(roles: Vec<String>) -> User {
        User {
            id: 1,
            name: "Jane Doe".to_string(),
            username: "jdoe".to_string(),
            email: "jdoe@example.com".to_string(),
            password_hash: "hash".to_string(),
            birth_date: None,
            title: None,
            university_id: None,
            phone: None,
            image: None,
            roles,
            last_login: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_has_role() {
        let user = sample_user(vec!["instructor".to_string()]);
        assert!(user.has_role("instructor"));
        assert!(!user.has_role("admin"));
        assert!(user.has_any_role(&["admin", "instructor"]));
        assert!(!user.has_any_role(&["admin"]));
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = sample_user(vec![]);
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("hash"));
    }
}
