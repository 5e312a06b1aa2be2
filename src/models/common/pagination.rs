use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// 列表接口的默认每页条数，HTTP 层与存储层共用
pub const DEFAULT_PAGE_SIZE: i64 = 15;

// 分页查询参数
//
// 查询串里的数字以字符串形式到达，两个字段都接受字符串或数字。
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/pagination.ts")]
pub struct PaginationQuery {
    #[serde(
        default = "default_page",
        deserialize_with = "deserialize_string_to_i64"
    )]
    pub page: i64,
    #[serde(
        default = "default_size",
        deserialize_with = "deserialize_string_to_i64"
    )]
    pub size: i64,
}

// 分页响应信息
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/pagination.ts")]
pub struct PaginationInfo {
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl PaginationInfo {
    /// 从存储层的无符号计数构造
    pub fn from_counts(page: u64, page_size: u64, total: u64, total_pages: u64) -> Self {
        Self {
            page: page as i64,
            page_size: page_size as i64,
            total: total as i64,
            total_pages: total_pages as i64,
        }
    }
}

// 字符串或数字都解析为 i64
fn deserialize_string_to_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(i64),
        Text(String),
    }

    match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(n) => Ok(n),
        NumberOrText::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn default_page() -> i64 {
    1
}

fn default_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

impl Default for PaginationQuery {
    fn default() -> Self {
        Self {
            page: 1,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_string_and_number() {
        let query: PaginationQuery =
            serde_json::from_str(r#"{"page": "2", "size": 30}"#).unwrap();
        assert_eq!(query.page, 2);
        assert_eq!(query.size, 30);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let query: PaginationQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.page, 1);
        assert_eq!(query.size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_rejects_non_numeric_text() {
        assert!(serde_json::from_str::<PaginationQuery>(r#"{"page": "abc"}"#).is_err());
    }

    #[test]
    fn test_from_counts() {
        let info = PaginationInfo::from_counts(2, 15, 31, 3);
        assert_eq!(info.page, 2);
        assert_eq!(info.page_size, 15);
        assert_eq!(info.total, 31);
        assert_eq!(info.total_pages, 3);
    }
}
