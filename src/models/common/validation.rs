use std::collections::BTreeMap;

use serde::Serialize;
use ts_rs::TS;

// 表单校验错误，字段名 -> 错误信息
//
// BTreeMap 保证序列化顺序稳定，便于前端与测试断言。
// 同一字段只保留第一条错误。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, TS)]
#[serde(transparent)]
#[ts(export, export_to = "../frontend/src/types/generated/validation.ts")]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一条字段错误，已有错误的字段不覆盖
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_error_wins() {
        let mut errors = FieldErrors::new();
        errors.add("email", "The email field is required.");
        errors.add("email", "The email must be a valid email address.");
        assert_eq!(errors.get("email"), Some("The email field is required."));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_serializes_as_plain_map() {
        let mut errors = FieldErrors::new();
        errors.add("name", "The name field is required.");
        let json = serde_json::to_string(&errors).unwrap();
        assert_eq!(json, r#"{"name":"The name field is required."}"#);
    }
}
