//! 注册与建号共用的字段校验规则
//!
//! 错误文案随 422 响应原样返回给前端，保持完整句子。

use once_cell::sync::Lazy;
use regex::Regex;

const NAME_MIN_CHARS: usize = 6;
const NAME_MAX_CHARS: usize = 255;
const USERNAME_LEN: std::ops::RangeInclusive<usize> = 3..=32;
const PASSWORD_MIN_BYTES: usize = 6;

/// 直接拒绝的常见弱密码，大小写不敏感
const WEAK_PASSWORDS: &[&str] = &[
    "password",
    "password1",
    "123456",
    "12345678",
    "123456789",
    "qwerty",
    "qwerty123",
    "abc123",
    "admin123",
    "111111",
];

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("Invalid username regex"));

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[A-Za-z]{2,}$").expect("Invalid email regex"));

/// 自助注册时展示名的长度要求，按字符数而不是字节数算
pub fn validate_name(name: &str) -> Result<(), &'static str> {
    match name.chars().count() {
        n if n < NAME_MIN_CHARS => Err("The name must be at least 6 characters."),
        n if n > NAME_MAX_CHARS => Err("The name may not be greater than 255 characters."),
        _ => Ok(()),
    }
}

pub fn validate_username(username: &str) -> Result<(), &'static str> {
    if !USERNAME_LEN.contains(&username.len()) {
        return Err("Username length must be between 3 and 32 characters");
    }
    if !USERNAME_RE.is_match(username) {
        return Err("Username must contain only letters, numbers, underscores or hyphens");
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if EMAIL_RE.is_match(email) {
        Ok(())
    } else {
        Err("Email format is invalid")
    }
}

/// 密码策略验证结果，错误可能不止一条
#[derive(Debug, Clone)]
pub struct PasswordValidationResult {
    pub is_valid: bool,
    pub errors: Vec<&'static str>,
}

impl PasswordValidationResult {
    pub fn error_message(&self) -> String {
        self.errors.join("; ")
    }
}

/// 密码策略：至少 6 字节，且不在弱密码表里
pub fn validate_password(password: &str) -> PasswordValidationResult {
    let mut errors = Vec::new();

    if password.len() < PASSWORD_MIN_BYTES {
        errors.push("The password must be at least 6 characters.");
    }

    if WEAK_PASSWORDS
        .iter()
        .any(|weak| password.eq_ignore_ascii_case(weak))
    {
        errors.push("Password is too common, please choose a stronger password");
    }

    PasswordValidationResult {
        is_valid: errors.is_empty(),
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_password() {
        assert!(validate_password("secret1").is_valid);
        assert!(validate_password("SecureP@ss1").is_valid);
        assert!(validate_password("hunter2x").is_valid);
    }

    #[test]
    fn test_short_password() {
        let result = validate_password("Ab1");
        assert!(!result.is_valid);
        assert!(
            result
                .errors
                .contains(&"The password must be at least 6 characters.")
        );
    }

    #[test]
    fn test_common_password() {
        let result = validate_password("password1");
        assert!(!result.is_valid);
        assert!(
            result
                .errors
                .contains(&"Password is too common, please choose a stronger password")
        );
        assert!(!validate_password("QWERTY123").is_valid);
    }

    #[test]
    fn test_username_rules() {
        assert!(validate_username("jdoe").is_ok());
        assert!(validate_username("user_name-1").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("bad name").is_err());
        assert!(validate_username(&"x".repeat(33)).is_err());
    }

    #[test]
    fn test_name_rules() {
        assert!(validate_name("Jane Doe").is_ok());
        assert!(validate_name("Jane").is_err());
        assert!(validate_name(&"x".repeat(256)).is_err());
    }

    #[test]
    fn test_email_rules() {
        assert!(validate_email("jdoe@example.com").is_ok());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("user@no-tld").is_err());
        assert!(validate_email("two words@example.com").is_err());
    }
}
