//! 统一错误类型
//!
//! 服务内部错误统一收敛到 `CourseHubError`，HTTP 层在边界处再翻译成
//! ApiResponse 的数字错误码。宏生成变体、编号和便捷构造函数。

use std::fmt;

macro_rules! coursehub_errors {
    ($($variant:ident => $code:literal, $label:literal;)*) => {
        #[derive(Debug, Clone)]
        pub enum CourseHubError {
            $($variant(String),)*
        }

        impl CourseHubError {
            /// 错误编号，出现在日志里方便检索
            pub fn code(&self) -> &'static str {
                match self {
                    $(Self::$variant(_) => $code,)*
                }
            }

            /// 错误类别的可读名称
            pub fn label(&self) -> &'static str {
                match self {
                    $(Self::$variant(_) => $label,)*
                }
            }

            /// 具体出错原因
            pub fn message(&self) -> &str {
                match self {
                    $(Self::$variant(msg) => msg,)*
                }
            }
        }

        paste::paste! {
            impl CourseHubError {
                $(
                    pub fn [<$variant:snake>]<T: Into<String>>(msg: T) -> Self {
                        Self::$variant(msg.into())
                    }
                )*
            }
        }
    };
}

coursehub_errors! {
    Validation => "E001", "Validation Error";
    Authentication => "E002", "Authentication Error";
    Authorization => "E003", "Authorization Error";
    NotFound => "E004", "Resource Not Found";
    DatabaseConfig => "E005", "Database Configuration Error";
    DatabaseConnection => "E006", "Database Connection Error";
    DatabaseOperation => "E007", "Database Operation Error";
    FileOperation => "E008", "File Operation Error";
    DateParse => "E009", "Date Parse Error";
    Serialization => "E010", "Serialization Error";
    CacheConnection => "E011", "Cache Connection Error";
    CachePluginNotFound => "E012", "Cache Plugin Not Found";
    StoragePluginNotFound => "E013", "Storage Plugin Not Found";
}

impl fmt::Display for CourseHubError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.label(), self.code(), self.message())
    }
}

impl std::error::Error for CourseHubError {}

macro_rules! from_error {
    ($source:ty => $variant:ident) => {
        impl From<$source> for CourseHubError {
            fn from(err: $source) -> Self {
                CourseHubError::$variant(err.to_string())
            }
        }
    };
}

from_error!(sea_orm::DbErr => DatabaseOperation);
from_error!(std::io::Error => FileOperation);
from_error!(serde_json::Error => Serialization);
from_error!(chrono::ParseError => DateParse);

pub type Result<T> = std::result::Result<T, CourseHubError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_constructors() {
        let err = CourseHubError::validation("bad input");
        assert!(matches!(err, CourseHubError::Validation(_)));
        assert_eq!(err.message(), "bad input");

        assert_eq!(CourseHubError::cache_connection("x").code(), "E011");
        assert_eq!(CourseHubError::database_operation("x").code(), "E007");
    }

    #[test]
    fn test_display_includes_label_and_message() {
        let err = CourseHubError::authentication("token expired");
        let text = err.to_string();
        assert!(text.contains("Authentication Error"));
        assert!(text.contains("E002"));
        assert!(text.contains("token expired"));
    }

    #[test]
    fn test_from_db_err() {
        let db_err = sea_orm::DbErr::Custom("boom".into());
        let err: CourseHubError = db_err.into();
        assert!(matches!(err, CourseHubError::DatabaseOperation(_)));
        assert!(err.message().contains("boom"));
    }
}
