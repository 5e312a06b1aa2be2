//! 上传文件的磁盘存储
//!
//! 存储名由所属对象的名字派生，附时间戳与随机后缀防止覆盖，
//! 数据库只保存返回的存储名。

use std::fs;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::config::AppConfig;
use crate::errors::{CourseHubError, Result};
use crate::utils::multipart::UploadedFile;

pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn from_config() -> Self {
        Self::new(&AppConfig::get().upload.dir)
    }

    /// 确保存储目录存在，服务启动时调用一次
    pub fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| CourseHubError::file_operation(format!("创建上传目录失败: {e}")))
    }

    /// 将已缓冲的文件写入磁盘，返回存储名
    ///
    /// `owner_key` 是文件所属对象的名字（如作业名、用户名），
    /// 存储名形如 `hw1-1706745600-3f2a9b1c.pdf`。
    pub fn store(&self, owner_key: &str, file: &UploadedFile) -> Result<String> {
        let stored_name = derive_stored_name(owner_key, &file.extension);
        let path = self.dir.join(&stored_name);
        fs::write(&path, &file.data)
            .map_err(|e| CourseHubError::file_operation(format!("写入文件失败: {e}")))?;
        Ok(stored_name)
    }

    /// 删除一个已存储的文件，失败只记日志
    pub fn remove(&self, stored_name: &str) {
        let path = self.dir.join(stored_name);
        if let Err(e) = fs::remove_file(&path) {
            tracing::warn!("删除文件 {} 失败: {}", path.display(), e);
        }
    }

    pub fn path_of(&self, stored_name: &str) -> PathBuf {
        self.dir.join(stored_name)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

fn derive_stored_name(owner_key: &str, extension: &str) -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}-{}{}",
        slug(owner_key),
        chrono::Utc::now().timestamp(),
        &uuid[..8],
        extension
    )
}

/// 文件名安全的 slug：小写、非字母数字折叠为连字符
fn slug(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut last_dash = true;
    for ch in value.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }
    let out = out.trim_end_matches('-').to_string();
    if out.is_empty() {
        "file".to_string()
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> FileStore {
        let dir = std::env::temp_dir().join(format!("coursehub-store-{}", Uuid::new_v4()));
        let store = FileStore::new(&dir);
        store.ensure_dir().unwrap();
        store
    }

    fn sample_pdf() -> UploadedFile {
        UploadedFile {
            original_name: "upload.pdf".to_string(),
            extension: ".pdf".to_string(),
            content_type: "application/pdf".to_string(),
            data: b"%PDF-1.4 test".to_vec(),
        }
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("HW1"), "hw1");
        assert_eq!(slug("Final Project (2024)"), "final-project-2024");
        assert_eq!(slug("___"), "file");
        assert_eq!(slug(""), "file");
    }

    #[test]
    fn test_store_writes_file_with_derived_name() {
        let store = temp_store();
        let name = store.store("HW1", &sample_pdf()).unwrap();

        assert!(name.starts_with("hw1-"));
        assert!(name.ends_with(".pdf"));
        assert!(store.path_of(&name).exists());
        assert_eq!(fs::read(store.path_of(&name)).unwrap(), b"%PDF-1.4 test");

        let _ = fs::remove_dir_all(store.dir());
    }

    #[test]
    fn test_store_twice_never_collides() {
        let store = temp_store();
        let first = store.store("HW1", &sample_pdf()).unwrap();
        let second = store.store("HW1", &sample_pdf()).unwrap();
        assert_ne!(first, second);

        let _ = fs::remove_dir_all(store.dir());
    }

    #[test]
    fn test_remove_missing_file_does_not_panic() {
        let store = temp_store();
        store.remove("not-there.pdf");

        let _ = fs::remove_dir_all(store.dir());
    }
}
