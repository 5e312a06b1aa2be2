//! multipart/form-data 读取
//!
//! 表单先整体缓冲到内存，校验全部通过之前不落盘，
//! 校验失败时请求不产生任何副作用。

use std::collections::BTreeMap;
use std::path::Path;

use actix_multipart::Multipart;
use futures_util::TryStreamExt;
use futures_util::stream::StreamExt;

/// 已缓冲的上传文件
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub original_name: String,
    /// 扩展名，含点号，小写，如 ".pdf"；无扩展名时为空串
    pub extension: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl UploadedFile {
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// 读取失败原因
#[derive(Debug)]
pub enum FormReadError {
    /// 单个文件超过了全局缓冲上限
    FileSizeExceeded { field: String },
    Malformed(String),
}

impl std::fmt::Display for FormReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormReadError::FileSizeExceeded { field } => {
                write!(f, "file field '{field}' exceeds the size limit")
            }
            FormReadError::Malformed(msg) => write!(f, "malformed multipart payload: {msg}"),
        }
    }
}

/// 已缓冲的表单内容
#[derive(Debug, Default)]
pub struct FormPayload {
    fields: BTreeMap<String, Vec<String>>,
    files: BTreeMap<String, UploadedFile>,
}

impl FormPayload {
    /// 取文本字段的第一个值
    pub fn first(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// 取文本字段的全部值（`role[]` 风格的重复键已归并到 `role`）
    pub fn all(&self, name: &str) -> &[String] {
        self.fields.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files.get(name)
    }

    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name)
    }

    #[cfg(test)]
    pub(crate) fn insert_field(&mut self, name: &str, value: &str) {
        self.fields
            .entry(normalize_field_name(name))
            .or_default()
            .push(value.to_string());
    }

    #[cfg(test)]
    pub(crate) fn insert_file(&mut self, name: &str, file: UploadedFile) {
        self.files.insert(name.to_string(), file);
    }
}

/// `role[]` -> `role`
fn normalize_field_name(name: &str) -> String {
    name.strip_suffix("[]").unwrap_or(name).to_string()
}

fn extension_of(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_lowercase()))
        .unwrap_or_default()
}

/// 将 multipart 表单整体读入内存
///
/// 单个文件超过 `max_file_size` 时立即终止读取，调用方不应继续使用该请求。
pub async fn read_form(
    payload: &mut Multipart,
    max_file_size: usize,
) -> Result<FormPayload, FormReadError> {
    let mut form = FormPayload::default();

    while let Ok(Some(mut field)) = payload.try_next().await {
        let content_disposition = field.content_disposition();
        let name = content_disposition
            .and_then(|cd| cd.get_name())
            .unwrap_or_default()
            .to_string();
        let file_name = content_disposition
            .and_then(|cd| cd.get_filename())
            .map(|s| s.to_string());

        if name.is_empty() {
            continue;
        }

        match file_name {
            // 浏览器对未选择的文件字段会发送空文件名，按字段缺失处理
            Some(file_name) if !file_name.is_empty() => {
                let content_type = field
                    .content_type()
                    .map(|ct| ct.to_string())
                    .unwrap_or_default();

                let mut data: Vec<u8> = Vec::new();
                while let Some(chunk) = field.next().await {
                    let chunk =
                        chunk.map_err(|e| FormReadError::Malformed(e.to_string()))?;
                    if data.len() + chunk.len() > max_file_size {
                        return Err(FormReadError::FileSizeExceeded { field: name });
                    }
                    data.extend_from_slice(&chunk);
                }

                let extension = extension_of(&file_name);
                form.files.insert(
                    name,
                    UploadedFile {
                        original_name: file_name,
                        extension,
                        content_type,
                        data,
                    },
                );
            }
            _ => {
                let mut data: Vec<u8> = Vec::new();
                while let Some(chunk) = field.next().await {
                    let chunk =
                        chunk.map_err(|e| FormReadError::Malformed(e.to_string()))?;
                    // 文本字段也受同一上限约束
                    if data.len() + chunk.len() > max_file_size {
                        return Err(FormReadError::FileSizeExceeded { field: name });
                    }
                    data.extend_from_slice(&chunk);
                }
                let value = String::from_utf8_lossy(&data).to_string();
                form.fields
                    .entry(normalize_field_name(&name))
                    .or_default()
                    .push(value);
            }
        }
    }

    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_name_normalization() {
        assert_eq!(normalize_field_name("role[]"), "role");
        assert_eq!(normalize_field_name("role"), "role");
        assert_eq!(normalize_field_name("name"), "name");
    }

    #[test]
    fn test_extension_extraction() {
        assert_eq!(extension_of("homework.PDF"), ".pdf");
        assert_eq!(extension_of("photo.jpeg"), ".jpeg");
        assert_eq!(extension_of("no_extension"), "");
        assert_eq!(extension_of("archive.tar.gz"), ".gz");
    }

    #[test]
    fn test_form_payload_accessors() {
        let mut form = FormPayload::default();
        form.insert_field("name", "HW1");
        form.insert_field("role[]", "student");
        form.insert_field("role[]", "instructor");

        assert_eq!(form.first("name"), Some("HW1"));
        assert_eq!(form.all("role"), &["student", "instructor"]);
        assert!(form.all("missing").is_empty());
        assert!(form.file("pdf").is_none());
    }
}
