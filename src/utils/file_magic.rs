//! 按魔术字节校验上传内容
//!
//! 扩展名来自用户提交的文件名，不可信。上传白名单里的每种类型都在这里
//! 登记真实文件头，内容对不上一律拒绝。

/// 允许上传的类型与其文件头候选
const SIGNATURES: &[(&str, &[&[u8]])] = &[
    (".pdf", &[b"%PDF"]),
    (".png", &[&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]]),
    (".jpg", &[&[0xFF, 0xD8, 0xFF]]),
    (".jpeg", &[&[0xFF, 0xD8, 0xFF]]),
    (".gif", &[b"GIF87a", b"GIF89a"]),
];

/// 文件头是否与扩展名声明的类型一致，未登记的类型一律拒绝
pub fn validate_magic_bytes(data: &[u8], extension: &str) -> bool {
    let ext = extension.to_ascii_lowercase();

    // webp 的文件头分两段（RIFF....WEBP）
    if ext == ".webp" {
        return data.len() >= 12 && &data[..4] == b"RIFF" && &data[8..12] == b"WEBP";
    }

    SIGNATURES
        .iter()
        .find(|(registered, _)| *registered == ext)
        .is_some_and(|(_, heads)| heads.iter().any(|head| data.starts_with(head)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEAD: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_registered_types_accept_their_headers() {
        assert!(validate_magic_bytes(b"%PDF-1.7 rest", ".pdf"));
        assert!(validate_magic_bytes(&PNG_HEAD, ".png"));
        assert!(validate_magic_bytes(&[0xFF, 0xD8, 0xFF, 0xE1], ".jpeg"));
        assert!(validate_magic_bytes(b"GIF87a......", ".gif"));
        assert!(validate_magic_bytes(b"GIF89a......", ".gif"));
    }

    #[test]
    fn test_extension_must_match_content() {
        assert!(!validate_magic_bytes(&PNG_HEAD, ".jpg"));
        assert!(!validate_magic_bytes(&[0xFF, 0xD8, 0xFF], ".png"));
        assert!(!validate_magic_bytes(b"%PDF-1.7", ".gif"));
    }

    #[test]
    fn test_webp_needs_both_markers() {
        let mut webp = Vec::from(*b"RIFF");
        webp.extend_from_slice(&[0x10, 0x00, 0x00, 0x00]);
        webp.extend_from_slice(b"WEBP");
        assert!(validate_magic_bytes(&webp, ".webp"));

        let mut avi = Vec::from(*b"RIFF");
        avi.extend_from_slice(&[0x10, 0x00, 0x00, 0x00]);
        avi.extend_from_slice(b"AVI ");
        assert!(!validate_magic_bytes(&avi, ".webp"));
        assert!(!validate_magic_bytes(b"RIFFWEBP", ".webp"));
    }

    #[test]
    fn test_extension_case_is_ignored() {
        assert!(validate_magic_bytes(&PNG_HEAD, ".PNG"));
        assert!(validate_magic_bytes(b"%PDF", ".Pdf"));
    }

    #[test]
    fn test_empty_and_unregistered_rejected() {
        assert!(!validate_magic_bytes(&[], ".png"));
        assert!(!validate_magic_bytes(&[], ".pdf"));
        assert!(!validate_magic_bytes(b"MZ\x90\x00", ".exe"));
        assert!(!validate_magic_bytes(b"<svg>", ".svg"));
    }
}
