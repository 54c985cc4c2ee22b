//! 发布数据打包 - 业务能力层
//!
//! 读取本地图片，识别类型，编码成页面可用的数据包

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use phf::phf_map;
use tracing::{debug, warn};

use crate::error::{AppError, FileError};
use crate::models::PublishBundle;

const OCTET_STREAM: &str = "application/octet-stream";

/// 扩展名 → MIME
static MIME_BY_EXTENSION: phf::Map<&'static str, &'static str> = phf_map! {
    "png" => "image/png",
    "jpg" => "image/jpeg",
    "jpeg" => "image/jpeg",
    "webp" => "image/webp",
};

/// MIME → 补全文件名时使用的扩展名
static EXTENSION_BY_MIME: phf::Map<&'static str, &'static str> = phf_map! {
    "image/png" => "png",
    "image/jpeg" => "jpg",
    "image/webp" => "webp",
};

fn mime_from_extension(file_name: &str) -> Option<&'static str> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| MIME_BY_EXTENSION.get(ext.to_lowercase().as_str()).copied())
}

/// 根据文件头识别图片类型
pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
        Some("image/png")
    } else if bytes.len() > 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else {
        None
    }
}

/// 文件头优先，其次看扩展名
pub fn detect_mime(file_name: &str, bytes: &[u8]) -> &'static str {
    sniff_mime(bytes)
        .or_else(|| mime_from_extension(file_name))
        .unwrap_or(OCTET_STREAM)
}

/// 文件名缺少与类型一致的扩展名时补上
pub fn normalize_file_name(file_name: &str, mime: &str) -> String {
    match EXTENSION_BY_MIME.get(mime) {
        Some(ext) if mime_from_extension(file_name) != Some(mime) => {
            format!("{}.{}", file_name, ext)
        }
        _ => file_name.to_string(),
    }
}

/// 读取单个文件
fn read_file(path: &Path) -> Result<Vec<u8>, AppError> {
    if !path.exists() {
        return Err(AppError::File(FileError::NotFound {
            path: path.display().to_string(),
        }));
    }
    std::fs::read(path).map_err(|e| AppError::file_read_failed(path.display().to_string(), e))
}

/// 把本地文件打包成 [`PublishBundle`]
///
/// 不存在或读取失败的文件记录警告后跳过，三个数组始终保持对齐。
pub fn build_bundle<P: AsRef<Path>>(
    title: impl Into<String>,
    description: impl Into<String>,
    paths: &[P],
) -> PublishBundle {
    let mut bundle = PublishBundle {
        title: title.into(),
        description: description.into(),
        ..Default::default()
    };

    for path in paths {
        let path = path.as_ref();
        let bytes = match read_file(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("跳过文件: {}", e);
                continue;
            }
        };

        let raw_name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        let mime = detect_mime(&raw_name, &bytes);
        let file_name = normalize_file_name(&raw_name, mime);
        debug!("打包文件: {} ({}, {} 字节)", file_name, mime, bytes.len());

        bundle.file_contents.push(STANDARD.encode(&bytes));
        bundle.file_names.push(file_name);
        bundle.file_mimes.push(mime.to_string());
    }

    bundle
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_sniff_magic_bytes() {
        assert_eq!(sniff_mime(&[0xFF, 0xD8, 0xFF, 0xE0]), Some("image/jpeg"));
        assert_eq!(sniff_mime(PNG_HEADER), Some("image/png"));
        assert_eq!(sniff_mime(b"RIFF\x00\x00\x00\x00WEBPVP8 "), Some("image/webp"));
        assert_eq!(sniff_mime(b"RIFF"), None);
    }

    #[test]
    fn test_extension_fallback() {
        assert_eq!(detect_mime("a.PNG", b"????"), "image/png");
        assert_eq!(detect_mime("a.jpeg", b"????"), "image/jpeg");
        assert_eq!(detect_mime("a.gif", b"????"), OCTET_STREAM);
        // 文件头优先于扩展名
        assert_eq!(detect_mime("a.png", &[0xFF, 0xD8, 0xFF]), "image/jpeg");
    }

    #[test]
    fn test_normalize_file_name() {
        assert_eq!(normalize_file_name("cover", "image/jpeg"), "cover.jpg");
        assert_eq!(normalize_file_name("cover.JPEG", "image/jpeg"), "cover.JPEG");
        assert_eq!(normalize_file_name("cover.png", "image/webp"), "cover.png.webp");
        assert_eq!(normalize_file_name("notes.txt", OCTET_STREAM), "notes.txt");
    }

    #[test]
    fn test_build_bundle_skips_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("image_1");
        std::fs::write(&png, PNG_HEADER).unwrap();
        let missing = dir.path().join("missing.jpg");

        let bundle = build_bundle("标题", "正文", &[png, missing]);
        assert!(bundle.is_aligned());
        assert_eq!(bundle.file_count(), 1);
        assert_eq!(bundle.file_names, vec!["image_1.png".to_string()]);
        assert_eq!(bundle.file_mimes, vec!["image/png".to_string()]);
        assert_eq!(STANDARD.decode(&bundle.file_contents[0]).unwrap(), PNG_HEADER);
    }
}
