//! 封面存储模块
//! 负责封面图片的等比压缩与落盘，记录中只保存相对路径

use base64::{engine::general_purpose::STANDARD, Engine};
use image::codecs::jpeg::JpegEncoder;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs;

/// 添加书籍时封面的最大尺寸
pub const MAX_COVER_WIDTH: u32 = 200;
pub const MAX_COVER_HEIGHT: u32 = 300;

/// JPEG 重编码质量（对应原始实现的 0.7）
const JPEG_QUALITY: u8 = 70;

/// 封面处理错误
#[derive(Debug)]
pub enum CoverError {
    /// 输入无法解码为图片
    Decode(String),
    Encode(String),
    Io(String),
}

impl std::fmt::Display for CoverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoverError::Decode(e) => write!(f, "图片解码失败: {}", e),
            CoverError::Encode(e) => write!(f, "图片编码失败: {}", e),
            CoverError::Io(e) => write!(f, "封面文件读写失败: {}", e),
        }
    }
}

impl std::error::Error for CoverError {}

/// 封面文件根目录（基于应用数据目录）
pub fn cover_root(app_data_dir: &Path) -> PathBuf {
    app_data_dir.join("covers")
}

/// 计算文档路径与封面内容的哈希值（用于生成稳定的封面文件名）
/// 把封面字节混入哈希，同一文档配不同封面时互不覆盖
fn compute_cover_hash(file_path: &str, cover_bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(file_path.as_bytes());
    hasher.update(cover_bytes);
    let result = hasher.finalize();
    // 取前16个字符
    format!("{:x}", result)[..16].to_string()
}

/// 生成封面文件的相对路径，格式如 a1b2c3d4e5f6a7b8.jpg
pub fn cover_relative_path(file_path: &str, cover_bytes: &[u8]) -> String {
    format!("{}.jpg", compute_cover_hash(file_path, cover_bytes))
}

/// 获取封面文件的完整路径（用于前端 asset 协议访问）
pub fn cover_full_path(app_data_dir: &Path, relative_path: &str) -> PathBuf {
    cover_root(app_data_dir).join(relative_path)
}

/// 等比缩放后的目标尺寸
/// 宽为长边时按最大宽度收缩，否则按最大高度收缩；两边都在界内时原样返回
pub fn fit_dimensions(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width > height {
        if width > max_width {
            let factor = max_width as f64 / width as f64;
            return (max_width, (height as f64 * factor).round() as u32);
        }
    } else if height > max_height {
        let factor = max_height as f64 / height as f64;
        return ((width as f64 * factor).round() as u32, max_height);
    }
    (width, height)
}

/// 将图片字节等比压缩到给定边界内，重编码为 JPEG
/// 全图缩放，不裁剪不加边；无法解码的输入返回错误
pub fn downscale_image(bytes: &[u8], max_width: u32, max_height: u32) -> Result<Vec<u8>, CoverError> {
    let img = image::load_from_memory(bytes).map_err(|e| CoverError::Decode(e.to_string()))?;

    let (width, height) = (img.width(), img.height());
    let (target_w, target_h) = fit_dimensions(width, height, max_width, max_height);

    let resized = if (target_w, target_h) == (width, height) {
        img
    } else {
        img.resize_exact(target_w, target_h, image::imageops::FilterType::Triangle)
    };

    let rgb = resized.to_rgb8();
    let mut buffer = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY);
    encoder
        .encode(rgb.as_raw(), rgb.width(), rgb.height(), image::ColorType::Rgb8)
        .map_err(|e| CoverError::Encode(e.to_string()))?;

    Ok(buffer)
}

/// 判断封面来源字符串是否为 data URL 格式
pub fn is_data_url(source: &str) -> bool {
    source.starts_with("data:")
}

/// 判断封面来源字符串是否为纯 Base64 数据（而非文件路径）
/// 判断规则：长度超过 200 且只包含 Base64 字符集
pub fn is_base64_cover(source: &str) -> bool {
    if is_data_url(source) {
        return false; // data URL 单独处理
    }

    // 太短的不可能是有效的图片 Base64
    if source.len() < 200 {
        return false;
    }

    source
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '/' || c == '=')
}

/// 从 data URL 或纯 Base64 字符串中提取图片数据
fn extract_image_data(source: &str) -> Result<Vec<u8>, CoverError> {
    let base64_str = if is_data_url(source) {
        // data URL 格式：data:image/jpeg;base64,xxxxx
        source
            .split(',')
            .nth(1)
            .ok_or_else(|| CoverError::Decode("Invalid data URL format".to_string()))?
    } else {
        source
    };

    STANDARD
        .decode(base64_str)
        .map_err(|e| CoverError::Decode(format!("Base64 decode error: {}", e)))
}

/// 读取前端递交的封面来源
/// 来源可能是 data URL / Base64（webview 文件输入）或本地文件的绝对路径
pub async fn read_cover_source(source: &str) -> Result<Vec<u8>, CoverError> {
    if is_data_url(source) || is_base64_cover(source) {
        return extract_image_data(source);
    }

    fs::read(source)
        .await
        .map_err(|e| CoverError::Io(format!("读取封面文件失败 {}: {}", source, e)))
}

/// 压缩封面并写入 covers 目录，返回相对路径
pub async fn store_cover(
    app_data_dir: &Path,
    file_path: &str,
    source: &str,
) -> Result<String, CoverError> {
    let bytes = read_cover_source(source).await?;
    let downscaled = downscale_image(&bytes, MAX_COVER_WIDTH, MAX_COVER_HEIGHT)?;

    let relative_path = cover_relative_path(file_path, &bytes);
    let root = cover_root(app_data_dir);
    fs::create_dir_all(&root)
        .await
        .map_err(|e| CoverError::Io(format!("创建封面目录失败: {}", e)))?;

    fs::write(root.join(&relative_path), &downscaled)
        .await
        .map_err(|e| CoverError::Io(format!("写入封面文件失败: {}", e)))?;

    Ok(relative_path)
}

/// 删除封面文件
pub async fn delete_cover_file(app_data_dir: &Path, relative_path: &str) -> Result<(), CoverError> {
    let full_path = cover_full_path(app_data_dir, relative_path);
    if full_path.exists() {
        fs::remove_file(&full_path)
            .await
            .map_err(|e| CoverError::Io(format!("删除封面文件失败: {}", e)))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::DynamicImage::ImageRgb8(image::RgbImage::new(width, height));
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), image::ImageOutputFormat::Png)
            .unwrap();
        buffer
    }

    #[test]
    fn test_fit_dimensions_width_bound() {
        // 宽边超界：4000x2000 在 (200,300) 内收缩为 200x100
        assert_eq!(fit_dimensions(4000, 2000, 200, 300), (200, 100));
    }

    #[test]
    fn test_fit_dimensions_height_bound() {
        // 高边超界：300x600 在 (200,300) 内收缩为 150x300
        assert_eq!(fit_dimensions(300, 600, 200, 300), (150, 300));
    }

    #[test]
    fn test_fit_dimensions_pass_through() {
        // 两边都在界内时原样返回，不放大
        assert_eq!(fit_dimensions(100, 50, 200, 300), (100, 50));
        assert_eq!(fit_dimensions(150, 290, 200, 300), (150, 290));
    }

    #[test]
    fn test_downscale_resizes_wide_image() {
        let input = png_bytes(4000, 2000);
        let output = downscale_image(&input, 200, 300).unwrap();

        let decoded = image::load_from_memory(&output).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (200, 100));
    }

    #[test]
    fn test_downscale_keeps_small_image_dimensions() {
        let input = png_bytes(100, 50);
        let output = downscale_image(&input, 200, 300).unwrap();

        let decoded = image::load_from_memory(&output).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (100, 50));
    }

    #[test]
    fn test_downscale_rejects_undecodable_input() {
        let result = downscale_image(b"definitely not an image", 200, 300);
        assert!(matches!(result, Err(CoverError::Decode(_))));
    }

    #[test]
    fn test_is_base64_cover() {
        // 短字符串不是 Base64
        assert!(!is_base64_cover("a1b2c3d4e5f6a7b8.jpg"));
        assert!(!is_base64_cover(""));

        // data URL 不是纯 Base64（单独分类）
        assert!(!is_base64_cover("data:image/jpeg;base64,xxxx"));

        // 长的纯 Base64 字符串
        let long_base64 = "A".repeat(300);
        assert!(is_base64_cover(&long_base64));
    }

    #[test]
    fn test_cover_relative_path_is_stable() {
        let first = cover_relative_path("/path/to/book.pdf", b"cover bytes");
        let second = cover_relative_path("/path/to/book.pdf", b"cover bytes");
        assert_eq!(first, second);
        assert!(first.ends_with(".jpg"));
        assert_eq!(first.len(), 16 + 4);
    }

    #[test]
    fn test_cover_relative_path_differs_per_cover_content() {
        // 同一文档配不同封面时文件名不同，互不覆盖
        let first = cover_relative_path("/path/to/book.pdf", b"cover one");
        let second = cover_relative_path("/path/to/book.pdf", b"cover two");
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_store_cover_from_data_url() {
        let dir = tempfile::tempdir().unwrap();
        let data_url = format!("data:image/png;base64,{}", STANDARD.encode(png_bytes(400, 200)));

        let relative = store_cover(dir.path(), "/books/alpha.pdf", &data_url)
            .await
            .unwrap();

        let written = tokio::fs::read(cover_full_path(dir.path(), &relative))
            .await
            .unwrap();
        let decoded = image::load_from_memory(&written).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (200, 100));
    }

    #[tokio::test]
    async fn test_store_cover_same_document_different_covers_coexist() {
        let dir = tempfile::tempdir().unwrap();
        let mut colored = image::RgbImage::new(400, 200);
        colored.put_pixel(0, 0, image::Rgb([255, 0, 0]));
        let first_url = format!("data:image/png;base64,{}", STANDARD.encode(png_bytes(400, 200)));
        let second_png = {
            let img = image::DynamicImage::ImageRgb8(colored);
            let mut buffer = Vec::new();
            img.write_to(&mut Cursor::new(&mut buffer), image::ImageOutputFormat::Png)
                .unwrap();
            buffer
        };
        let second_url = format!("data:image/png;base64,{}", STANDARD.encode(second_png));

        // 同一文档路径重复添加，封面文件各自独立
        let first = store_cover(dir.path(), "/books/dup.pdf", &first_url)
            .await
            .unwrap();
        let second = store_cover(dir.path(), "/books/dup.pdf", &second_url)
            .await
            .unwrap();

        assert_ne!(first, second);
        assert!(cover_full_path(dir.path(), &first).exists());
        assert!(cover_full_path(dir.path(), &second).exists());
    }

    #[tokio::test]
    async fn test_delete_cover_file_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        // 不存在的封面文件删除不报错
        delete_cover_file(dir.path(), "missing.jpg").await.unwrap();
    }
}
