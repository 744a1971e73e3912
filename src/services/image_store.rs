//! 图片落盘服务 - 业务能力层
//!
//! 只负责"把内联图片写成文件"能力，不关心题目流程

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::FileError;

/// 图片落盘服务
///
/// 终端无法直接显示 data URL，内联图片解码后写入目录，供受访者用看图工具打开
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    /// 使用指定目录创建
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 解码并写入一张内联图片
    ///
    /// # 参数
    /// - `stem`: 文件名（不含扩展名），如 `q1-A`
    /// - `mime`: 图片 MIME 类型，决定扩展名
    /// - `b64`: base64 内容
    ///
    /// # 返回
    /// 写入后的文件路径
    pub fn write_inline(&self, stem: &str, mime: &str, b64: &str) -> Result<PathBuf, FileError> {
        let bytes = STANDARD
            .decode(b64.trim())
            .map_err(|source| FileError::DecodeFailed {
                name: stem.to_string(),
                source,
            })?;

        fs::create_dir_all(&self.dir).map_err(|source| FileError::WriteFailed {
            path: self.dir.display().to_string(),
            source,
        })?;

        let path = self.dir.join(format!("{}.{}", stem, extension_for(mime)));
        fs::write(&path, &bytes).map_err(|source| FileError::WriteFailed {
            path: path.display().to_string(),
            source,
        })?;

        debug!("图片已写入: {} ({} 字节)", path.display(), bytes.len());

        Ok(path)
    }

    /// 删除上一组写入的图片（只处理 `q<N>-A` / `q<N>-B` 形式的文件）
    pub fn clear(&self) -> Result<(), FileError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(_) => return Ok(()),
        };

        for entry in entries.flatten() {
            let path = entry.path();
            let written_by_us = path
                .file_stem()
                .and_then(|s| s.to_str())
                .map(is_card_image_stem)
                .unwrap_or(false);
            if written_by_us && path.is_file() {
                fs::remove_file(&path).map_err(|source| FileError::WriteFailed {
                    path: path.display().to_string(),
                    source,
                })?;
            }
        }
        Ok(())
    }
}

fn is_card_image_stem(stem: &str) -> bool {
    let Some(rest) = stem.strip_prefix('q') else {
        return false;
    };
    match rest.split_once('-') {
        Some((index, side)) => {
            !index.is_empty()
                && index.chars().all(|c| c.is_ascii_digit())
                && matches!(side, "A" | "B")
        }
        None => false,
    }
}

fn extension_for(mime: &str) -> &'static str {
    match mime.trim().to_ascii_lowercase().as_str() {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/svg+xml" => "svg",
        _ => "bin",
    }
}
