//! 工作簿文档包
//!
//! `.xlsx` 文件是一个 ZIP 容器，每个成员称为一个部件（part）。
//! 这里只把它当作“名称到字节”的有序集合：读取、替换、重新打包，
//! 不解析工作簿对象模型。

use std::collections::HashMap;
use std::io::{Cursor, Read, Write};

use zip::write::FileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

use crate::translation::config::constants;
use crate::translation::error::{TranslationError, TranslationResult};

/// 解压限制，防止 ZIP 炸弹
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackageLimits {
    /// 单个部件解压后的最大字节数
    pub max_part_bytes: u64,
    /// 整个文档包解压后的最大字节数
    pub max_total_bytes: u64,
}

impl Default for PackageLimits {
    fn default() -> Self {
        Self {
            max_part_bytes: constants::MAX_PART_BYTES,
            max_total_bytes: constants::MAX_PACKAGE_BYTES,
        }
    }
}

/// 内存中的文档包
#[derive(Debug, Clone, Default)]
pub struct ArchivePackage {
    /// 按原始顺序保存的部件
    parts: Vec<(String, Vec<u8>)>,
    /// 部件名到下标的索引
    index: HashMap<String, usize>,
}

impl ArchivePackage {
    /// 从字节加载文档包
    pub fn load(bytes: &[u8]) -> TranslationResult<Self> {
        Self::load_limited(bytes, PackageLimits::default())
    }

    /// 按给定限制加载文档包
    pub fn load_limited(bytes: &[u8], limits: PackageLimits) -> TranslationResult<Self> {
        let mut zip = ZipArchive::new(Cursor::new(bytes))?;

        let mut package = Self::default();
        let mut total: u64 = 0;
        for i in 0..zip.len() {
            let mut file = zip.by_index(i)?;
            if !file.is_file() {
                continue;
            }

            let name = file.name().to_string();
            if file.size() > limits.max_part_bytes {
                return Err(part_too_large(&name, file.size(), limits.max_part_bytes));
            }

            // 声明的大小可能是伪造的，读取时再限制一次
            let mut buf = Vec::new();
            (&mut file)
                .take(limits.max_part_bytes + 1)
                .read_to_end(&mut buf)
                .map_err(|e| {
                    TranslationError::ArchiveLoadError(format!("读取部件 {} 失败: {}", name, e))
                })?;
            let size = buf.len() as u64;
            if size > limits.max_part_bytes {
                return Err(part_too_large(&name, size, limits.max_part_bytes));
            }

            total = total.saturating_add(size);
            if total > limits.max_total_bytes {
                return Err(TranslationError::ArchiveLoadError(format!(
                    "文档包解压后超过 {} 字节上限",
                    limits.max_total_bytes
                )));
            }

            package.insert(name, buf);
        }

        tracing::debug!("文档包加载完成，共 {} 个部件", package.parts.len());
        Ok(package)
    }

    /// 以文本形式读取部件，不存在或不是 UTF-8 时返回 `None`
    pub fn part(&self, name: &str) -> Option<&str> {
        self.part_bytes(name)
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
    }

    /// 读取部件原始字节
    pub fn part_bytes(&self, name: &str) -> Option<&[u8]> {
        self.index
            .get(name)
            .map(|&i| self.parts[i].1.as_slice())
    }

    /// 替换部件内容，不存在时追加
    pub fn set_part(&mut self, name: &str, text: impl Into<String>) {
        self.insert(name.to_string(), text.into().into_bytes());
    }

    /// 按原始顺序列出所有部件名
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// 序列化为 ZIP 字节
    ///
    /// 使用固定的压缩方式和时间戳，相同内容得到相同输出。
    pub fn serialize(&self) -> TranslationResult<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::<()>::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default());

        for (name, bytes) in &self.parts {
            zip.start_file(name.as_str(), options).map_err(|e| {
                TranslationError::ArchiveWriteError(format!("写入部件 {} 失败: {}", name, e))
            })?;
            zip.write_all(bytes)?;
        }

        let cursor = zip
            .finish()
            .map_err(|e| TranslationError::ArchiveWriteError(e.to_string()))?;
        Ok(cursor.into_inner())
    }

    fn insert(&mut self, name: String, bytes: Vec<u8>) {
        match self.index.get(&name) {
            Some(&i) => self.parts[i].1 = bytes,
            None => {
                self.index.insert(name.clone(), self.parts.len());
                self.parts.push((name, bytes));
            }
        }
    }
}

fn part_too_large(name: &str, size: u64, max: u64) -> TranslationError {
    TranslationError::ArchiveLoadError(format!(
        "部件 {} 解压后大小 {} 超过上限 {}",
        name, size, max
    ))
}
