//! # 工具模块
//!
//! 输出文件命名：
//!
//! - 成功时写入 `<stem>_translated.xlsx`
//! - 失败但有部分译文时写入 `<stem>_partial.xlsx`

use std::path::{Path, PathBuf};

pub const TRANSLATED_SUFFIX: &str = "_translated";
pub const PARTIAL_SUFFIX: &str = "_partial";
pub const OUTPUT_EXTENSION: &str = "xlsx";

fn with_suffix(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "workbook".to_string());
    input.with_file_name(format!("{stem}{suffix}.{OUTPUT_EXTENSION}"))
}

/// 翻译结果的默认输出路径
pub fn translated_output_path(input: &Path) -> PathBuf {
    with_suffix(input, TRANSLATED_SUFFIX)
}

/// 部分翻译结果的输出路径
///
/// 指定了输出路径时以它为基准，否则以输入文件为基准。
pub fn partial_output_path(input: &Path, output: Option<&Path>) -> PathBuf {
    match output {
        Some(output) => with_suffix(output, PARTIAL_SUFFIX),
        None => with_suffix(input, PARTIAL_SUFFIX),
    }
}
