//! 失败后的部分结果输出

use crate::parsers::package::ArchivePackage;
use crate::translation::pipeline::map::TranslationMap;
use crate::translation::pipeline::rehydrator::Rehydrator;

/// 用已经得到的译文生成部分翻译的工作簿
///
/// 映射表为空时不生成。这里的任何失败只记录日志，调用方总是继续报告原始错误。
pub fn build_partial_artifact(mut package: ArchivePackage, map: &TranslationMap) -> Option<Vec<u8>> {
    if map.is_empty() {
        tracing::info!("没有已完成的译文，不生成部分结果");
        return None;
    }

    let report = Rehydrator::new(map).rehydrate(&mut package);
    match package.serialize() {
        Ok(bytes) => {
            tracing::info!(
                "已生成部分翻译结果: {} 条译文，替换 {} 个节点",
                map.len(),
                report.replacements
            );
            Some(bytes)
        }
        Err(e) => {
            tracing::warn!("部分结果生成失败，已忽略: {}", e);
            None
        }
    }
}
