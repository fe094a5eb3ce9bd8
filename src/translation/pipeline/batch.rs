//! 批次翻译编排
//!
//! 把去重后的字符串按固定大小切分成批次，依次交给翻译服务。
//!
//! ## 处理规则
//!
//! - 批次总数为 `ceil(n / batch_size)`，没有待翻译文本时不发起任何请求
//! - 每个批次发起请求前先报告进度
//! - 译文按位置与原文配对，成功的批次立即写入映射表；没有可用译文的位置写入原文
//! - 无法解析的响应在本地回退为原文，不中断编排
//! - 配额耗尽、重试耗尽以及其他错误都会终止编排，已写入的译文保留
//! - 相邻两个批次之间固定等待，最后一个批次之后不等待
//!
//! ```rust,ignore
//! let orchestrator = BatchOrchestrator::new(&translator, BatchConfig::default(), progress);
//! let mut map = TranslationMap::new();
//! let report = orchestrator.run(&strings, &mut map).await?;
//! println!("{} 个批次，回退 {} 条", report.completed_batches, report.fallback_count);
//! ```

use std::time::Duration;

use serde::Serialize;
use tokio::time::sleep;

use crate::translation::client::{TranslatedBatch, Translator};
use crate::translation::config::{constants, TranslationConfig};
use crate::translation::core::progress::ProgressReporter;
use crate::translation::error::{TranslationError, TranslationResult};
use crate::translation::pipeline::collector::UniqueStringSet;
use crate::translation::pipeline::map::TranslationMap;

/// 翻译批次
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch<'a> {
    /// 从 1 开始的批次序号
    pub index: usize,
    pub total: usize,
    pub texts: &'a [String],
}

/// 批次总数
pub fn total_batches(len: usize, batch_size: usize) -> usize {
    if batch_size == 0 {
        return 0;
    }
    len.div_ceil(batch_size)
}

/// 按固定大小切分，保持原有顺序
pub fn partition(texts: &[String], batch_size: usize) -> Vec<Batch<'_>> {
    let total = total_batches(texts.len(), batch_size);
    if total == 0 {
        return Vec::new();
    }
    texts
        .chunks(batch_size)
        .enumerate()
        .map(|(i, chunk)| Batch {
            index: i + 1,
            total,
            texts: chunk,
        })
        .collect()
}

/// 批次配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    pub batch_size: usize,
    pub batch_delay: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: constants::DEFAULT_BATCH_SIZE,
            batch_delay: constants::DEFAULT_BATCH_DELAY,
        }
    }
}

impl From<&TranslationConfig> for BatchConfig {
    fn from(config: &TranslationConfig) -> Self {
        Self {
            batch_size: config.batch_size,
            batch_delay: config.batch_delay(),
        }
    }
}

/// 编排结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestrationReport {
    pub total_batches: usize,
    pub completed_batches: usize,
    /// 得到有效译文的条数
    pub translated_strings: usize,
    /// 没有可用译文、以原文写入映射表的条数
    pub fallback_count: usize,
}

/// 批次编排器
pub struct BatchOrchestrator<'t, T> {
    translator: &'t T,
    config: BatchConfig,
    progress: ProgressReporter,
}

impl<'t, T: Translator> BatchOrchestrator<'t, T> {
    pub fn new(translator: &'t T, config: BatchConfig, progress: ProgressReporter) -> Self {
        Self {
            translator,
            config,
            progress,
        }
    }

    /// 依次翻译全部批次，成功的结果写入 `map`
    ///
    /// 出错时立即返回；此前批次的译文已经在 `map` 中。
    pub async fn run(
        &self,
        strings: &UniqueStringSet,
        map: &mut TranslationMap,
    ) -> TranslationResult<OrchestrationReport> {
        let batches = partition(strings.as_slice(), self.config.batch_size);
        let mut report = OrchestrationReport {
            total_batches: batches.len(),
            ..OrchestrationReport::default()
        };

        if batches.is_empty() {
            tracing::info!("没有需要翻译的文本");
            return Ok(report);
        }

        tracing::info!(
            "开始批次翻译: {} 条文本，{} 个批次，每批 {} 条",
            strings.len(),
            report.total_batches,
            self.config.batch_size
        );

        for batch in &batches {
            self.progress.translating(
                batch.index,
                batch.total,
                format!("正在翻译第 {}/{} 批", batch.index, batch.total),
            );

            let result = match self.translator.translate(batch.texts).await {
                Ok(result) => result,
                Err(TranslationError::MalformedResponse(msg)) => {
                    tracing::warn!(
                        "第 {}/{} 批响应无法解析，保留原文: {}",
                        batch.index,
                        batch.total,
                        msg
                    );
                    TranslatedBatch::fallback(batch.texts.len())
                }
                Err(e) => {
                    tracing::error!("第 {}/{} 批翻译失败: {}", batch.index, batch.total, e);
                    return Err(e.with_context(format!("批次 {}/{}", batch.index, batch.total)));
                }
            };

            let aligned = align(batch.texts, result.texts);
            let fallbacks = aligned.iter().filter(|t| t.is_none()).count();
            if fallbacks > 0 {
                tracing::warn!(
                    "第 {}/{} 批有 {} 条文本没有可用译文，保留原文",
                    batch.index,
                    batch.total,
                    fallbacks
                );
            }

            let added = map.commit_batch(batch.texts, aligned);
            report.completed_batches += 1;
            report.translated_strings += batch.texts.len() - fallbacks;
            report.fallback_count += fallbacks;

            tracing::debug!(
                "第 {}/{} 批完成: 写入 {} 条，回退 {} 条",
                batch.index,
                batch.total,
                added,
                fallbacks
            );

            if batch.index < batch.total && !self.config.batch_delay.is_zero() {
                sleep(self.config.batch_delay).await;
            }
        }

        tracing::info!(
            "批次翻译完成: {}/{} 个批次，译文 {} 条，回退 {} 条",
            report.completed_batches,
            report.total_batches,
            report.translated_strings,
            report.fallback_count
        );
        Ok(report)
    }
}

/// 按位置把译文与原文对齐
///
/// 缺失、空白或与原文相同的位置视为没有译文，多余的条目丢弃。
fn align(originals: &[String], translated: Vec<Option<String>>) -> Vec<Option<String>> {
    let mut translated = translated.into_iter();
    originals
        .iter()
        .map(|original| {
            translated
                .next()
                .flatten()
                .filter(|t| !t.trim().is_empty() && t != original)
        })
        .collect()
}
