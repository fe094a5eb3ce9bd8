//! 工作簿翻译服务
//!
//! 串联整个流程：解析文档包、提取日文文本、分批翻译、回填译文、重新打包。
//! 翻译阶段之后的任何失败都会尝试用已完成的译文生成部分结果。
//!
//! ```rust,ignore
//! let service = XlsxTranslationService::from_config(config)?;
//! let (progress, mut updates) = ProgressReporter::channel();
//! match service.translate_package(&bytes, &progress).await {
//!     Ok(output) => std::fs::write("book_translated.xlsx", output.bytes)?,
//!     Err(failure) => {
//!         if let Some(partial) = failure.partial {
//!             std::fs::write("book_partial.xlsx", partial)?;
//!         }
//!     }
//! }
//! ```

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::task::{spawn_blocking, JoinError};

use crate::parsers::package::{ArchivePackage, PackageLimits};
use crate::translation::client::{HttpTranslator, RetryingTranslator, Translator};
use crate::translation::config::TranslationConfig;
use crate::translation::core::progress::ProgressReporter;
use crate::translation::core::recovery::build_partial_artifact;
use crate::translation::core::retry::RetryPolicy;
use crate::translation::error::{helpers, TranslationError, TranslationResult};
use crate::translation::pipeline::batch::{BatchConfig, BatchOrchestrator, OrchestrationReport};
use crate::translation::pipeline::collector::TextExtractor;
use crate::translation::pipeline::map::TranslationMap;
use crate::translation::pipeline::rehydrator::{RehydrationReport, Rehydrator};

/// 一次成功运行的结果
#[derive(Debug, Clone)]
pub struct TranslationOutput {
    /// 翻译后的工作簿
    pub bytes: Vec<u8>,
    /// 识别到的文本节点数
    pub occurrences: usize,
    /// 去重后的待翻译字符串数
    pub unique_strings: usize,
    pub orchestration: OrchestrationReport,
    pub rehydration: RehydrationReport,
}

/// 一次失败运行的结果
#[derive(Debug, Error)]
#[error("{error}")]
pub struct PipelineFailure {
    /// 导致终止的原始错误
    pub error: TranslationError,
    /// 部分翻译的工作簿（如果能生成）
    pub partial: Option<Vec<u8>>,
}

impl PipelineFailure {
    fn without_partial(error: TranslationError) -> Self {
        Self {
            error,
            partial: None,
        }
    }

    fn from_join(error: JoinError) -> Self {
        Self::without_partial(TranslationError::UnknownError(format!("后台任务失败: {}", error)))
    }
}

/// 服务统计
#[derive(Debug, Default)]
pub struct ServiceStats {
    pub runs_started: AtomicUsize,
    pub runs_failed: AtomicUsize,
    pub strings_extracted: AtomicUsize,
    pub strings_translated: AtomicUsize,
    pub batches_completed: AtomicUsize,
    pub fallbacks: AtomicUsize,
    pub partial_artifacts: AtomicUsize,
    /// 微秒
    pub processing_time: AtomicU64,
}

impl ServiceStats {
    fn record_orchestration(&self, report: &OrchestrationReport) {
        self.batches_completed
            .fetch_add(report.completed_batches, Ordering::Relaxed);
        self.strings_translated
            .fetch_add(report.translated_strings, Ordering::Relaxed);
        self.fallbacks
            .fetch_add(report.fallback_count, Ordering::Relaxed);
    }

    fn add_processing_time(&self, duration: Duration) {
        self.processing_time
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ServiceStatsSnapshot {
        ServiceStatsSnapshot {
            runs_started: self.runs_started.load(Ordering::Relaxed),
            runs_failed: self.runs_failed.load(Ordering::Relaxed),
            strings_extracted: self.strings_extracted.load(Ordering::Relaxed),
            strings_translated: self.strings_translated.load(Ordering::Relaxed),
            batches_completed: self.batches_completed.load(Ordering::Relaxed),
            fallbacks: self.fallbacks.load(Ordering::Relaxed),
            partial_artifacts: self.partial_artifacts.load(Ordering::Relaxed),
            processing_time: Duration::from_micros(self.processing_time.load(Ordering::Relaxed)),
        }
    }
}

/// 统计数据快照
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceStatsSnapshot {
    pub runs_started: usize,
    pub runs_failed: usize,
    pub strings_extracted: usize,
    pub strings_translated: usize,
    pub batches_completed: usize,
    pub fallbacks: usize,
    pub partial_artifacts: usize,
    pub processing_time: Duration,
}

/// 工作簿翻译服务
pub struct XlsxTranslationService<T> {
    translator: T,
    config: TranslationConfig,
    limits: PackageLimits,
    stats: ServiceStats,
}

impl XlsxTranslationService<RetryingTranslator<HttpTranslator>> {
    /// 使用 HTTP 翻译客户端和配置中的重试策略创建服务
    pub fn from_config(config: TranslationConfig) -> TranslationResult<Self> {
        config.validate()?;
        let translator = RetryingTranslator::new(
            HttpTranslator::new(&config)?,
            RetryPolicy::from_config(&config),
        );
        Ok(Self::new(translator, config))
    }
}

impl<T: Translator> XlsxTranslationService<T> {
    pub fn new(translator: T, config: TranslationConfig) -> Self {
        Self {
            translator,
            config,
            limits: PackageLimits::default(),
            stats: ServiceStats::default(),
        }
    }

    pub fn with_limits(mut self, limits: PackageLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn config(&self) -> &TranslationConfig {
        &self.config
    }

    pub fn translator(&self) -> &T {
        &self.translator
    }

    pub fn get_stats(&self) -> &ServiceStats {
        &self.stats
    }

    /// 翻译一个工作簿
    pub async fn translate_package(
        &self,
        input: &[u8],
        progress: &ProgressReporter,
    ) -> Result<TranslationOutput, PipelineFailure> {
        let start = Instant::now();
        self.stats.runs_started.fetch_add(1, Ordering::Relaxed);

        let result = self.run(input, progress).await;
        self.stats.add_processing_time(start.elapsed());

        match &result {
            Ok(output) => {
                progress.complete(
                    output.orchestration.total_batches,
                    format!("翻译完成，共 {} 条文本", output.unique_strings),
                );
                tracing::info!("工作簿翻译完成，耗时: {:?}", start.elapsed());
            }
            Err(failure) => {
                self.stats.runs_failed.fetch_add(1, Ordering::Relaxed);
                if failure.partial.is_some() {
                    self.stats.partial_artifacts.fetch_add(1, Ordering::Relaxed);
                }
                helpers::log_error(&failure.error);
                progress.error(failure.error.user_message(), failure.error.to_string());
            }
        }
        result
    }

    async fn run(
        &self,
        input: &[u8],
        progress: &ProgressReporter,
    ) -> Result<TranslationOutput, PipelineFailure> {
        progress.parsing("正在解析工作簿");
        let package =
            ArchivePackage::load_limited(input, self.limits).map_err(PipelineFailure::without_partial)?;

        // 扫描和回填都是 CPU 密集的 rayon 任务，放到阻塞线程池执行
        let (package, extracted) = spawn_blocking(move || {
            let extracted = TextExtractor::new().extract(&package);
            (package, extracted)
        })
        .await
        .map_err(PipelineFailure::from_join)?;
        self.stats
            .strings_extracted
            .fetch_add(extracted.strings.len(), Ordering::Relaxed);

        let mut map = TranslationMap::new();
        let orchestrator = BatchOrchestrator::new(
            &self.translator,
            BatchConfig::from(&self.config),
            progress.clone(),
        );
        let orchestration = match orchestrator.run(&extracted.strings, &mut map).await {
            Ok(report) => report,
            Err(error) => return Err(Self::recover(error, package, &map)),
        };
        self.stats.record_orchestration(&orchestration);

        progress.rebuilding("正在重建工作簿");
        let (package, map, rebuilt) = spawn_blocking(move || {
            let mut package = package;
            let rehydration = Rehydrator::new(&map).rehydrate(&mut package);
            let rebuilt = package.serialize().map(|bytes| (bytes, rehydration));
            (package, map, rebuilt)
        })
        .await
        .map_err(PipelineFailure::from_join)?;
        let (bytes, rehydration) = match rebuilt {
            Ok(rebuilt) => rebuilt,
            Err(error) => return Err(Self::recover(error, package, &map)),
        };

        Ok(TranslationOutput {
            bytes,
            occurrences: extracted.occurrences,
            unique_strings: extracted.strings.len(),
            orchestration,
            rehydration,
        })
    }

    fn recover(error: TranslationError, package: ArchivePackage, map: &TranslationMap) -> PipelineFailure {
        let partial = if error.allows_recovery() {
            build_partial_artifact(package, map)
        } else {
            None
        };
        PipelineFailure { error, partial }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translation::client::TranslatedBatch;
    use crate::translation::core::progress::ProgressStatus;

    const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";

    struct UpperTranslator;

    impl Translator for UpperTranslator {
        async fn translate(&self, texts: &[String]) -> TranslationResult<TranslatedBatch> {
            Ok(TranslatedBatch::from_texts(texts.iter().map(|t| format!("[{t}]"))))
        }
    }

    struct QuotaTranslator;

    impl Translator for QuotaTranslator {
        async fn translate(&self, _texts: &[String]) -> TranslationResult<TranslatedBatch> {
            Err(TranslationError::QuotaExhausted("HTTP 456".into()))
        }
    }

    fn workbook() -> Vec<u8> {
        let mut package = ArchivePackage::default();
        package.set_part(
            "xl/sharedStrings.xml",
            format!(r#"<sst xmlns="{MAIN_NS}"><si><t>売上</t></si></sst>"#),
        );
        package.serialize().unwrap()
    }

    fn config() -> TranslationConfig {
        TranslationConfig {
            batch_delay_secs: 0,
            ..TranslationConfig::default()
        }
    }

    #[tokio::test]
    async fn test_translate_package_reports_progress() {
        let service = XlsxTranslationService::new(UpperTranslator, config());
        let (progress, mut receiver) = ProgressReporter::channel();

        let output = service.translate_package(&workbook(), &progress).await.unwrap();
        assert_eq!(output.unique_strings, 1);
        assert_eq!(output.rehydration.replacements, 1);

        let mut statuses = Vec::new();
        while let Ok(state) = receiver.try_recv() {
            statuses.push(state.status);
        }
        assert_eq!(
            statuses,
            vec![
                ProgressStatus::Parsing,
                ProgressStatus::Translating,
                ProgressStatus::Rebuilding,
                ProgressStatus::Complete,
            ]
        );

        let stats = service.get_stats().snapshot();
        assert_eq!(stats.runs_started, 1);
        assert_eq!(stats.strings_translated, 1);
    }

    #[tokio::test]
    async fn test_invalid_archive_has_no_partial() {
        let service = XlsxTranslationService::new(UpperTranslator, config());
        let failure = service
            .translate_package(b"not a zip", &ProgressReporter::disabled())
            .await
            .unwrap_err();

        assert!(matches!(failure.error, TranslationError::ArchiveLoadError(_)));
        assert!(failure.partial.is_none());
    }

    #[tokio::test]
    async fn test_quota_before_any_batch_has_no_partial() {
        let service = XlsxTranslationService::new(QuotaTranslator, config());
        let (progress, mut receiver) = ProgressReporter::channel();

        let failure = service.translate_package(&workbook(), &progress).await.unwrap_err();
        assert!(failure.error.is_quota_exhausted());
        assert!(failure.partial.is_none());

        let mut last = None;
        while let Ok(state) = receiver.try_recv() {
            last = Some(state);
        }
        let last = last.unwrap();
        assert_eq!(last.status, ProgressStatus::Error);
        assert!(last.error.is_some());
        assert_eq!(service.get_stats().snapshot().runs_failed, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_translate_package_on_multi_thread_runtime() {
        let service = XlsxTranslationService::new(UpperTranslator, config());

        let output = service
            .translate_package(&workbook(), &ProgressReporter::disabled())
            .await
            .unwrap();
        let reloaded = ArchivePackage::load(&output.bytes).unwrap();
        assert!(reloaded.part("xl/sharedStrings.xml").unwrap().contains("[売上]"));
    }

    #[tokio::test]
    async fn test_package_limits_reject_before_translation() {
        let service = XlsxTranslationService::new(QuotaTranslator, config()).with_limits(PackageLimits {
            max_part_bytes: 8,
            max_total_bytes: 1 << 20,
        });

        let failure = service
            .translate_package(&workbook(), &ProgressReporter::disabled())
            .await
            .unwrap_err();
        assert!(matches!(failure.error, TranslationError::ArchiveLoadError(_)));
        assert!(failure.partial.is_none());
    }
}
