//! 错误处理集成测试
//!
//! 测试系统在各种异常输入和服务故障下的错误处理和恢复能力

use std::sync::atomic::{AtomicUsize, Ordering};

use xlsx_translator::parsers::{ArchivePackage, PackageLimits};
use xlsx_translator::translation::error::{ErrorCategory, TranslationError, TranslationResult};
use xlsx_translator::translation::{
    ProgressReporter, RetryPolicy, RetryingTranslator, TextExtractor, TranslatedBatch,
    TranslationConfig, Translator, XlsxTranslationService,
};

#[allow(dead_code)]
mod common {
    include!("common/mod.rs");
}

use common::{
    fast_config, read_part, DictionaryTranslator, QuotaAfterTranslator,
    TransientThenOkTranslator, WorkbookBuilder, MAIN_NS,
};

/// 非 ZIP 输入直接失败，不生成部分结果
#[tokio::test]
async fn test_invalid_archive_error_handling() {
    let invalid_inputs: [&[u8]; 4] = [
        b"",
        b"plain text",
        b"PK\x03\x04 truncated",
        &[0u8; 64],
    ];

    for (i, input) in invalid_inputs.iter().enumerate() {
        let service = XlsxTranslationService::new(DictionaryTranslator::new(&[]), fast_config());
        let failure = service
            .translate_package(input, &ProgressReporter::disabled())
            .await
            .expect_err("invalid archive must fail");

        assert!(
            matches!(failure.error, TranslationError::ArchiveLoadError(_)),
            "case {} should be an archive error, got {:?}",
            i,
            failure.error
        );
        assert!(failure.partial.is_none(), "case {} must not produce a partial artifact", i);
        assert_eq!(service.translator().calls(), 0);
        println!("✅ Invalid archive case {}: {}", i, failure.error);
    }
}

/// 损坏的 XML 部件不会中断提取
#[test]
fn test_malformed_markup_is_tolerated() {
    let input = WorkbookBuilder::minimal()
        .part(
            "xl/sharedStrings.xml",
            &format!(r#"<sst xmlns="{MAIN_NS}"><si><t>有効</t></si><si><t>壊れ"#),
        )
        .part(
            "xl/worksheets/sheet1.xml",
            &format!(r#"<worksheet xmlns="{MAIN_NS}"><t>正常</t></wrong></worksheet>"#),
        )
        .part("xl/worksheets/sheet2.xml", "\u{FEFF}not xml at all <<<")
        .build();
    let package = ArchivePackage::load(&input).unwrap();

    let extracted = TextExtractor::new().extract(&package);
    assert!(extracted.strings.contains("有効"));
    assert!(extracted.strings.contains("正常"));
    assert!(!extracted.strings.iter().any(|s| s.contains("壊れ")));
    println!("✅ Malformed markup collected {} strings safely", extracted.strings.len());
}

/// 超过解压限制的文档包被拒绝
#[test]
fn test_package_limits_are_enforced() {
    let big = "x".repeat(4096);
    let input = WorkbookBuilder::minimal().part("xl/big.xml", &big).build();

    let limits = PackageLimits {
        max_part_bytes: 1024,
        max_total_bytes: 1 << 20,
    };
    let err = ArchivePackage::load_limited(&input, limits).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Archive);

    let limits = PackageLimits {
        max_part_bytes: 1 << 20,
        max_total_bytes: 2048,
    };
    assert!(ArchivePackage::load_limited(&input, limits).is_err());
}

/// 重试耗尽后终止，并保留此前批次的译文
#[tokio::test(start_paused = true)]
async fn test_retry_exhaustion_is_terminal() {
    let texts: Vec<String> = (0..3).map(|i| format!("<t>文{i}</t>")).collect();
    let items: Vec<&str> = texts.iter().map(String::as_str).collect();
    let input = WorkbookBuilder::minimal().shared_strings(&items).build();

    let config = TranslationConfig {
        batch_size: 1,
        max_retry_attempts: 2,
        retry_base_delay_ms: 10,
        retry_max_delay_ms: 100,
        ..fast_config()
    };
    // 第一批成功前需要重试一次，之后的批次持续失败
    let translator = RetryingTranslator::new(
        FailAfter::new(TransientThenOkTranslator::new(1), 2),
        RetryPolicy::from_config(&config).without_jitter(),
    );
    let service = XlsxTranslationService::new(translator, config);

    let failure = service
        .translate_package(&input, &ProgressReporter::disabled())
        .await
        .expect_err("exhausted retries must fail the run");

    assert!(matches!(
        failure.error,
        TranslationError::RetryExhausted { attempts: 2, .. }
    ));
    let partial = failure.partial.expect("first batch should be recoverable");
    let shared = read_part(&partial, "xl/sharedStrings.xml");
    assert!(shared.contains("EN:文0"));
    assert!(shared.contains("<si><t>文1</t></si>"));
}

/// 配额错误不重试
#[tokio::test(start_paused = true)]
async fn test_quota_is_never_retried() {
    let config = fast_config();
    let translator = RetryingTranslator::new(
        QuotaAfterTranslator::new(0),
        RetryPolicy::from_config(&config).without_jitter(),
    );
    let service = XlsxTranslationService::new(translator, config);

    let input = WorkbookBuilder::minimal().shared_strings(&["<t>配額</t>"]).build();
    let failure = service
        .translate_package(&input, &ProgressReporter::disabled())
        .await
        .unwrap_err();

    assert!(failure.error.is_quota_exhausted());
    assert!(failure.partial.is_none(), "nothing was translated yet");
    assert_eq!(service.translator().inner().calls.load(Ordering::SeqCst), 1);
    assert!(failure.error.user_message().contains("配额"));
}

/// 错误分类和用户提示
#[test]
fn test_error_classification() {
    let cases = vec![
        (TranslationError::QuotaExhausted("456".into()), false, true),
        (TranslationError::TransientServiceError("503".into()), true, true),
        (TranslationError::ArchiveLoadError("bad zip".into()), false, false),
        (TranslationError::ConfigError("batch_size".into()), false, false),
        (TranslationError::UnknownError("403".into()), false, true),
    ];

    for (error, retryable, recoverable) in cases {
        assert_eq!(error.is_retryable(), retryable, "{error}");
        assert_eq!(error.allows_recovery(), recoverable, "{error}");
        assert!(!error.user_message().is_empty());
    }
}

/// 前 `ok_calls` 次调用交给内部翻译器，之后持续返回临时错误
struct FailAfter<T> {
    inner: T,
    ok_calls: usize,
    calls: AtomicUsize,
}

impl<T> FailAfter<T> {
    fn new(inner: T, ok_calls: usize) -> Self {
        Self {
            inner,
            ok_calls,
            calls: AtomicUsize::new(0),
        }
    }
}

impl<T: Translator> Translator for FailAfter<T> {
    async fn translate(&self, texts: &[String]) -> TranslationResult<TranslatedBatch> {
        if self.calls.fetch_add(1, Ordering::SeqCst) >= self.ok_calls {
            return Err(TranslationError::TransientServiceError("HTTP 503".into()));
        }
        self.inner.translate(texts).await
    }
}
