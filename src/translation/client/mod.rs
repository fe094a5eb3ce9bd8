//! 翻译服务客户端
//!
//! [`Translator`] 是批量翻译的唯一接口：按顺序输入一组字符串，按相同顺序返回译文。
//! [`RetryingTranslator`] 在任意实现外层套上重试策略。

pub mod http;

use std::future::Future;

use crate::translation::core::retry::RetryPolicy;
use crate::translation::error::TranslationResult;

pub use http::{classify_status, parse_deepl_response, HttpTranslator};

/// 一个批次的翻译结果
///
/// `texts[i]` 对应输入的第 `i` 条；`None` 表示服务没有给出可用译文，原文保持不变。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslatedBatch {
    pub texts: Vec<Option<String>>,
}

impl TranslatedBatch {
    pub fn new(texts: Vec<Option<String>>) -> Self {
        Self { texts }
    }

    /// 全部为有效译文
    pub fn from_texts<I>(texts: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            texts: texts.into_iter().map(|t| Some(t.into())).collect(),
        }
    }

    /// 整批回退为原文
    pub fn fallback(len: usize) -> Self {
        Self {
            texts: vec![None; len],
        }
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    /// 回退条数
    pub fn fallback_count(&self) -> usize {
        self.texts.iter().filter(|t| t.is_none()).count()
    }
}

/// 批量翻译接口
///
/// 实现方需要把配额耗尽报告为 [`TranslationError::QuotaExhausted`]，
/// 把限流、过载和超时报告为 [`TranslationError::TransientServiceError`]。
/// 无法解析的响应不应作为错误返回，而是回退为原文。
///
/// [`TranslationError::QuotaExhausted`]: crate::translation::error::TranslationError::QuotaExhausted
/// [`TranslationError::TransientServiceError`]: crate::translation::error::TranslationError::TransientServiceError
pub trait Translator: Send + Sync {
    fn translate(
        &self,
        texts: &[String],
    ) -> impl Future<Output = TranslationResult<TranslatedBatch>> + Send;
}

/// 带重试的翻译器
pub struct RetryingTranslator<T> {
    inner: T,
    policy: RetryPolicy,
}

impl<T: Translator> RetryingTranslator<T> {
    pub fn new(inner: T, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

impl<T: Translator> Translator for RetryingTranslator<T> {
    async fn translate(&self, texts: &[String]) -> TranslationResult<TranslatedBatch> {
        let inner = &self.inner;
        self.policy.run(move |_| inner.translate(texts)).await
    }
}
