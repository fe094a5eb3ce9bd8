//! 翻译模块统一错误处理
//!
//! 提供结构化错误类型和错误处理机制。
//!
//! 错误分为三类处理方式：
//! - 文档包加载失败：直接终止，不进入恢复流程
//! - 配额耗尽、重试耗尽、未知错误：终止翻译并尝试输出部分结果
//! - 临时性服务错误：由重试策略按指数退避重试

use std::fmt;

use thiserror::Error;

/// 翻译错误类型
#[derive(Error, Debug, Clone)]
pub enum TranslationError {
    /// 输入不是合法的 ZIP 文档包
    #[error("文档包加载失败: {0}")]
    ArchiveLoadError(String),

    /// 文档包序列化失败
    #[error("文档包写入失败: {0}")]
    ArchiveWriteError(String),

    /// 翻译服务配额已耗尽
    #[error("翻译配额已耗尽: {0}")]
    QuotaExhausted(String),

    /// 临时性服务错误（限流、过载、超时等）
    #[error("翻译服务暂时不可用: {0}")]
    TransientServiceError(String),

    /// 重试次数耗尽
    #[error("翻译失败，已重试 {attempts} 次: {message}")]
    RetryExhausted { attempts: usize, message: String },

    /// 翻译服务返回了无法解析的响应
    #[error("翻译响应格式错误: {0}")]
    MalformedResponse(String),

    /// 配置错误
    #[error("配置错误: {0}")]
    ConfigError(String),

    /// 其他未分类错误
    #[error("未知错误: {0}")]
    UnknownError(String),
}

impl TranslationError {
    /// 检查错误是否可重试
    pub fn is_retryable(&self) -> bool {
        matches!(self, TranslationError::TransientServiceError(_))
    }

    /// 是否为配额耗尽
    pub fn is_quota_exhausted(&self) -> bool {
        matches!(self, TranslationError::QuotaExhausted(_))
    }

    /// 失败后是否应该尝试输出部分翻译结果
    pub fn allows_recovery(&self) -> bool {
        !matches!(
            self,
            TranslationError::ArchiveLoadError(_) | TranslationError::ConfigError(_)
        )
    }

    /// 获取错误的严重程度
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TranslationError::ArchiveLoadError(_) => ErrorSeverity::Critical,
            TranslationError::ArchiveWriteError(_) => ErrorSeverity::Critical,
            TranslationError::QuotaExhausted(_) => ErrorSeverity::Error,
            TranslationError::TransientServiceError(_) => ErrorSeverity::Warning,
            TranslationError::RetryExhausted { .. } => ErrorSeverity::Error,
            TranslationError::MalformedResponse(_) => ErrorSeverity::Warning,
            TranslationError::ConfigError(_) => ErrorSeverity::Critical,
            TranslationError::UnknownError(_) => ErrorSeverity::Error,
        }
    }

    /// 获取错误类别
    pub fn category(&self) -> ErrorCategory {
        match self {
            TranslationError::ArchiveLoadError(_) => ErrorCategory::Archive,
            TranslationError::ArchiveWriteError(_) => ErrorCategory::Archive,
            TranslationError::QuotaExhausted(_) => ErrorCategory::Quota,
            TranslationError::TransientServiceError(_) => ErrorCategory::Service,
            TranslationError::RetryExhausted { .. } => ErrorCategory::Service,
            TranslationError::MalformedResponse(_) => ErrorCategory::Parsing,
            TranslationError::ConfigError(_) => ErrorCategory::Configuration,
            TranslationError::UnknownError(_) => ErrorCategory::Internal,
        }
    }

    /// 面向最终用户的提示信息
    pub fn user_message(&self) -> String {
        match self {
            TranslationError::QuotaExhausted(_) => {
                "翻译配额已用完，已翻译的部分已保存，请在配额恢复后重试".to_string()
            }
            TranslationError::ArchiveLoadError(_) => {
                "无法读取该文件，请确认它是有效的 .xlsx 工作簿".to_string()
            }
            TranslationError::RetryExhausted { .. } => {
                "翻译服务持续不可用，已翻译的部分已保存".to_string()
            }
            other => format!("翻译失败: {}", other),
        }
    }

    /// 创建带上下文的错误
    pub fn with_context<T: fmt::Display>(mut self, context: T) -> Self {
        let new_msg = |msg: &str| format!("{} (上下文: {})", msg, context);

        match &mut self {
            TranslationError::ArchiveLoadError(msg)
            | TranslationError::ArchiveWriteError(msg)
            | TranslationError::QuotaExhausted(msg)
            | TranslationError::TransientServiceError(msg)
            | TranslationError::MalformedResponse(msg)
            | TranslationError::ConfigError(msg)
            | TranslationError::UnknownError(msg) => *msg = new_msg(msg.as_str()),
            TranslationError::RetryExhausted { message, .. } => {
                *message = new_msg(message.as_str())
            }
        }

        self
    }
}

/// 错误严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Archive,
    Quota,
    Service,
    Parsing,
    Configuration,
    Internal,
}

/// 标准错误转换
impl From<std::io::Error> for TranslationError {
    fn from(error: std::io::Error) -> Self {
        TranslationError::ArchiveWriteError(format!("IO错误: {}", error))
    }
}

impl From<zip::result::ZipError> for TranslationError {
    fn from(error: zip::result::ZipError) -> Self {
        TranslationError::ArchiveLoadError(format!("ZIP错误: {}", error))
    }
}

impl From<serde_json::Error> for TranslationError {
    fn from(error: serde_json::Error) -> Self {
        TranslationError::MalformedResponse(format!("JSON解析错误: {}", error))
    }
}

impl From<toml::de::Error> for TranslationError {
    fn from(error: toml::de::Error) -> Self {
        TranslationError::ConfigError(format!("TOML解析错误: {}", error))
    }
}

impl From<reqwest::Error> for TranslationError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() || error.is_connect() {
            TranslationError::TransientServiceError(format!("网络错误: {}", error))
        } else if error.is_decode() {
            TranslationError::MalformedResponse(format!("响应解码错误: {}", error))
        } else {
            TranslationError::UnknownError(format!("请求失败: {}", error))
        }
    }
}

impl From<tokio::time::error::Elapsed> for TranslationError {
    fn from(error: tokio::time::error::Elapsed) -> Self {
        TranslationError::TransientServiceError(format!("异步操作超时: {}", error))
    }
}

/// 错误结果类型别名
pub type TranslationResult<T> = Result<T, TranslationError>;

/// 错误处理助手函数
pub mod helpers {
    use super::*;

    /// 按严重程度记录错误
    pub fn log_error(error: &TranslationError) {
        match error.severity() {
            ErrorSeverity::Info => tracing::info!("翻译信息: {}", error),
            ErrorSeverity::Warning => tracing::warn!("翻译警告: {}", error),
            ErrorSeverity::Error => tracing::error!("翻译错误: {}", error),
            ErrorSeverity::Critical => tracing::error!("翻译严重错误: {}", error),
        }
    }
}
